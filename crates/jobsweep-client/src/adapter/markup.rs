use jobsweep_core::error::AppError;
use jobsweep_core::models::{Page, PageCursor, RawListing};
use jobsweep_core::source::{
    CompanyHint, MarkupRules, MetadataRules, PaginationPolicy, SourceConfig, SourceLimits,
};
use jobsweep_core::traits::{Extracted, SourceAdapter};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{next_cursor, resolve};

/// Card elements searched for a company logo.
const CARD_TAGS: [&str; 3] = ["div", "article", "li"];
/// Image alt texts that name the image, not the company.
const GENERIC_ALTS: [&str; 3] = ["logo", "image", "icon"];

/// Adapter for sources whose rendered HTML is parsed with CSS selectors.
///
/// Selectors are parsed once at construction. Extraction itself never fails:
/// markup that doesn't match simply yields no listings.
pub struct MarkupAdapter {
    name: String,
    pagination: PaginationPolicy,
    limits: SourceLimits,
    entries: Vec<PageCursor>,
    rules: MarkupRules,
    listing: Selector,
    title: Option<Selector>,
    metadata: Option<(Selector, MetadataRules)>,
    next_page: Option<Selector>,
    image: Selector,
}

fn parse_selector(source: &str, selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector).map_err(|e| {
        AppError::ConfigError(format!(
            "source '{source}' has an invalid selector '{selector}': {e}"
        ))
    })
}

impl MarkupAdapter {
    pub fn new(config: &SourceConfig, rules: MarkupRules) -> Result<Self, AppError> {
        let name = config.name.as_str();
        let listing = parse_selector(name, &rules.listing_selector)?;
        let title = rules
            .title_selector
            .as_deref()
            .map(|s| parse_selector(name, s))
            .transpose()?;
        let metadata = rules
            .metadata
            .as_ref()
            .map(|m| parse_selector(name, &m.selector).map(|s| (s, m.clone())))
            .transpose()?;
        let next_page = rules
            .next_page_selector
            .as_deref()
            .map(|s| parse_selector(name, s))
            .transpose()?;
        let image = parse_selector(name, "img[alt]")?;

        Ok(Self {
            name: config.name.clone(),
            pagination: config.pagination,
            limits: config.limits,
            entries: config.start_cursors(),
            rules,
            listing,
            title,
            metadata,
            next_page,
            image,
        })
    }

    fn listing_from(&self, base: Option<&Url>, element: ElementRef<'_>) -> Option<RawListing> {
        let href = element.value().attr("href")?;
        if let Some(needle) = &self.rules.href_contains
            && !href.contains(needle.as_str())
        {
            return None;
        }

        let apply_url = resolve(base, href)?;
        if path_depth(&apply_url) < self.rules.min_path_segments {
            return None;
        }

        let raw_title = match &self.title {
            Some(selector) => text_of(element.select(selector).next()?),
            None => text_of(element),
        };
        let mut title = strip_noise(&raw_title, &self.rules.title_noise);
        let mut company = None;
        if let Some(separator) = &self.rules.title_separator
            && let Some((left, right)) = title.split_once(separator.as_str())
        {
            company = Some(right.trim().to_string()).filter(|c| !c.is_empty());
            title = left.trim().to_string();
        }
        if company.is_none() {
            company = self.company_hint(element, &apply_url);
        }

        let mut listing = RawListing {
            title: Some(title),
            company,
            location: self.rules.location.clone(),
            job_type: self.rules.job_type.clone(),
            apply_url: Some(apply_url),
            source: self.name.clone(),
        };
        self.apply_metadata(element, &mut listing);
        Some(listing)
    }

    fn company_hint(&self, element: ElementRef<'_>, apply_url: &str) -> Option<String> {
        match &self.rules.company {
            CompanyHint::None => None,
            CompanyHint::Fixed { name } => Some(name.clone()),
            CompanyHint::UrlSlug { marker } => company_from_slug(apply_url, marker),
            CompanyHint::NextSibling { tag } => element
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| sibling.value().name() == tag.as_str())
                .map(text_of)
                .filter(|text| !text.is_empty()),
            CompanyHint::ImageAlt => {
                let card = element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|a| CARD_TAGS.contains(&a.value().name()))?;
                let alt = card.select(&self.image).next()?.value().attr("alt")?.trim();
                let generic = GENERIC_ALTS.contains(&alt.to_lowercase().as_str());
                (alt.chars().count() > 2 && !generic).then(|| alt.to_string())
            }
        }
    }

    fn apply_metadata(&self, element: ElementRef<'_>, listing: &mut RawListing) {
        let Some((selector, rules)) = &self.metadata else {
            return;
        };
        for item in element.select(selector) {
            let text = text_of(item);
            let lower = text.to_lowercase();
            if rules.location_keywords.iter().any(|k| text.contains(k.as_str())) {
                listing.location = Some(text);
            } else if let Some(keyword) = rules
                .job_type_keywords
                .iter()
                .find(|k| lower.contains(&k.to_lowercase()))
            {
                listing.job_type = Some(keyword.clone());
            }
        }
    }

    fn next_link(&self, document: &Html, base: Option<&Url>) -> Option<String> {
        let selector = self.next_page.as_ref()?;
        document
            .select(selector)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve(base, href))
    }
}

impl SourceAdapter for MarkupAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn pagination(&self) -> PaginationPolicy {
        self.pagination
    }

    fn limits(&self) -> SourceLimits {
        self.limits
    }

    fn entry_points(&self) -> Vec<PageCursor> {
        self.entries.clone()
    }

    fn extract(&self, cursor: &PageCursor, page: &Page) -> Extracted {
        let Page::Markup { url, content } = page else {
            tracing::debug!(source = %self.name, "Markup adapter got a structured page");
            return Extracted::default();
        };

        let base = Url::parse(url).or_else(|_| Url::parse(&cursor.url())).ok();
        let document = Html::parse_document(content);
        let listings: Vec<RawListing> = document
            .select(&self.listing)
            .filter_map(|element| self.listing_from(base.as_ref(), element))
            .collect();

        let link = self.next_link(&document, base.as_ref());
        let next = next_cursor(self.pagination, cursor, link, !listings.is_empty());
        Extracted { listings, next }
    }
}

/// Visible text with whitespace collapsed.
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_noise(title: &str, noise: &[String]) -> String {
    let mut cleaned = title.to_string();
    for token in noise.iter().filter(|t| !t.is_empty()) {
        cleaned = cleaned.replace(token.as_str(), " ");
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn path_depth(url: &str) -> usize {
    Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().map(|s| s.filter(|seg| !seg.is_empty()).count()))
        .unwrap_or(0)
}

/// `/view/senior-dev-at-acme-corp` with marker `-at-` gives `Acme Corp`.
fn company_from_slug(url: &str, marker: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let slug = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let (_, company) = slug.rsplit_once(marker)?;
    let words: Vec<String> = company
        .split('-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
