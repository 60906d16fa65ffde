use std::collections::HashSet;

use url::Url;

use crate::models::{
    DEFAULT_COMPANY, DEFAULT_JOB_TYPE, DEFAULT_LOCATION, JobRecord, MIN_TITLE_LEN, RawListing,
};

/// Clean a raw candidate into a canonical record.
///
/// Returns `None` when the title is missing or shorter than
/// [`MIN_TITLE_LEN`] characters, or when the apply URL is missing or not an
/// absolute http(s) URL.
pub fn normalize(raw: &RawListing) -> Option<JobRecord> {
    let title = trimmed(&raw.title)?;
    if title.chars().count() < MIN_TITLE_LEN {
        return None;
    }

    let apply_url = trimmed(&raw.apply_url)?;
    match Url::parse(apply_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => return None,
    }

    Some(JobRecord {
        title: title.to_string(),
        company: trimmed(&raw.company).unwrap_or(DEFAULT_COMPANY).to_string(),
        location: trimmed(&raw.location)
            .unwrap_or(DEFAULT_LOCATION)
            .to_string(),
        job_type: trimmed(&raw.job_type)
            .unwrap_or(DEFAULT_JOB_TYPE)
            .to_string(),
        apply_url: apply_url.to_string(),
        source: raw.source.trim().to_string(),
    })
}

fn trimmed(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Drop records whose `apply_url` was already seen. First occurrence wins and
/// order is preserved, so sources crawled earlier take priority.
pub fn deduplicate(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.apply_url.clone()))
        .collect()
}

/// Counts from reducing raw listings to the final record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub raw: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub unique: usize,
}

/// Normalize every listing, then deduplicate.
pub fn reduce(raw: &[RawListing]) -> (Vec<JobRecord>, ReduceStats) {
    let valid: Vec<JobRecord> = raw.iter().filter_map(normalize).collect();
    let rejected = raw.len() - valid.len();
    let valid_count = valid.len();
    let unique = deduplicate(valid);

    let stats = ReduceStats {
        raw: raw.len(),
        rejected,
        duplicates: valid_count - unique.len(),
        unique: unique.len(),
    };
    (unique, stats)
}
