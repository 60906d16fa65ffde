use jobsweep_core::models::{FetchRequest, Page, PageCursor, RawListing};
use jobsweep_core::source::{PaginationPolicy, SourceConfig, SourceLimits};
use jobsweep_core::traits::{Extracted, SourceAdapter};
use serde_json::Value;
use url::Url;

use super::{next_cursor, resolve};

/// Schema sent with every structured request unless a source overrides it.
pub const JOB_SCHEMA_JSON: &str = r#"{
  "type": "object",
  "properties": {
    "jobs": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "title": { "type": "string" },
          "company": { "type": "string" },
          "location": { "type": "string" },
          "job_type": { "type": "string" },
          "apply_url": { "type": "string" }
        }
      }
    },
    "next_page_url": {
      "type": "string",
      "description": "URL of the next page button or link"
    }
  }
}"#;

/// The built-in job listing schema as a JSON value.
pub fn job_schema() -> Value {
    serde_json::from_str(JOB_SCHEMA_JSON).unwrap_or(Value::Null)
}

/// Adapter for sources read through the service's schema-driven extract.
///
/// The extract is expected to look like `{"jobs": [...], "next_page_url": ...}`
/// (or a one-element array of that). Anything else is read leniently: fields
/// that aren't strings are treated as absent.
pub struct StructuredAdapter {
    name: String,
    pagination: PaginationPolicy,
    limits: SourceLimits,
    entries: Vec<PageCursor>,
    schema: Value,
}

impl StructuredAdapter {
    pub fn new(config: &SourceConfig, schema: Option<Value>) -> Self {
        Self {
            name: config.name.clone(),
            pagination: config.pagination,
            limits: config.limits,
            entries: config.start_cursors(),
            schema: schema.unwrap_or_else(job_schema),
        }
    }

    fn listing_from(&self, base: Option<&Url>, job: &Value) -> RawListing {
        let field = |key: &str| job.get(key).and_then(Value::as_str).map(String::from);
        RawListing {
            title: field("title"),
            company: field("company"),
            location: field("location"),
            job_type: field("job_type"),
            apply_url: field("apply_url").map(|href| resolve(base, &href).unwrap_or(href)),
            source: self.name.clone(),
        }
    }
}

impl SourceAdapter for StructuredAdapter {
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

    fn request(&self, cursor: &PageCursor) -> FetchRequest {
        FetchRequest::structured(cursor.url(), self.schema.clone())
    }

    fn extract(&self, cursor: &PageCursor, page: &Page) -> Extracted {
        let Page::Structured { url, data } = page else {
            tracing::debug!(source = %self.name, "Structured adapter got a markup page");
            return Extracted::default();
        };

        // Some extracts come back wrapped in a one-element array.
        let data = match data {
            Value::Array(items) => items.first().unwrap_or(&Value::Null),
            other => other,
        };
        let base = Url::parse(url).ok();

        let listings: Vec<RawListing> = data
            .get("jobs")
            .and_then(Value::as_array)
            .map(|jobs| {
                jobs.iter()
                    .filter(|job| job.is_object())
                    .map(|job| self.listing_from(base.as_ref(), job))
                    .collect()
            })
            .unwrap_or_default();

        let current = cursor.url();
        let link = data
            .get("next_page_url")
            .and_then(Value::as_str)
            .and_then(|href| resolve(base.as_ref(), href))
            .filter(|next| *next != current);
        let next = next_cursor(self.pagination, cursor, link, !listings.is_empty());

        Extracted { listings, next }
    }
}
