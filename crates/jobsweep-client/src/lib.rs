pub mod adapter;
pub mod catalog;
pub mod firecrawl;
pub mod sink;

pub use adapter::{MarkupAdapter, StructuredAdapter, build_adapter, build_adapters};
pub use catalog::{default_sources, structured_sources};
pub use firecrawl::FirecrawlService;
pub use sink::{CsvSink, JsonSink, MultiSink};
