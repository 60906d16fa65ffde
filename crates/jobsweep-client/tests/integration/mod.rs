mod common;
mod crawl_tests;
