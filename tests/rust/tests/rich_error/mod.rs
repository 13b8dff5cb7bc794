//! Rich error integration tests
//!
//! Covers creation, enrichment and stack capture with a real tracer.
