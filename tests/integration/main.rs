//! Integration tests for the crawl worker
//!
//! These tests use wiremock to create mock HTTP servers, an in-process work
//! queue and a SQLite job store, and exercise full crawl jobs end-to-end.

mod common;
mod crawl_tests;
mod worker_tests;
