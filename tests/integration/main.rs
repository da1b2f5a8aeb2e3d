//! Integration tests for Job-Scout
//!
//! Crawl tests drive the orchestrator against an in-memory browser and
//! oracle. HTTP clients are tested against wiremock servers.

mod support;

mod converter_tests;
mod crawl_tests;
mod oracle_tests;
