//! TICKERTAPE — scheduled market-data scraper and posting bot
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod scrape;
pub mod data;
pub mod filter;
pub mod tweet;
pub mod engine;
pub mod storage;
