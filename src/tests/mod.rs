//! Integration and unit tests for the Barkeep application.
//!
//! ## Test Modules
//!
//! - **api_tests**: End-to-end tests driving the full router and pipeline
//! - **session_tests**: Session store lifecycle tests
//! - **error_tests**: Error taxonomy and presentation tests
//! - **config_tests**: Configuration loading and validation tests

pub mod config_tests;
pub mod error_tests;
