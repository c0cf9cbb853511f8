//! Middleware components for the request-protection pipeline.
//!
//! Each stage either short-circuits with a response or delegates to the next
//! one. `pipeline::apply` composes them in their contractual order.

pub mod auth;
pub mod cors;
pub mod error_boundary;
pub mod ip;
pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::RateLimiter;
