//! # Barkeep Backend Library
//!
//! Core library for Barkeep, a small cocktail-tracking web application with a
//! session-based authentication and request-protection layer in front of its
//! REST API.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: Web framework for HTTP server, routing and middleware
//! - **SQLx**: Asynchronous database operations with SQLite
//! - **Tokio**: Async runtime
//! - **Serde**: Serialization/deserialization for JSON APIs
//!
//! ## Core Components
//!
//! - [`auth`]: Password hashing, the session store and authorization guards
//! - [`config`]: Application configuration management
//! - [`db`]: Database schema initialization
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`metrics`]: Security and traffic counters
//! - [`middleware`]: The per-request protection stages (CORS, error boundary,
//!   rate limiting, input sanitization, session resolution)
//! - [`pipeline`]: Explicit ordering and composition of those stages
//! - [`routes`]: HTTP endpoint handlers
//! - [`state`]: Shared application state
//! - [`types`]: Data transfer objects and shared type definitions
//!
//! ## Features
//!
//! - Salted HMAC password hashing with legacy-hash migration support
//! - Opaque database-backed session tokens with lazy expiry
//! - Fixed-window, per-client-and-tier rate limiting with standard headers
//! - HTML-escaping input sanitization for query strings and JSON bodies
//! - Configurable CORS with wildcard origin patterns and preflight handling
//! - Uniform JSON error envelopes with production detail stripping

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
