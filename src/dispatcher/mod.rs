//! Request Dispatcher Module
//!
//! Decodes an operator against a named cache, applies it under a single
//! process-wide critical section, and produces a response.
//!
//! ## Submodules
//! - **`protocol`**: wire DTOs, operator names and endpoint constants.
//! - **`service`**: `CacheService`, the context object owning the registry and its lock.
//! - **`handlers`**: HTTP request handlers for the Axum web server.

pub mod handlers;
pub mod protocol;
pub mod service;

#[cfg(test)]
mod tests;
