//! REST client for the page backend.
//!
//! Every endpoint answers with the `{ success, data?, error? }` envelope;
//! [`Envelope`] unwraps it into typed results and [`ApiError`] covers the
//! transport, application and decoding failures.

mod client;
mod envelope;

pub use client::{ApiClient, PageQuery};
pub use envelope::{ApiError, Envelope};
