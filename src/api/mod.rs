//! Remote booth API access
//!
//! A thin reqwest wrapper that carries the session cookie and decodes
//! response bodies into typed envelopes.

pub mod client;
pub mod form;
pub mod protocol;
pub mod session;

pub use client::{ApiClient, ApiRequest, ApiResponse, RequestBody};
pub use form::FormData;
pub use protocol::{CurrentUser, Envelope, ResultTag, Shape};
pub use session::{login, Session};
