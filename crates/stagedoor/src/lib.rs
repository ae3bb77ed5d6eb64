//! HTTP client for the booth's collaborators: the auth service that issues
//! time-boxed sessions and the upload service that accepts the one video
//! submission.
//!
//! Everything the booth sees from here is already shaped for a candidate:
//! upstream `detail` strings are normalized (the numeric status prefix some
//! responses carry is stripped) and failures are classified into the small
//! [`ApiError`] taxonomy.

mod client;
mod error;
mod token;

pub use client::{ApiClient, AuthResponse};
pub use error::ApiError;
pub use token::TokenStore;
