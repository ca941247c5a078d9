//! HTTP transport for fetching proofs.
//!
//! Service adapters only talk to [`HttpClient`], so the network can be swapped
//! for canned responses in tests. [`ReqwestClient`] is the production client.

pub mod client;
pub mod error;
pub mod request;

pub use client::{HttpClient, ReqwestClient};
pub use error::HttpError;
pub use request::HttpRequest;
