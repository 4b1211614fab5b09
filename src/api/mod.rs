pub mod client;
pub mod error;

pub use client::{ApiClient, HrGateway};
pub use error::{ApiError, ErrorPayload, RequestError};
