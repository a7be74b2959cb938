pub mod backoff;
pub mod client;
pub mod decode;
pub mod errors;
pub mod types;

pub use backoff::retry_delay;
pub use client::{Fetcher, FetcherConfig};
pub use errors::FetchError;
pub use types::RawPage;
