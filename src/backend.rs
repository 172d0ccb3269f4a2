mod client;
mod query;

pub use client::{BackendClient, BackendError};
pub use query::{Order, Query};

#[cfg(test)]
pub(crate) fn test_client(base_url: String) -> BackendClient {
    BackendClient::new(
        base_url,
        secrecy::Secret::new("test-key".to_string()),
        std::time::Duration::from_millis(500),
    )
    .unwrap()
}
