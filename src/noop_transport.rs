use crate::error::TransportError;
use crate::transport::{PushRequest, Transport};
use async_trait::async_trait;

/// A transport that accepts every request without sending anything.
///
/// Useful for measuring the overhead of the handler itself without any
/// network I/O.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn post(&self, _url: &str, _request: &PushRequest) -> Result<(), TransportError> {
        Ok(())
    }
}
