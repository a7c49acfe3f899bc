//! Response sinks
//!
//! Where a worker delivers the response for a request it has processed.

use crossbeam::channel::Sender;

use crate::error::{NavError, Result};
use super::Response;

/// Destination for responses to one originating client
///
/// Implementations must deliver each response whole; concurrent callers may
/// not interleave partial messages.
pub trait ResponseSink: Send + Sync {
    fn send_response(&self, response: &Response) -> Result<()>;
}

/// In-process sink: responses are pushed onto a channel
impl ResponseSink for Sender<Response> {
    fn send_response(&self, response: &Response) -> Result<()> {
        self.send(response.clone())
            .map_err(|_| NavError::Network("response channel disconnected".to_string()))
    }
}
