//! Outbound side of the channel a turn arrived on.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::OutboundMessage;

/// Delivers replies back to the conversation the current turn belongs to.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}
