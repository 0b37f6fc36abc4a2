//! Publisher trait - one outbound destination
//!
//! Every destination (chat channel, micro-blog, relay network, issue
//! tracker) implements this trait.

use async_trait::async_trait;
use contracts::{Collect, ContractError};

use crate::context::PublishContext;

/// Delivery capability of one destination.
///
/// Implementations must:
/// - report an empty `cols` as an error without touching the network
/// - be safe to call concurrently with other destinations and with other
///   calls on disjoint record sets
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Destination name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver `cols` to the destination.
    ///
    /// `args` are passed through untouched; the first one, when present,
    /// labels where the request came from.
    async fn publish(
        &self,
        ctx: &PublishContext,
        cols: &[Collect],
        args: &[String],
    ) -> Result<(), ContractError>;
}

/// Origin label carried in the first publish argument
pub fn origin(args: &[String]) -> &str {
    args.first().map(String::as_str).unwrap_or_default()
}
