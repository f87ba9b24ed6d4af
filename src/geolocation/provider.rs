//! The platform boundary: anything that can produce position fixes.
//!
//! The service is generic over this trait so tests drive it with a scripted
//! [`MockProvider`](super::MockProvider) and the CLI with the IP-based
//! [`IpApiProvider`](super::IpApiProvider).

use super::types::{FixOptions, PermissionState, ProviderFault, RawFix};
use std::future::Future;
use tokio::sync::mpsc::UnboundedReceiver;

/// Identifies one platform watch subscription, for [`LocationProvider::clear_watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

impl WatchId {
    pub fn new(id: u64) -> Self {
        WatchId(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A live platform watch: the provider pushes one item per update until the
/// watch is cleared or the provider goes away.
pub struct WatchChannel {
    pub id: WatchId,
    pub updates: UnboundedReceiver<Result<RawFix, ProviderFault>>,
}

/// A source of position fixes.
///
/// Implementations report raw, unvalidated fixes; normalization and error
/// taxonomy live in the service layer.
pub trait LocationProvider: Send + Sync {
    /// Whether the platform exposes any location capability.
    fn is_supported(&self) -> bool {
        true
    }

    /// Platform permission state, when queryable.
    fn permission_state(&self) -> PermissionState {
        PermissionState::Unknown
    }

    /// Request a one-shot fix. The returned future resolves when the platform
    /// answers; the service enforces `options.timeout` around it.
    fn current_fix(
        &self,
        options: FixOptions,
    ) -> impl Future<Output = Result<RawFix, ProviderFault>> + Send;

    /// Begin continuous observation. Updates flow on the returned channel
    /// until [`clear_watch`](Self::clear_watch) is called with the channel's id.
    fn start_watch(&self, options: FixOptions) -> WatchChannel;

    /// Release a platform subscription. Must tolerate unknown ids.
    fn clear_watch(&self, id: WatchId);
}
