//! Scripted provider for tests and development.

use super::provider::{LocationProvider, WatchChannel, WatchId};
use super::types::{FixOptions, PermissionState, ProviderFault, RawFix};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};

/// One scripted answer to a one-shot fix request.
#[derive(Debug, Clone)]
pub enum MockFix {
    Fix(RawFix),
    Fault(ProviderFault),
    /// Never resolves. Exercises the service's timeout wrapper.
    Hang,
}

/// Mock location provider with a scripted one-shot queue and a pushable
/// watch feed.
///
/// Each `current_fix` call consumes the front of the queue and records the
/// options it was given, so tests can assert fallback behavior. An empty
/// queue answers with a `PositionUnavailable` fault.
pub struct MockProvider {
    supported: bool,
    permission: PermissionState,
    fixes: Mutex<VecDeque<MockFix>>,
    fix_calls: Mutex<Vec<FixOptions>>,
    watch_calls: Mutex<Vec<FixOptions>>,
    feed: Mutex<Option<UnboundedSender<Result<RawFix, ProviderFault>>>>,
    cleared: Mutex<Vec<WatchId>>,
    next_id: AtomicU64,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            supported: true,
            permission: PermissionState::Unknown,
            fixes: Mutex::new(VecDeque::new()),
            fix_calls: Mutex::new(Vec::new()),
            watch_calls: Mutex::new(Vec::new()),
            feed: Mutex::new(None),
            cleared: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// A platform with no location capability at all.
    pub fn unsupported() -> Self {
        Self { supported: false, ..Self::new() }
    }

    pub fn with_permission(mut self, permission: PermissionState) -> Self {
        self.permission = permission;
        self
    }

    pub fn queue_fix(&self, fix: RawFix) {
        self.fixes.lock().unwrap().push_back(MockFix::Fix(fix));
    }

    pub fn queue_fault(&self, fault: ProviderFault) {
        self.fixes.lock().unwrap().push_back(MockFix::Fault(fault));
    }

    pub fn queue_hang(&self) {
        self.fixes.lock().unwrap().push_back(MockFix::Hang);
    }

    /// Push an update into the active watch feed. Returns false when no watch
    /// is active or the subscriber is gone — the platform keeps emitting, but
    /// nobody listens.
    pub fn emit(&self, item: Result<RawFix, ProviderFault>) -> bool {
        match self.feed.lock().unwrap().as_ref() {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }

    /// Options recorded from each one-shot request, in call order.
    pub fn fix_calls(&self) -> Vec<FixOptions> {
        self.fix_calls.lock().unwrap().clone()
    }

    /// How many watches were started.
    pub fn watch_count(&self) -> usize {
        self.watch_calls.lock().unwrap().len()
    }

    /// Watch ids that were cleared, in order.
    pub fn cleared(&self) -> Vec<WatchId> {
        self.cleared.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationProvider for MockProvider {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission_state(&self) -> PermissionState {
        self.permission
    }

    fn current_fix(
        &self,
        options: FixOptions,
    ) -> impl Future<Output = Result<RawFix, ProviderFault>> + Send {
        async move {
            self.fix_calls.lock().unwrap().push(options);
            let next = self.fixes.lock().unwrap().pop_front();
            match next {
                Some(MockFix::Fix(fix)) => Ok(fix),
                Some(MockFix::Fault(fault)) => Err(fault),
                Some(MockFix::Hang) => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                None => Err(ProviderFault::PositionUnavailable(
                    "mock fix queue is empty".into(),
                )),
            }
        }
    }

    fn start_watch(&self, options: FixOptions) -> WatchChannel {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.feed.lock().unwrap() = Some(tx);
        self.watch_calls.lock().unwrap().push(options);
        let id = WatchId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        WatchChannel { id, updates: rx }
    }

    fn clear_watch(&self, id: WatchId) {
        self.cleared.lock().unwrap().push(id);
        *self.feed.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options() -> FixOptions {
        FixOptions {
            high_accuracy: true,
            timeout: Duration::from_secs(5),
            maximum_age: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_scripted_queue_order() {
        let mock = MockProvider::new();
        mock.queue_fix(RawFix::new(1.0, 2.0, 10.0));
        mock.queue_fault(ProviderFault::Timeout("expired".into()));

        let first = mock.current_fix(options()).await.unwrap();
        assert_eq!(first.latitude, 1.0);

        let second = mock.current_fix(options()).await;
        assert!(matches!(second, Err(ProviderFault::Timeout(_))));

        // Drained queue falls back to an unavailable fault.
        let third = mock.current_fix(options()).await;
        assert!(matches!(third, Err(ProviderFault::PositionUnavailable(_))));

        assert_eq!(mock.fix_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_watch_feed() {
        let mock = MockProvider::new();
        assert!(!mock.emit(Ok(RawFix::new(0.0, 0.0, 1.0))));

        let mut channel = mock.start_watch(options());
        assert!(mock.emit(Ok(RawFix::new(4.0, 5.0, 1.0))));

        let update = channel.updates.recv().await.unwrap().unwrap();
        assert_eq!(update.latitude, 4.0);

        mock.clear_watch(channel.id);
        assert!(!mock.emit(Ok(RawFix::new(6.0, 7.0, 1.0))));
        assert_eq!(mock.cleared(), vec![channel.id]);
    }
}
