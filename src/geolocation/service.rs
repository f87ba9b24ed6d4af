//! The geolocation service: one-shot fixes with accuracy fallback, and
//! cancellable watch sessions.
//!
//! One-shot flow:  cache (within max age) → high-accuracy fix → on timeout
//! only, low-accuracy fix with a longer deadline and a 60 s cached-result
//! allowance → error.
//! Watch flow:     permission gate (one confirmation fix) → platform watch →
//! normalized updates until explicitly cancelled.

use super::cache::FixCache;
use super::provider::{LocationProvider, WatchId};
use super::types::{
    FixOptions, GeoError, PermissionState, Position, ProviderFault, RawFix, WatchState,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Option presets for the three request kinds.
#[derive(Debug, Clone)]
pub struct GeolocationConfig {
    /// First attempt of a one-shot request: precise, impatient, fresh only.
    pub high_accuracy: FixOptions,
    /// Fallback after a timed-out first attempt: coarse, patient, and happy
    /// with a fix up to a minute old.
    pub low_accuracy: FixOptions,
    /// Per-update options for watch sessions; the short cached-result age
    /// keeps updates fresh.
    pub watch: FixOptions,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: FixOptions {
                high_accuracy: true,
                timeout: Duration::from_secs(5),
                maximum_age: Duration::ZERO,
            },
            low_accuracy: FixOptions {
                high_accuracy: false,
                timeout: Duration::from_secs(10),
                maximum_age: Duration::from_secs(60),
            },
            watch: FixOptions {
                high_accuracy: true,
                timeout: Duration::from_secs(10),
                maximum_age: Duration::from_secs(1),
            },
        }
    }
}

struct ServiceInner<P> {
    provider: P,
    config: GeolocationConfig,
    cache: Mutex<FixCache>,
}

impl<P: LocationProvider> ServiceInner<P> {
    /// One fix with the given options: cache first, then the provider under
    /// the wrapper deadline. A stalled platform still yields `Timeout`.
    async fn fix_with(&self, options: FixOptions) -> Result<Position, GeoError> {
        if let Some(cached) = self.cache.lock().unwrap().fresh(options.maximum_age) {
            return Ok(cached);
        }

        let attempt = self.provider.current_fix(options);
        let raw = match tokio::time::timeout(options.timeout, attempt).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(fault)) => return Err(fault.into()),
            Err(_) => return Err(GeoError::Timeout),
        };

        let position = Position::from_raw(raw).map_err(|e| GeoError::Unknown(e.to_string()))?;
        self.cache.lock().unwrap().store(position);
        Ok(position)
    }
}

/// Acquires positions from a [`LocationProvider`], normalizing results and
/// errors into the crate's taxonomy.
pub struct GeolocationService<P: LocationProvider> {
    inner: Arc<ServiceInner<P>>,
}

impl<P: LocationProvider> GeolocationService<P> {
    pub fn new(provider: P) -> Self {
        Self::with_parts(provider, GeolocationConfig::default(), FixCache::in_memory())
    }

    /// Create a service backed by a specific cache (persistent, or a test one).
    pub fn with_cache(provider: P, cache: FixCache) -> Self {
        Self::with_parts(provider, GeolocationConfig::default(), cache)
    }

    pub fn with_parts(provider: P, config: GeolocationConfig, cache: FixCache) -> Self {
        Self {
            inner: Arc::new(ServiceInner { provider, config, cache: Mutex::new(cache) }),
        }
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// One-shot position fix.
    ///
    /// Tries a high-accuracy fix first; if that attempt times out (and only
    /// then), retries once in low-accuracy mode with a longer deadline.
    pub async fn current_position(&self) -> Result<Position, GeoError> {
        if !self.inner.provider.is_supported() {
            return Err(GeoError::NotSupported);
        }

        match self.inner.fix_with(self.inner.config.high_accuracy).await {
            Err(GeoError::Timeout) => self.inner.fix_with(self.inner.config.low_accuracy).await,
            other => other,
        }
    }

    /// Begin a watch session. Returns the handle immediately; the permission
    /// gate runs on the first [`PositionWatch::next`] call.
    pub fn watch_position(&self) -> PositionWatch<P> {
        PositionWatch {
            inner: Arc::clone(&self.inner),
            state: WatchState::Idle,
            watch_id: None,
            updates: None,
        }
    }

    /// The most recent successful fix, if it is recent enough to still mean
    /// anything.
    pub fn last_known(&self) -> Option<Position> {
        self.inner.cache.lock().unwrap().last_known()
    }
}

/// A cancellable position subscription.
///
/// Each platform update is normalized into a `Position`; faults are delivered
/// as errors without terminating the subscription. Only cancellation (or a
/// failed permission gate) stops the session — after that, [`next`] returns
/// `None` forever.
///
/// [`next`]: PositionWatch::next
pub struct PositionWatch<P: LocationProvider> {
    inner: Arc<ServiceInner<P>>,
    state: WatchState,
    watch_id: Option<WatchId>,
    updates: Option<UnboundedReceiver<Result<RawFix, ProviderFault>>>,
}

impl<P: LocationProvider> PositionWatch<P> {
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// The next update, or `None` once the session is stopped.
    pub async fn next(&mut self) -> Option<Result<Position, GeoError>> {
        if self.state == WatchState::Idle {
            let gate_error = self.establish().await;
            if self.state == WatchState::Stopped {
                // Terminal gate failure: one delivery, then silence.
                return gate_error.map(Err);
            }
            let channel = self.inner.provider.start_watch(self.inner.config.watch);
            self.watch_id = Some(channel.id);
            self.updates = Some(channel.updates);
            self.state = WatchState::Active;
            if let Some(err) = gate_error {
                return Some(Err(err));
            }
        }

        if self.state != WatchState::Active {
            return None;
        }

        match self.updates.as_mut()?.recv().await {
            Some(Ok(raw)) => {
                Some(Position::from_raw(raw).map_err(|e| GeoError::Unknown(e.to_string())))
            }
            Some(Err(fault)) => Some(Err(fault.into())),
            // The provider went away. Not a cancellation: the session stays
            // Active and simply has nothing more to deliver.
            None => None,
        }
    }

    /// Run the permission gate. Transitions to `Stopped` on a terminal
    /// failure; otherwise the returned error (if any) is informational and the
    /// watch still starts.
    async fn establish(&mut self) -> Option<GeoError> {
        self.state = WatchState::PermissionPending;

        if !self.inner.provider.is_supported() {
            self.state = WatchState::Stopped;
            return Some(GeoError::NotSupported);
        }
        if self.inner.provider.permission_state() == PermissionState::Denied {
            self.state = WatchState::Stopped;
            return Some(GeoError::PermissionDenied);
        }

        match self.inner.fix_with(self.inner.config.watch).await {
            Ok(_) => None,
            Err(GeoError::PermissionDenied) => {
                self.state = WatchState::Stopped;
                Some(GeoError::PermissionDenied)
            }
            // Not a permission verdict; the platform watch may still succeed.
            Err(err) => Some(err),
        }
    }

    /// Stop the session. Synchronous, idempotent, unconditional: releases the
    /// platform subscription and drops anything still queued.
    pub fn cancel(&mut self) {
        if self.state == WatchState::Stopped {
            return;
        }
        if let Some(id) = self.watch_id.take() {
            self.inner.provider.clear_watch(id);
        }
        if let Some(mut rx) = self.updates.take() {
            rx.close();
        }
        self.state = WatchState::Stopped;
    }
}

impl<P: LocationProvider> Drop for PositionWatch<P> {
    fn drop(&mut self) {
        self.cancel();
    }
}
