//! Geolocation subsystem for the HawkeRoute client.
//!
//! Wraps an injectable platform location provider behind a service that
//! normalizes fixes and errors, falls back from high to low accuracy on
//! timeout, honors cached-result ages, and exposes watch sessions as
//! explicitly cancellable subscriptions.

pub mod cache;
pub mod ip;
pub mod mock;
pub mod provider;
pub mod service;
pub mod types;

pub use cache::FixCache;
pub use ip::IpApiProvider;
pub use mock::{MockFix, MockProvider};
pub use provider::{LocationProvider, WatchChannel, WatchId};
pub use service::{GeolocationConfig, GeolocationService, PositionWatch};
pub use types::{
    FixOptions, GeoError, PermissionState, Position, ProviderFault, RawFix, WatchState,
};
