//! Geolocation core for the HawkeRoute marketplace client.
//!
//! Three pieces: a [`geo`] module with great-circle math, a [`geolocation`]
//! subsystem that acquires device positions from pluggable providers, and a
//! [`query`] module that ranks entities by proximity. Everything the
//! storefront renders (listings, carts, maps) lives elsewhere and calls in.

pub mod geo;
pub mod geolocation;
pub mod query;
