//! World Diplomatic News - a feed aggregator for international organizations
//!
//! Fetches RSS/Atom feeds from a configured set of sources, normalizes
//! their entries into a fixed item shape, and serves the newest items as JSON.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod normalize;
pub mod routes;
