//! App Store review acquisition.
//!
//! Resolves application identifiers through the public search endpoint, pages
//! through the customer-review feed, and assembles a bounded review sample.

mod client;
mod collector;
mod types;

pub use self::client::AppStoreClient;
pub use self::collector::{ReviewCollector, SamplingPolicy};
pub use self::types::*;

/// Hard upper bound on feed pages fetched for one collection.
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Reviews accumulated per requested review before random sampling.
pub const DEFAULT_OVERSAMPLING_FACTOR: usize = 2;
