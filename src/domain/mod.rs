pub mod entry;
pub mod headline;
pub mod key;

pub use entry::FeedEntry;
pub use headline::{FeedSnapshot, Publisher, RawHeadline};
pub use key::{derive_key, logo_key, FEED_PREFIX};
