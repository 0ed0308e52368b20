// Cache module for the on-disk artifact bridging the build phases.
// The enumeration phase writes the record list; the props phase reads it back.

pub mod paths;
pub mod store;

pub use paths::{CACHE_DIR_ENV, cache_dir};
pub use store::CacheStore;
