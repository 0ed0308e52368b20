//! Bridge a list-producing data source into the two build phases of a static
//! site generator.
//!
//! During the paths phase, [`StaticDataBridge::enumerate_paths`] fetches every
//! record once, writes them to a [`CacheStore`], and returns one
//! [`StaticPath`] per record. During the props phase,
//! [`StaticDataBridge::compute_props`] reads the cache back, finds the record
//! whose key matches the request's path, and hands it to a
//! [`PropsTransform`].
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use static_data_paths::{CacheStore, HttpSource, PropsRequest, StaticDataBridge};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Post {
//!     id: String,
//!     title: String,
//! }
//!
//! # async fn run() -> static_data_paths::Result<()> {
//! let bridge = StaticDataBridge::keyed(HttpSource::<Post>::new("https://example.com/posts")?, "id")
//!     .cache(CacheStore::at("target/posts.json"))
//!     .build()?;
//!
//! let paths = bridge.enumerate_paths().await?;
//! for path in paths.paths {
//!     let props = bridge.compute_props(PropsRequest::new(path.params)).await?;
//!     let _ = props;
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cache;
pub mod error;
pub mod key;
pub mod props;
pub mod routes;
pub mod source;

pub use bridge::{BridgeOptions, DEFAULT_PARAM, StaticDataBridge, StaticDataBridgeBuilder};
pub use cache::CacheStore;
pub use error::{Error, Result};
pub use key::{PathKey, PathMapper};
pub use props::{IdentityProps, PropsContext, PropsRequest, PropsResult, PropsTransform};
pub use routes::{Fallback, Params, StaticPath, StaticPaths};
pub use source::{DataSource, HttpSource};
