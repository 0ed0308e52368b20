// Path keys: how a record maps to a page path and back.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::routes::StaticPath;

/// Maps a record to the path it is served under.
pub type PathMapper<D> = Arc<dyn Fn(&D) -> StaticPath + Send + Sync>;

/// How a record's path key is derived.
pub enum PathKey<D> {
    /// Read a top-level field of the record's JSON form.
    Field(String),
    /// Ask a caller-supplied mapper for the record's whole path.
    Mapper(PathMapper<D>),
}

impl<D> Clone for PathKey<D> {
    fn clone(&self) -> Self {
        match self {
            PathKey::Field(name) => PathKey::Field(name.clone()),
            PathKey::Mapper(mapper) => PathKey::Mapper(Arc::clone(mapper)),
        }
    }
}

impl<D> fmt::Debug for PathKey<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Field(name) => f.debug_tuple("Field").field(name).finish(),
            PathKey::Mapper(_) => f.write_str("Mapper(..)"),
        }
    }
}

impl<D: Serialize> PathKey<D> {
    pub fn field(name: impl Into<String>) -> Self {
        PathKey::Field(name.into())
    }

    pub fn mapper<F>(f: F) -> Self
    where
        F: Fn(&D) -> StaticPath + Send + Sync + 'static,
    {
        PathKey::Mapper(Arc::new(f))
    }

    /// The slug a request must carry to select `record`.
    ///
    /// None means the record has no usable key and can never be selected.
    pub fn key_of(&self, record: &D, param: &str) -> Result<Option<String>> {
        match self {
            PathKey::Field(name) => {
                let value = serde_json::to_value(record)?;
                Ok(value.get(name).and_then(key_text))
            }
            PathKey::Mapper(mapper) => Ok(mapper(record).slug(param)),
        }
    }

    /// The path `record` is pre-rendered under; `index` only labels errors.
    ///
    /// Fails when the path cannot be matched back through `param`.
    pub fn path_of(&self, record: &D, param: &str, index: usize) -> Result<StaticPath> {
        match self {
            PathKey::Field(_) => self
                .key_of(record, param)?
                .map(|key| StaticPath::single(param, key))
                .ok_or(Error::InvalidKey { index }),
            PathKey::Mapper(mapper) => {
                let path = mapper(record);
                match path.slug(param) {
                    Some(_) => Ok(path),
                    None => Err(Error::InvalidKey { index }),
                }
            }
        }
    }
}

/// Render a scalar JSON value as path text.
fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
