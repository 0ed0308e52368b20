// Static route types handed back to the site generator.
// Mirrors the JSON shape generators expect from a paths phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Route params: param name to its (catch-all) segments.
pub type Params = BTreeMap<String, Vec<String>>;

/// One page to pre-render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPath {
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl StaticPath {
    /// A path with a single param holding a single segment.
    pub fn single(param: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::segments(param, vec![segment.into()])
    }

    /// A path with a single catch-all param.
    pub fn segments(param: impl Into<String>, segments: Vec<String>) -> Self {
        let mut params = Params::new();
        params.insert(param.into(), segments);
        Self {
            params,
            locale: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Segments of `param` joined with `/`, or None if the param is absent.
    pub fn slug(&self, param: &str) -> Option<String> {
        slug_of(&self.params, param)
    }
}

/// Join the segments of `param` with `/`.
pub(crate) fn slug_of(params: &Params, param: &str) -> Option<String> {
    params.get(param).map(|segments| segments.join("/"))
}

/// What the generator does for paths not returned by the paths phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    /// Unknown paths 404. Serialized as `false`.
    #[default]
    Disabled,
    /// Serve a fallback page, render in the background. Serialized as `true`.
    Enabled,
    /// Render on first request before responding. Serialized as `"blocking"`.
    Blocking,
}

impl Serialize for Fallback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Fallback::Disabled => serializer.serialize_bool(false),
            Fallback::Enabled => serializer.serialize_bool(true),
            Fallback::Blocking => serializer.serialize_str("blocking"),
        }
    }
}

impl<'de> Deserialize<'de> for Fallback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Mode(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Fallback::Disabled),
            Raw::Flag(true) => Ok(Fallback::Enabled),
            Raw::Mode(mode) if mode == "blocking" => Ok(Fallback::Blocking),
            Raw::Mode(mode) => Err(serde::de::Error::custom(format!(
                "unknown fallback mode `{}`, expected true, false or \"blocking\"",
                mode
            ))),
        }
    }
}

/// Result of the paths phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPaths {
    pub paths: Vec<StaticPath>,
    pub fallback: Fallback,
}
