// Props phase types and transformers.
// A transformer turns the matched record into the payload a page renders with.

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::routes::Params;

/// What the generator passes to the props phase for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropsRequest {
    #[serde(default)]
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default)]
    pub preview: bool,
}

impl PropsRequest {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Request for a page with a single-segment param.
    pub fn single(param: impl Into<String>, segment: impl Into<String>) -> Self {
        let mut params = Params::new();
        params.insert(param.into(), vec![segment.into()]);
        Self::new(params)
    }

    /// Attach the looked-up record.
    pub fn with_data<D>(self, data: Option<D>) -> PropsContext<D> {
        PropsContext {
            params: self.params,
            locale: self.locale,
            preview: self.preview,
            data,
        }
    }
}

/// A [`PropsRequest`] plus the record whose key matched its path.
///
/// `data` is None when no cached record matched.
#[derive(Debug, Clone, PartialEq)]
pub struct PropsContext<D> {
    pub params: Params,
    pub locale: Option<String>,
    pub preview: bool,
    pub data: Option<D>,
}

/// Output of the props phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropsResult<P> {
    pub props: P,
    /// Seconds after which the page may be regenerated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revalidate: Option<u32>,
}

impl<P> PropsResult<P> {
    pub fn new(props: P) -> Self {
        Self {
            props,
            revalidate: None,
        }
    }

    pub fn revalidate(mut self, seconds: u32) -> Self {
        self.revalidate = Some(seconds);
        self
    }
}

/// Builds page props from a request and its matched record.
#[async_trait]
pub trait PropsTransform<D: Send, P>: Send + Sync {
    async fn transform(&self, ctx: PropsContext<D>) -> Result<PropsResult<P>>;
}

#[async_trait]
impl<D, P, F, Fut> PropsTransform<D, P> for F
where
    D: Send + 'static,
    P: 'static,
    F: Fn(PropsContext<D>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PropsResult<P>>> + Send + 'static,
{
    async fn transform(&self, ctx: PropsContext<D>) -> Result<PropsResult<P>> {
        (self)(ctx).await
    }
}

/// Default transformer: the record itself is the props.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityProps {
    pub revalidate: Option<u32>,
}

#[async_trait]
impl<D: Send + 'static> PropsTransform<D, Option<D>> for IdentityProps {
    async fn transform(&self, ctx: PropsContext<D>) -> Result<PropsResult<Option<D>>> {
        Ok(PropsResult {
            props: ctx.data,
            revalidate: self.revalidate,
        })
    }
}
