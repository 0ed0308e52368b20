// Static data bridge.
// Fetches records once during the paths phase, caches them on disk, and looks
// one record up per page during the props phase.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::key::PathKey;
use crate::props::{IdentityProps, PropsRequest, PropsResult, PropsTransform};
use crate::routes::{Fallback, StaticPath, StaticPaths, slug_of};
use crate::source::DataSource;

/// Default route param carrying the record key.
pub const DEFAULT_PARAM: &str = "slug";

/// Tunables shared by both bridge variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeOptions {
    /// Route param carrying the record key, e.g. `slug` for `[...slug]`.
    pub param: String,
    /// Fallback mode returned from the paths phase.
    pub fallback: Fallback,
    /// Revalidation interval set by the default props transformer.
    ///
    /// `None` keeps the variant's default, `Some(None)` (JSON `null`)
    /// disables revalidation.
    #[serde(
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub revalidate: Option<Option<u32>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Option<u32>>, D::Error> {
    Option::<u32>::deserialize(deserializer).map(Some)
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            param: DEFAULT_PARAM.to_string(),
            fallback: Fallback::default(),
            revalidate: None,
        }
    }
}

/// Bridges a data source into the paths and props phases of a static build.
///
/// [`enumerate_paths`](Self::enumerate_paths) must have completed (for the
/// same cache location) before [`compute_props`](Self::compute_props) runs.
pub struct StaticDataBridge<D: Send, P = Option<D>> {
    source: Box<dyn DataSource<D>>,
    key: PathKey<D>,
    transform: Box<dyn PropsTransform<D, P>>,
    cache: CacheStore,
    param: String,
    fallback: Fallback,
}

impl<D, P> fmt::Debug for StaticDataBridge<D, P>
where
    D: Send,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDataBridge")
            .field("key", &self.key)
            .field("cache", &self.cache)
            .field("param", &self.param)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl<D> StaticDataBridge<D>
where
    D: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Key records by one of their fields.
    pub fn keyed(
        source: impl DataSource<D> + 'static,
        field: impl Into<String>,
    ) -> StaticDataBridgeBuilder<D> {
        StaticDataBridgeBuilder::new(Box::new(source), PathKey::Field(field.into()), None)
    }

    /// Key records by the path a mapper derives from them.
    ///
    /// Unlike [`keyed`](Self::keyed), pages revalidate after 1 second unless
    /// overridden.
    pub fn mapped<F>(source: impl DataSource<D> + 'static, mapper: F) -> StaticDataBridgeBuilder<D>
    where
        F: Fn(&D) -> StaticPath + Send + Sync + 'static,
    {
        StaticDataBridgeBuilder::new(Box::new(source), PathKey::mapper(mapper), Some(1))
    }
}

impl<D, P> StaticDataBridge<D, P>
where
    D: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Paths phase: fetch every record, cache them, and list their paths.
    ///
    /// The cache is only overwritten once every record has a usable path.
    pub async fn enumerate_paths(&self) -> Result<StaticPaths> {
        let records = self.source.fetch().await?;

        let paths = records
            .iter()
            .enumerate()
            .map(|(index, record)| self.key.path_of(record, &self.param, index))
            .collect::<Result<Vec<_>>>()?;

        self.cache.write_records(&records).await?;

        tracing::info!(
            records = records.len(),
            cache = %self.cache.path().display(),
            "enumerated static paths"
        );

        Ok(StaticPaths {
            paths,
            fallback: self.fallback,
        })
    }

    /// Props phase: find the cached record for `request` and transform it.
    ///
    /// No matching record is not an error; the transformer sees `data: None`.
    pub async fn compute_props(&self, request: PropsRequest) -> Result<PropsResult<P>> {
        let slug = slug_of(&request.params, &self.param)
            .ok_or_else(|| Error::MissingParam(self.param.clone()))?;

        let data = self.lookup(&slug).await?;
        tracing::debug!(%slug, found = data.is_some(), "computing props");
        if data.is_none() {
            tracing::warn!(%slug, cache = %self.cache.path().display(), "no cached record matches path");
        }

        self.transform.transform(request.with_data(data)).await
    }

    /// First cached record whose key equals `slug`.
    pub async fn lookup(&self, slug: &str) -> Result<Option<D>> {
        let records: Vec<D> = self.cache.read_records().await?;

        for record in records {
            if self.key.key_of(&record, &self.param)?.as_deref() == Some(slug) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Configures a [`StaticDataBridge`]; see [`StaticDataBridge::keyed`] and
/// [`StaticDataBridge::mapped`].
pub struct StaticDataBridgeBuilder<D: Send, P = Option<D>> {
    source: Box<dyn DataSource<D>>,
    key: PathKey<D>,
    transform: Box<dyn PropsTransform<D, P>>,
    cache: Option<CacheStore>,
    options: BridgeOptions,
}

impl<D> StaticDataBridgeBuilder<D>
where
    D: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn new(source: Box<dyn DataSource<D>>, key: PathKey<D>, revalidate: Option<u32>) -> Self {
        Self {
            source,
            key,
            transform: Box::new(IdentityProps { revalidate }),
            cache: None,
            options: BridgeOptions {
                revalidate: Some(revalidate),
                ..BridgeOptions::default()
            },
        }
    }

    /// Revalidation interval for the default transformer; None disables it.
    pub fn revalidate(mut self, seconds: Option<u32>) -> Self {
        self.options.revalidate = Some(seconds);
        self.transform = Box::new(IdentityProps { revalidate: seconds });
        self
    }

    /// Apply a full set of options, e.g. loaded from a config file.
    ///
    /// An unset `revalidate` keeps the current value.
    pub fn options(self, options: BridgeOptions) -> Self {
        let revalidate = options.revalidate.or(self.options.revalidate).flatten();
        Self { options, ..self }.revalidate(revalidate)
    }

    /// Replace the default transformer. Revalidation is then up to `transform`.
    pub fn transform<P, T>(self, transform: T) -> StaticDataBridgeBuilder<D, P>
    where
        T: PropsTransform<D, P> + 'static,
    {
        StaticDataBridgeBuilder {
            source: self.source,
            key: self.key,
            transform: Box::new(transform),
            cache: self.cache,
            options: self.options,
        }
    }
}

impl<D, P> StaticDataBridgeBuilder<D, P>
where
    D: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Route param carrying the record key.
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.options.param = param.into();
        self
    }

    pub fn fallback(mut self, fallback: Fallback) -> Self {
        self.options.fallback = fallback;
        self
    }

    /// Where the record list is cached between phases. Required.
    pub fn cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fails with [`Error::NoCache`] unless [`cache`](Self::cache) was called.
    pub fn build(self) -> Result<StaticDataBridge<D, P>> {
        let cache = self.cache.ok_or(Error::NoCache)?;

        Ok(StaticDataBridge {
            source: self.source,
            key: self.key,
            transform: self.transform,
            cache,
            param: self.options.param,
            fallback: self.options.fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropsContext;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Page {
        id: String,
        title: String,
    }

    fn page(id: &str, title: &str) -> Page {
        Page {
            id: id.to_string(),
            title: title.to_string(),
        }
    }

    fn pages() -> Vec<Page> {
        vec![page("a", "Alpha"), page("b", "Beta")]
    }

    fn source(records: Vec<Page>) -> impl DataSource<Page> + 'static {
        move || {
            let records = records.clone();
            async move { Ok::<_, Error>(records) }
        }
    }

    #[tokio::test]
    async fn test_keyed_enumerate_paths() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .build()
            .unwrap();

        let result = bridge.enumerate_paths().await.unwrap();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "paths": [
                    { "params": { "slug": ["a"] } },
                    { "params": { "slug": ["b"] } }
                ],
                "fallback": false
            })
        );
        assert!(bridge.cache().exists().await);
    }

    #[tokio::test]
    async fn test_keyed_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .build()
            .unwrap();

        let paths = bridge.enumerate_paths().await.unwrap();
        for (path, expected) in paths.paths.into_iter().zip(pages()) {
            let result = bridge
                .compute_props(PropsRequest::new(path.params))
                .await
                .unwrap();
            assert_eq!(result.props, Some(expected));
            assert_eq!(result.revalidate, None);
        }
    }

    #[tokio::test]
    async fn test_mapped_matches_keyed() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::mapped(source(pages()), |p: &Page| {
            StaticPath::single("slug", p.id.clone())
        })
        .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
        .build()
        .unwrap();

        let paths = bridge.enumerate_paths().await.unwrap();
        assert_eq!(
            paths.paths,
            vec![StaticPath::single("slug", "a"), StaticPath::single("slug", "b")]
        );

        let result = bridge
            .compute_props(PropsRequest::single("slug", "a"))
            .await
            .unwrap();
        assert_eq!(result.props, Some(page("a", "Alpha")));
        assert_eq!(result.revalidate, Some(1));
    }

    #[tokio::test]
    async fn test_mapped_catch_all_segments() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::mapped(source(pages()), |p: &Page| {
            StaticPath::segments("path", vec!["docs".to_string(), p.id.clone()])
        })
        .param("path")
        .revalidate(None)
        .cache(CacheStore::in_dir(temp_dir.path(), "docs"))
        .build()
        .unwrap();

        bridge.enumerate_paths().await.unwrap();

        let request = PropsRequest::new(
            [("path".to_string(), vec!["docs".to_string(), "b".to_string()])]
                .into_iter()
                .collect(),
        );
        let result = bridge.compute_props(request).await.unwrap();
        assert_eq!(result.props, Some(page("b", "Beta")));
        assert_eq!(result.revalidate, None);
    }

    #[tokio::test]
    async fn test_props_without_enumeration_fails() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "never-written"))
            .build()
            .unwrap();

        let result = bridge.compute_props(PropsRequest::single("slug", "a")).await;
        assert!(matches!(result, Err(Error::CacheMissing(_))));
    }

    #[tokio::test]
    async fn test_unmatched_path_yields_no_data() {
        let temp_dir = TempDir::new().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&seen);

        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .transform(move |ctx: PropsContext<Page>| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, Error>(PropsResult::new(ctx.data.is_none())) }
            })
            .build()
            .unwrap();

        bridge.enumerate_paths().await.unwrap();
        let result = bridge
            .compute_props(PropsRequest::single("slug", "zzz"))
            .await
            .unwrap();

        assert!(result.props);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_request_param() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .build()
            .unwrap();
        bridge.enumerate_paths().await.unwrap();

        let result = bridge.compute_props(PropsRequest::single("id", "a")).await;
        assert!(matches!(result, Err(Error::MissingParam(p)) if p == "slug"));
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let temp_dir = TempDir::new().unwrap();
        let records = vec![page("a", "First"), page("a", "Second")];
        let bridge = StaticDataBridge::keyed(source(records), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "dupes"))
            .build()
            .unwrap();

        let paths = bridge.enumerate_paths().await.unwrap();
        assert_eq!(paths.paths.len(), 2);

        let found = bridge.lookup("a").await.unwrap();
        assert_eq!(found, Some(page("a", "First")));
    }

    #[tokio::test]
    async fn test_enumeration_overwrites_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::in_dir(temp_dir.path(), "pages");

        let first = StaticDataBridge::keyed(source(pages()), "id")
            .cache(store.clone())
            .build()
            .unwrap();
        first.enumerate_paths().await.unwrap();

        let second = StaticDataBridge::keyed(source(vec![page("c", "Gamma")]), "id")
            .cache(store)
            .build()
            .unwrap();
        second.enumerate_paths().await.unwrap();

        assert_eq!(first.lookup("a").await.unwrap(), None);
        assert_eq!(first.lookup("c").await.unwrap(), Some(page("c", "Gamma")));
    }

    #[tokio::test]
    async fn test_malformed_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::in_dir(temp_dir.path(), "pages");
        std::fs::write(store.path(), "[{\"id\":").unwrap();

        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .cache(store)
            .build()
            .unwrap();

        let result = bridge.compute_props(PropsRequest::single("slug", "a")).await;
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let failing = || async { Err::<Vec<Page>, _>(Error::Other("source down".to_string())) };
        let bridge = StaticDataBridge::keyed(failing, "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .build()
            .unwrap();

        let err = bridge.enumerate_paths().await.unwrap_err();
        assert_eq!(err.to_string(), "source down");
        assert!(!bridge.cache().exists().await);
    }

    #[tokio::test]
    async fn test_record_without_key_fails_enumeration() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::keyed(source(pages()), "missing")
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .build()
            .unwrap();

        let result = bridge.enumerate_paths().await;
        assert!(matches!(result, Err(Error::InvalidKey { index: 0 })));
    }

    #[tokio::test]
    async fn test_options_from_json() {
        let temp_dir = TempDir::new().unwrap();
        let options: BridgeOptions =
            serde_json::from_value(json!({ "fallback": "blocking", "revalidate": 60 })).unwrap();
        assert_eq!(options.param, DEFAULT_PARAM);

        let bridge = StaticDataBridge::keyed(source(pages()), "id")
            .options(options)
            .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
            .build()
            .unwrap();

        let paths = bridge.enumerate_paths().await.unwrap();
        assert_eq!(paths.fallback, Fallback::Blocking);

        let result = bridge
            .compute_props(PropsRequest::single("slug", "b"))
            .await
            .unwrap();
        assert_eq!(result.revalidate, Some(60));
    }

    #[tokio::test]
    async fn test_options_keep_mapped_revalidate() {
        let temp_dir = TempDir::new().unwrap();
        let by_id = |p: &Page| StaticPath::single("slug", p.id.clone());

        let options: BridgeOptions =
            serde_json::from_value(json!({ "fallback": true })).unwrap();
        assert_eq!(options.revalidate, None);
        let bridge = StaticDataBridge::mapped(source(pages()), by_id)
            .options(options)
            .cache(CacheStore::in_dir(temp_dir.path(), "kept"))
            .build()
            .unwrap();
        bridge.enumerate_paths().await.unwrap();
        let result = bridge
            .compute_props(PropsRequest::single("slug", "a"))
            .await
            .unwrap();
        assert_eq!(result.revalidate, Some(1));

        let options: BridgeOptions =
            serde_json::from_value(json!({ "revalidate": null })).unwrap();
        assert_eq!(options.revalidate, Some(None));
        let bridge = StaticDataBridge::mapped(source(pages()), by_id)
            .options(options)
            .cache(CacheStore::in_dir(temp_dir.path(), "disabled"))
            .build()
            .unwrap();
        bridge.enumerate_paths().await.unwrap();
        let result = bridge
            .compute_props(PropsRequest::single("slug", "a"))
            .await
            .unwrap();
        assert_eq!(result.revalidate, None);
    }

    #[test]
    fn test_build_requires_cache() {
        let posts = StaticDataBridge::keyed(source(pages()), "id").build();
        let authors = StaticDataBridge::keyed(source(vec![page("x", "Xavier")]), "id").build();

        assert!(matches!(posts, Err(Error::NoCache)));
        assert!(matches!(authors, Err(Error::NoCache)));
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Author {
        id: String,
        name: String,
    }

    #[tokio::test]
    async fn test_bridges_with_separate_caches_stay_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let posts = StaticDataBridge::keyed(source(pages()), "id")
            .cache(CacheStore::in_dir(temp_dir.path(), "posts"))
            .build()
            .unwrap();
        let authors = StaticDataBridge::keyed(
            || async {
                Ok::<_, Error>(vec![Author {
                    id: "a".to_string(),
                    name: "Ada".to_string(),
                }])
            },
            "id",
        )
        .cache(CacheStore::in_dir(temp_dir.path(), "authors"))
        .build()
        .unwrap();

        posts.enumerate_paths().await.unwrap();
        authors.enumerate_paths().await.unwrap();

        assert_ne!(posts.cache().path(), authors.cache().path());
        let result = posts
            .compute_props(PropsRequest::single("slug", "a"))
            .await
            .unwrap();
        assert_eq!(result.props, Some(page("a", "Alpha")));
    }

    #[tokio::test]
    async fn test_failed_enumeration_keeps_previous_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::in_dir(temp_dir.path(), "pages");

        let good = StaticDataBridge::keyed(source(pages()), "id")
            .cache(store.clone())
            .build()
            .unwrap();
        good.enumerate_paths().await.unwrap();

        let bad = StaticDataBridge::keyed(source(vec![page("c", "Gamma")]), "missing")
            .cache(store)
            .build()
            .unwrap();
        let result = bad.enumerate_paths().await;
        assert!(matches!(result, Err(Error::InvalidKey { index: 0 })));

        assert_eq!(good.lookup("a").await.unwrap(), Some(page("a", "Alpha")));
        assert_eq!(good.lookup("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mapper_without_param_fails_enumeration() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = StaticDataBridge::mapped(source(pages()), |p: &Page| {
            StaticPath::single("id", p.id.clone())
        })
        .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
        .build()
        .unwrap();

        let result = bridge.enumerate_paths().await;
        assert!(matches!(result, Err(Error::InvalidKey { index: 0 })));
        assert!(!bridge.cache().exists().await);
    }

    #[tokio::test]
    async fn test_shared_bridge_across_tasks() {
        let temp_dir = TempDir::new().unwrap();
        let bridge = Arc::new(
            StaticDataBridge::keyed(source(pages()), "id")
                .cache(CacheStore::in_dir(temp_dir.path(), "pages"))
                .build()
                .unwrap(),
        );
        let paths = bridge.enumerate_paths().await.unwrap();

        let handles: Vec<_> = paths
            .paths
            .into_iter()
            .map(|path| {
                let bridge = Arc::clone(&bridge);
                tokio::spawn(async move { bridge.compute_props(PropsRequest::new(path.params)).await })
            })
            .collect();

        let mut titles = Vec::new();
        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            titles.push(result.props.unwrap().title);
        }
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }
}
