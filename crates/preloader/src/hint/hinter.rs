#![forbid(unsafe_code)]

use crate::document::{HeadDocument, HeadWriter, HintElement, LinkRel};
use crate::domain::{PreloadItem, ResourceUrl};
use crate::error::Error;
use async_trait::async_trait;
use moka::sync::Cache;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::trace;

#[async_trait]
pub trait ResourceHinter: Send + Sync {
    /// Issue the preload for one item. Resolves once the hint has settled.
    async fn schedule(&self, item: &PreloadItem) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct NoopHinter;

#[async_trait]
impl ResourceHinter for NoopHinter {
    async fn schedule(&self, _item: &PreloadItem) -> Result<(), Error> {
        Ok(())
    }
}

/// Emits `<link rel="preload">` elements into a shared head document.
#[derive(Debug, Clone, Default)]
pub struct LinkHinter {
    head: Arc<Mutex<HeadDocument>>,
}

impl LinkHinter {
    pub fn new(head: Arc<Mutex<HeadDocument>>) -> Self {
        Self { head }
    }

    pub fn head(&self) -> Arc<Mutex<HeadDocument>> {
        self.head.clone()
    }

    fn element(item: &PreloadItem) -> HintElement {
        HintElement::Link {
            rel: LinkRel::Preload,
            href: item.url.to_string(),
            as_kind: Some(item.kind.as_str()),
            crossorigin: item.kind.crossorigin(),
        }
    }
}

#[async_trait]
impl ResourceHinter for LinkHinter {
    async fn schedule(&self, item: &PreloadItem) -> Result<(), Error> {
        let url = item.url.as_str();
        if url.is_empty() || url.chars().any(char::is_whitespace) {
            return Err(Error::InvalidUrl(url.to_owned()));
        }
        let mut head = self.head.lock().map_err(|_| Error::Hint {
            url: url.to_owned(),
            reason: "head document lock poisoned".to_owned(),
        })?;
        head.ensure(Self::element(item));
        Ok(())
    }
}

/// Warms resources served from a local static directory into an in-memory
/// cache.
///
/// Urls are resolved relative to `root`; only root-relative paths are
/// accepted.
#[derive(Clone)]
pub struct StaticDirHinter {
    root: PathBuf,
    cache: Cache<ResourceUrl, Arc<[u8]>>,
}

impl StaticDirHinter {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_url: &ResourceUrl, bytes: &Arc<[u8]>| {
                u32::try_from(bytes.len()).unwrap_or(u32::MAX)
            })
            .build();
        Self {
            root: root.into(),
            cache,
        }
    }

    pub fn cached(&self, url: &ResourceUrl) -> Option<Arc<[u8]>> {
        self.cache.get(url)
    }

    pub fn resolve(&self, url: &str) -> Result<PathBuf, Error> {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidUrl(url.to_owned()))?;

        let mut resolved = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(Error::InvalidUrl(url.to_owned())),
            }
        }
        if resolved == self.root {
            return Err(Error::InvalidUrl(url.to_owned()));
        }
        Ok(resolved)
    }

    fn read(path: &Path) -> Result<Vec<u8>, Error> {
        std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_owned()),
            _ => Error::Io(err),
        })
    }
}

impl std::fmt::Debug for StaticDirHinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticDirHinter")
            .field("root", &self.root)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl ResourceHinter for StaticDirHinter {
    async fn schedule(&self, item: &PreloadItem) -> Result<(), Error> {
        if self.cache.contains_key(&item.url) {
            return Ok(());
        }
        let path = self.resolve(item.url.as_str())?;
        let bytes = tokio::task::spawn_blocking(move || Self::read(&path))
            .await
            .map_err(|err| Error::Io(std::io::Error::other(err)))??;
        trace!(url = %item.url, len = bytes.len(), "resource warmed");
        self.cache.insert(item.url.clone(), Arc::from(bytes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Priority;
    use proptest::prelude::*;

    #[test]
    fn resolve_rejects_escaping_paths() {
        let hinter = StaticDirHinter::new("/srv/www", 1024);
        assert_eq!(
            hinter.resolve("/assets/app.js?v=3").unwrap(),
            PathBuf::from("/srv/www/assets/app.js")
        );
        assert!(hinter.resolve("/../etc/passwd").is_err());
        assert!(hinter.resolve("https://cdn.example/app.js").is_err());
        assert!(hinter.resolve("/").is_err());
    }

    #[tokio::test]
    async fn link_hinter_marks_fonts_crossorigin() {
        let hinter = LinkHinter::default();
        hinter
            .schedule(&PreloadItem::new(
                "/fonts/inter.woff2",
                config::ResourceKind::Font,
                Priority::High,
            ))
            .await
            .unwrap();
        hinter
            .schedule(&PreloadItem::script("/app.js", Priority::High))
            .await
            .unwrap();

        let head = hinter.head();
        let html = head.lock().unwrap().render();
        assert_eq!(
            html,
            "<link rel=\"preload\" href=\"/fonts/inter.woff2\" as=\"font\" crossorigin>\n\
             <link rel=\"preload\" href=\"/app.js\" as=\"script\">"
        );
    }

    #[tokio::test]
    async fn link_hinter_rejects_malformed_url() {
        let hinter = LinkHinter::default();
        let result = hinter
            .schedule(&PreloadItem::script("not a url", Priority::Low))
            .await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
        assert!(hinter.head().lock().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn resolved_paths_stay_under_root(segments in prop::collection::vec("[a-z.]{1,6}", 1..5)) {
            let hinter = StaticDirHinter::new("/srv/www", 1024);
            let url = format!("/{}", segments.join("/"));
            if let Ok(path) = hinter.resolve(&url) {
                prop_assert!(path.starts_with("/srv/www"));
                prop_assert!(path != Path::new("/srv/www"));
            }
        }
    }
}
