use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{debug, info};

const SCENE_EXTENSION: &str = "splinecode";

/// Bytes of a remote 3D scene, ready for the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneAsset {
    pub id: String,
    pub url: String,
    pub bytes: Vec<u8>,
    pub from_cache: bool,
}

/// Loads a scene by id and URL.
pub trait SceneSource {
    fn load(&self, id: &str, url: &str) -> Result<SceneAsset>;
}

/// One entry found in the on-disk cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedScene {
    pub key: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Scene bytes on disk, one file per sanitised scene id.
#[derive(Debug, Clone)]
pub struct SceneCache {
    root: PathBuf,
}

impl SceneCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        let key = sanitize_label(id).ok_or_else(|| anyhow!("scene id '{id}' has no usable characters"))?;
        Ok(self.root.join(format!("{key}.{SCENE_EXTENSION}")))
    }

    pub fn read(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub fn write(&self, id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Cached scenes sorted by key. A missing cache directory is empty.
    pub fn list(&self) -> Result<Vec<CachedScene>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to list {}", self.root.display()))
            }
        };
        let mut scenes = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SCENE_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let bytes = fs::metadata(&path)?.len();
            scenes.push(CachedScene {
                key: key.to_string(),
                path: path.clone(),
                bytes,
            });
        }
        scenes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(scenes)
    }
}

/// Cache-first scene fetcher.
#[derive(Debug, Clone)]
pub struct HttpSceneSource {
    http: Client,
    cache: SceneCache,
}

impl HttpSceneSource {
    pub fn new(cache: SceneCache, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, cache })
    }

    pub fn cache(&self) -> &SceneCache {
        &self.cache
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).with_context(|| format!("invalid scene url '{url}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("scene url must be http(s), got '{url}'");
        }
        debug!(%url, "downloading scene");
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .context("scene request failed")?;
        Ok(response.bytes()?.to_vec())
    }
}

impl SceneSource for HttpSceneSource {
    fn load(&self, id: &str, url: &str) -> Result<SceneAsset> {
        if let Some(bytes) = self.cache.read(id)? {
            debug!(id, bytes = bytes.len(), "scene served from cache");
            return Ok(SceneAsset {
                id: id.to_string(),
                url: url.to_string(),
                bytes,
                from_cache: true,
            });
        }
        let bytes = self.download(url)?;
        let path = self.cache.write(id, &bytes)?;
        info!(id, bytes = bytes.len(), path = %path.display(), "cached scene");
        Ok(SceneAsset {
            id: id.to_string(),
            url: url.to_string(),
            bytes,
            from_cache: false,
        })
    }
}

fn sanitize_label(input: &str) -> Option<String> {
    let mut result = String::new();
    let mut prev_underscore = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            prev_underscore = false;
        } else if !result.is_empty() && !prev_underscore {
            result.push('_');
            prev_underscore = true;
        }
    }
    while result.ends_with('_') {
        result.pop();
    }
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{closed_port, serve_once};

    #[test]
    fn sanitises_scene_ids() {
        assert_eq!(sanitize_label("Transition"), Some("transition".into()));
        assert_eq!(sanitize_label("../hero scene/"), Some("hero_scene".into()));
        assert_eq!(sanitize_label("a--b"), Some("a_b".into()));
        assert_eq!(sanitize_label("//"), None);
    }

    #[test]
    fn cache_round_trips_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SceneCache::new(dir.path().join("scenes"));
        assert!(cache.list().unwrap().is_empty());
        assert_eq!(cache.read("transition").unwrap(), None);

        cache.write("Testimonials", b"abcd").unwrap();
        cache.write("transition", b"xy").unwrap();
        assert_eq!(cache.read("testimonials").unwrap(), Some(b"abcd".to_vec()));

        let listed = cache.list().unwrap();
        let keys: Vec<_> = listed.iter().map(|scene| scene.key.as_str()).collect();
        assert_eq!(keys, ["testimonials", "transition"]);
        assert_eq!(listed[0].bytes, 4);
        assert!(cache.path_for("***").is_err());
    }

    #[test]
    fn fetches_then_serves_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            HttpSceneSource::new(SceneCache::new(dir.path()), Duration::from_secs(5)).unwrap();
        let (base, server) = serve_once(200, b"scene-bytes");
        let url = format!("{base}/scene.splinecode");

        let first = source.load("transition", &url).unwrap();
        let captured = server.join().unwrap();
        assert_eq!(captured.request_line, "GET /scene.splinecode HTTP/1.1");
        assert!(!first.from_cache);
        assert_eq!(first.bytes, b"scene-bytes");

        let second = source.load("transition", &closed_port()).unwrap();
        assert!(second.from_cache);
        assert_eq!(second.bytes, b"scene-bytes");
    }

    #[test]
    fn failed_download_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source =
            HttpSceneSource::new(SceneCache::new(dir.path()), Duration::from_secs(5)).unwrap();
        let (base, server) = serve_once(404, b"");
        assert!(source.load("hero", &base).is_err());
        server.join().unwrap();
        assert!(source.load("hero", &closed_port()).is_err());
        assert!(source.cache().list().unwrap().is_empty());
    }
}
