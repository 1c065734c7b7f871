use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "LUMENFOLIO_CONFIG_DIR";
pub const ENV_CACHE_DIR: &str = "LUMENFOLIO_CACHE_DIR";

const QUALIFIER: &str = "dev";
const ORGANISATION: &str = "Lumenfolio";
const APPLICATION: &str = "lumenfolio";

const CONFIG_FILE: &str = "site.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let (Some(config_dir), Some(cache_dir)) =
            (env_override(ENV_CONFIG_DIR), env_override(ENV_CACHE_DIR))
        {
            return Ok(Self {
                config_dir,
                cache_dir,
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: env_override(ENV_CONFIG_DIR)
                .unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            cache_dir: env_override(ENV_CACHE_DIR)
                .unwrap_or_else(|| project_dirs.cache_dir().to_path_buf()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// User configuration, used when present and no `--config` is given.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn scene_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("scenes")
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    pub(crate) fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    pub(crate) struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        pub(crate) fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn clear(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_overrides_take_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let config_dir = root.path().join("config");
        let cache_dir = root.path().join("cache");

        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, &config_dir);
        let _cache_guard = EnvGuard::set(ENV_CACHE_DIR, &cache_dir);

        let paths = AppPaths::discover().unwrap();

        assert_eq!(paths.config_dir(), config_dir.as_path());
        assert_eq!(paths.cache_dir(), cache_dir.as_path());
        assert_eq!(paths.config_file(), config_dir.join("site.toml"));
        assert_eq!(paths.scene_cache_dir(), cache_dir.join("scenes"));
    }

    #[test]
    fn empty_override_is_ignored() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let cache_dir = root.path().join("cache");

        let _config_guard = EnvGuard::set(ENV_CONFIG_DIR, Path::new(""));
        let _cache_guard = EnvGuard::set(ENV_CACHE_DIR, &cache_dir);

        if let Ok(paths) = AppPaths::discover() {
            assert_ne!(paths.config_dir(), Path::new(""));
            assert_eq!(paths.cache_dir(), cache_dir.as_path());
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn cache_override_alone_keeps_default_config_dir() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let cache_dir = root.path().join("cache");

        let _config_guard = EnvGuard::clear(ENV_CONFIG_DIR);
        let _cache_guard = EnvGuard::set(ENV_CACHE_DIR, &cache_dir);

        if let Ok(paths) = AppPaths::discover() {
            assert_eq!(paths.cache_dir(), cache_dir.as_path());
            assert!(paths.config_dir().ends_with("lumenfolio"));
        }
    }
}
