use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use siteconfig::SiteConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigAction, SceneAction};
use crate::commands;
use crate::paths::AppPaths;
use crate::simulate;

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        cache = %paths.cache_dir().display(),
        "resolved lumenfolio paths"
    );

    match args.command {
        Command::Where => commands::print_paths(&paths),
        Command::Config(command) => match command.action {
            ConfigAction::Check { path } => match path {
                Some(path) => commands::check_config(&SiteConfig::load(&path).with_context(
                    || format!("configuration {} is invalid", path.display()),
                )?),
                None => commands::check_config(&load_config(args.config.as_deref(), &paths)?.0),
            },
            ConfigAction::Print => {
                let (config, origin) = load_config(args.config.as_deref(), &paths)?;
                commands::print_config(&config, &origin)
            }
        },
        Command::Render(render) => commands::render(&render),
        Command::Submit(submit) => {
            let (config, _) = load_config(args.config.as_deref(), &paths)?;
            commands::submit(&submit, &config)
        }
        Command::Scene(command) => match command.action {
            SceneAction::Fetch { id } => {
                let (config, _) = load_config(args.config.as_deref(), &paths)?;
                commands::fetch_scene(&config, &paths, &id)
            }
            SceneAction::List => commands::list_scenes(&paths),
        },
        Command::Run(run) => {
            let (config, origin) = load_config(args.config.as_deref(), &paths)?;
            tracing::info!(%origin, "loaded site configuration");
            simulate::run(&run, &config, &paths)
        }
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Flag(PathBuf),
    User(PathBuf),
    Bundled,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Flag(path) | ConfigOrigin::User(path) => {
                write!(f, "{}", path.display())
            }
            ConfigOrigin::Bundled => f.write_str("bundled"),
        }
    }
}

/// `--config` wins, then the user's `site.toml`, then the bundled content.
pub fn load_config(flag: Option<&Path>, paths: &AppPaths) -> Result<(SiteConfig, ConfigOrigin)> {
    if let Some(path) = flag {
        let config = SiteConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?;
        return Ok((config, ConfigOrigin::Flag(path.to_path_buf())));
    }
    let user = paths.config_file();
    if user.is_file() {
        let config = SiteConfig::load(&user)
            .with_context(|| format!("failed to load configuration {}", user.display()))?;
        return Ok((config, ConfigOrigin::User(user)));
    }
    let config = SiteConfig::bundled().context("bundled configuration is invalid")?;
    Ok((config, ConfigOrigin::Bundled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::tests::{env_lock, EnvGuard};
    use crate::paths::{ENV_CACHE_DIR, ENV_CONFIG_DIR};
    use std::fs;
    use tempfile::TempDir;

    fn isolated_paths(root: &TempDir) -> (AppPaths, EnvGuard, EnvGuard) {
        let config = EnvGuard::set(ENV_CONFIG_DIR, &root.path().join("config"));
        let cache = EnvGuard::set(ENV_CACHE_DIR, &root.path().join("cache"));
        (AppPaths::discover().unwrap(), config, cache)
    }

    #[test]
    fn falls_back_to_bundled_config() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _config, _cache) = isolated_paths(&root);
        let (config, origin) = load_config(None, &paths).unwrap();
        assert_eq!(origin, ConfigOrigin::Bundled);
        assert_eq!(config.experience.len(), 4);
    }

    #[test]
    fn user_config_overrides_bundled() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _config, _cache) = isolated_paths(&root);
        let mut bundled = SiteConfig::bundled().unwrap();
        bundled.testimonials.truncate(2);
        fs::create_dir_all(paths.config_dir()).unwrap();
        fs::write(paths.config_file(), bundled.to_toml_string().unwrap()).unwrap();

        let (config, origin) = load_config(None, &paths).unwrap();
        assert_eq!(origin, ConfigOrigin::User(paths.config_file()));
        assert_eq!(config.testimonials.len(), 2);
    }

    #[test]
    fn flag_config_errors_are_reported() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let (paths, _config, _cache) = isolated_paths(&root);
        let missing = root.path().join("missing.toml");
        let err = load_config(Some(&missing), &paths).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }
}
