use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use page::{ContactForm, ContactStatus, ExperienceTimeline};
use remote::{ContactMessage, HttpContactTransport, HttpSceneSource, SceneCache, SceneSource};
use renderer::{GpuOptions, RenderAdapter, ShaderSurface};
use siteconfig::SiteConfig;

use crate::cli::{RenderArgs, SubmitArgs};
use crate::paths::AppPaths;
use crate::run::ConfigOrigin;

pub const SCENE_TIMEOUT: Duration = Duration::from_secs(30);
/// Simulated frame spacing for offscreen renders.
const RENDER_FRAME: Duration = Duration::from_micros(16_667);

pub fn print_paths(paths: &AppPaths) -> Result<()> {
    println!("config dir:  {}", paths.config_dir().display());
    println!("config file: {}", paths.config_file().display());
    println!("cache dir:   {}", paths.cache_dir().display());
    println!("scene cache: {}", paths.scene_cache_dir().display());
    Ok(())
}

/// Structural checks run on load; this adds the glow layer syntax.
pub fn check_config(config: &SiteConfig) -> Result<()> {
    let timeline = ExperienceTimeline::new(&config.experience)
        .context("experience glow layers are invalid")?;
    println!(
        "ok: {} experience entries ({} glow layers), {} testimonials, {} scenes",
        timeline.entries().len(),
        timeline
            .entries()
            .iter()
            .map(|entry| entry.glow.layers().len())
            .sum::<usize>(),
        config.testimonials.len(),
        config.scenes.len()
    );
    Ok(())
}

pub fn print_config(config: &SiteConfig, origin: &ConfigOrigin) -> Result<()> {
    println!("# source: {origin}");
    print!("{}", config.to_toml_string()?);
    Ok(())
}

pub fn render(args: &RenderArgs) -> Result<()> {
    let options = GpuOptions {
        high_performance: args.high_performance,
        ..GpuOptions::default()
    };
    let mut surface = ShaderSurface::mount(args.program, args.size, options)
        .context("failed to set up offscreen rendering")?;
    let profile = surface.adapter_profile().clone();
    tracing::info!(
        adapter = %profile.name,
        backend = %profile.backend,
        software = profile.software,
        program = %args.program,
        size = %args.size,
        "rendering offscreen"
    );

    surface.start();
    if let Some((x, y)) = args.pointer {
        surface.pointer_moved(x, y);
    }
    let start = Instant::now();
    let mut last = None;
    for index in 0..args.frames.max(1) {
        last = surface.frame(start + RENDER_FRAME * index)?;
    }
    surface
        .export_png(&args.output)
        .with_context(|| format!("failed to export {}", args.output.display()))?;
    surface.dispose();

    let frame = last.map(|report| report.frame).unwrap_or_default();
    println!(
        "wrote {} ({} after {} frames on {})",
        args.output.display(),
        args.size,
        frame,
        profile.name
    );
    Ok(())
}

pub fn submit(args: &SubmitArgs, config: &SiteConfig) -> Result<()> {
    let endpoint = args
        .endpoint
        .as_deref()
        .unwrap_or(config.contact.endpoint.as_str());
    let access_key = args
        .access_key
        .clone()
        .unwrap_or_else(|| config.contact.access_key.clone());
    if access_key.is_empty() {
        tracing::warn!("no form access key configured; the relay will likely reject the message");
    }
    let transport = HttpContactTransport::new(
        endpoint,
        access_key,
        config.contact.subject.as_str(),
        config.contact.request_timeout,
    )?;

    let mut form = ContactForm::new(config.contact.reset_after);
    form.set_fields(ContactMessage {
        name: args.name.clone(),
        email: args.email.clone(),
        message: args.message.clone(),
    });
    let status = form.submit(&transport, Instant::now())?;
    println!("{status}: {}", status.button_label());
    if status == ContactStatus::Error {
        bail!("contact form was not delivered to {}", transport.endpoint());
    }
    Ok(())
}

pub fn fetch_scene(config: &SiteConfig, paths: &AppPaths, id: &str) -> Result<()> {
    let url = config.scene_url(id).with_context(|| {
        let known: Vec<&str> = config.scenes.keys().map(String::as_str).collect();
        format!("scene '{id}' is not configured (known: {})", known.join(", "))
    })?;
    let source = HttpSceneSource::new(SceneCache::new(paths.scene_cache_dir()), SCENE_TIMEOUT)?;
    let asset = source.load(id, url)?;
    println!(
        "{}: {} bytes ({})",
        asset.id,
        asset.bytes.len(),
        if asset.from_cache { "cached" } else { "downloaded" }
    );
    Ok(())
}

pub fn list_scenes(paths: &AppPaths) -> Result<()> {
    let scenes = SceneCache::new(paths.scene_cache_dir()).list()?;
    if scenes.is_empty() {
        println!("no cached scenes in {}", paths.scene_cache_dir().display());
        return Ok(());
    }
    for scene in scenes {
        println!("{}\t{}\t{}", scene.key, scene.bytes, scene.path.display());
    }
    Ok(())
}
