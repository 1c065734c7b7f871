use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use motion::Viewport;
use page::{HeroBackground, Page, PageEvent, PageFrame, SectionId, ShaderBackgrounds};
use remote::{HttpSceneSource, SceneCache};
use renderer::{mount_best_effort, GpuOptions, RenderAdapter, ShaderProgram, SimulatedSurface};
use sequencer::SequencerEvent;
use serde::Serialize;
use siteconfig::SiteConfig;
use tracing::{debug, info, warn};

use crate::cli::RunArgs;
use crate::commands::SCENE_TIMEOUT;
use crate::paths::AppPaths;

/// What a simulated run observed.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub simulated_ms: u64,
    pub gpu: bool,
    pub intro_completed_ms: Option<u64>,
    pub readiness_timed_out: bool,
    pub sections_visited: Vec<SectionId>,
    pub glow_activations: u32,
    pub testimonial_advances: u32,
    pub listeners_after_teardown: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a RunSummary,
    last_frame: &'a PageFrame,
}

pub fn run(args: &RunArgs, config: &SiteConfig, paths: &AppPaths) -> Result<()> {
    let viewport = Viewport::new(f64::from(args.size.width), f64::from(args.size.height));
    let (backgrounds, gpu) = mount_backgrounds(args);
    let fps = args.fps.max(1);
    let frame_interval = Duration::from_secs(1) / fps;
    let total_frames = (args.duration.as_secs_f64() * f64::from(fps)).ceil() as u64;

    let start = Instant::now();
    let mut page =
        Page::new(config, viewport, backgrounds, start).context("failed to assemble page")?;
    let mut script = Script::new(start, args.duration);
    let mut summary = RunSummary {
        gpu,
        ..RunSummary::default()
    };
    let mut last_frame = page.frame(start);

    for index in 0..=total_frames {
        let now = start + frame_interval * u32::try_from(index).unwrap_or(u32::MAX);
        if !args.fast {
            thread::sleep(now.saturating_duration_since(Instant::now()));
        }

        let mut events = page.tick(now);
        if events.contains(&PageEvent::ContentMounted) {
            script.content_mounted(now);
            if args.fetch_scenes {
                fetch_scenes(&mut page, paths);
            }
        }
        events.extend(script.drive(&mut page, viewport, now));
        for event in &events {
            record(&mut summary, event, start, now);
        }

        last_frame = page.frame(now);
        summary.frames = index + 1;
        summary.simulated_ms = millis(now - start);
    }

    page.teardown();
    summary.listeners_after_teardown = page.registry().total();
    if summary.listeners_after_teardown > 0 {
        warn!(
            remaining = summary.listeners_after_teardown,
            "listeners left attached after teardown"
        );
    }
    report(args, &summary, &last_frame)
}

/// Mounts the hero and transition renderers. The flag is true only when both
/// got a GPU.
fn mount_backgrounds(args: &RunArgs) -> (ShaderBackgrounds, bool) {
    let (hero, hero_gpu) = mount_surface(args, ShaderProgram::HeroWaves);
    let (transition, transition_gpu) = mount_surface(args, ShaderProgram::RadialRings);
    (ShaderBackgrounds { hero, transition }, hero_gpu && transition_gpu)
}

fn mount_surface(args: &RunArgs, program: ShaderProgram) -> (Box<dyn RenderAdapter>, bool) {
    if args.no_gpu {
        info!(%program, "GPU disabled; using simulated surface");
        let surface = SimulatedSurface::mount(program, args.size);
        return (Box::new(surface), false);
    }
    mount_best_effort(program, args.size, GpuOptions::default())
}

fn fetch_scenes(page: &mut Page, paths: &AppPaths) {
    match HttpSceneSource::new(SceneCache::new(paths.scene_cache_dir()), SCENE_TIMEOUT) {
        Ok(source) => page.resolve_scenes(&source),
        Err(err) => warn!(error = %format!("{err:#}"), "scene fetching unavailable"),
    }
}

fn record(summary: &mut RunSummary, event: &PageEvent, start: Instant, now: Instant) {
    match event {
        PageEvent::Intro(SequencerEvent::Phase(phase)) => {
            debug!(%phase, "intro advanced");
        }
        PageEvent::Intro(SequencerEvent::Completed) => {
            summary.intro_completed_ms = Some(millis(now - start));
        }
        PageEvent::Intro(SequencerEvent::ReadinessTimedOut) => {
            summary.readiness_timed_out = true;
        }
        PageEvent::BackgroundFallback => {
            info!("hero background switched to static fallback");
        }
        PageEvent::ContentMounted => {
            info!(elapsed_ms = millis(now - start), "content mounted");
        }
        PageEvent::ActiveSection(section) => {
            info!(%section, "active section");
            if !summary.sections_visited.contains(section) {
                summary.sections_visited.push(*section);
            }
        }
        PageEvent::GlowChanged { active } => {
            debug!(active, "glow");
            if *active {
                summary.glow_activations += 1;
            }
        }
        PageEvent::TestimonialAdvanced { index } => {
            debug!(index, "testimonial advanced");
            summary.testimonial_advances += 1;
        }
        PageEvent::Contact(status) => {
            debug!(%status, "contact status");
        }
    }
}

fn report(args: &RunArgs, summary: &RunSummary, last_frame: &PageFrame) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(&JsonReport {
            summary,
            last_frame,
        })?;
        println!("{json}");
        return Ok(());
    }
    let background = match last_frame.background {
        HeroBackground::Shader => "shader",
        HeroBackground::StaticFallback => "static",
    };
    match summary.intro_completed_ms {
        Some(ms) => println!(
            "intro completed at {ms} ms; {} frames, {} sections visited, {} glow activations, background {background}",
            summary.frames,
            summary.sections_visited.len(),
            summary.glow_activations
        ),
        None => println!(
            "intro still running after {} ms ({} frames), background {background}",
            summary.simulated_ms, summary.frames
        ),
    }
    Ok(())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Scripted visitor: sweeps the pointer from the start, then scrolls from
/// top to bottom over the rest of the run, hovering experience entries on
/// the way.
#[derive(Debug)]
struct Script {
    start: Instant,
    end: Instant,
    mounted_at: Option<Instant>,
    hovered: Option<usize>,
}

impl Script {
    fn new(start: Instant, duration: Duration) -> Self {
        Self {
            start,
            end: start + duration,
            mounted_at: None,
            hovered: None,
        }
    }

    fn content_mounted(&mut self, now: Instant) {
        self.mounted_at.get_or_insert(now);
    }

    fn drive(&mut self, page: &mut Page, viewport: Viewport, now: Instant) -> Vec<PageEvent> {
        let t = (now - self.start).as_secs_f64();
        page.pointer_moved(
            viewport.width * (0.5 + 0.4 * (t * 1.3).sin()),
            viewport.height * (0.5 + 0.4 * (t * 0.9).sin()),
        );

        let Some(mounted_at) = self.mounted_at else {
            return Vec::new();
        };
        let span = self.end.saturating_duration_since(mounted_at).as_secs_f64();
        let progress = if span > 0.0 {
            ((now - mounted_at).as_secs_f64() / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let mut events = page.scroll_to(progress * page.layout().max_scroll(), now);

        let experience = page.layout().section(SectionId::Experience);
        let entries = page.experience().entries().len();
        let probe = page.scroll_y() + viewport.height * 0.5;
        let target = if entries > 0 && probe >= experience.top && probe < experience.bottom() {
            let fraction = (probe - experience.top) / experience.height;
            Some(((fraction * entries as f64) as usize).min(entries - 1))
        } else {
            None
        };
        if target != self.hovered {
            self.hovered = target;
            events.extend(match target {
                Some(index) => page.hover_experience(index, now),
                None => page.leave_experience(now),
            });
        }
        events
    }
}
