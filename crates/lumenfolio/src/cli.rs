use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::{ShaderProgram, SurfaceSize};

#[derive(Parser, Debug)]
#[command(
    name = "lumenfolio",
    author,
    version,
    about = "Headless animated portfolio site: intro, motion and shader backgrounds"
)]
pub struct Cli {
    /// Site configuration to use instead of the discovered or bundled one.
    #[arg(long, global = true, value_name = "PATH", env = "LUMENFOLIO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate the page: intro, then a scripted scroll and pointer sweep.
    Run(RunArgs),
    /// Render a shader background offscreen and save the last frame as PNG.
    Render(RenderArgs),
    /// Send the contact form once.
    Submit(SubmitArgs),
    /// Warm or inspect the remote scene cache.
    Scene(SceneCommand),
    /// Validate or print the site configuration.
    Config(ConfigCommand),
    /// Print resolved configuration and cache directories.
    Where,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Simulated run length in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds, default_value = "10")]
    pub duration: Duration,

    /// Skip GPU setup and drive the simulated surface.
    #[arg(long)]
    pub no_gpu: bool,

    /// Viewport size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value_t = SurfaceSize::default())]
    pub size: SurfaceSize,

    /// Frames per simulated second.
    #[arg(long, value_name = "FPS", default_value_t = 60)]
    pub fps: u32,

    /// Advance a virtual clock instead of sleeping between frames.
    #[arg(long)]
    pub fast: bool,

    /// Fetch the embedded 3D scenes once content mounts.
    #[arg(long)]
    pub fetch_scenes: bool,

    /// Print the final page frame as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Which background to render: `hero` or `transition`.
    #[arg(value_name = "PROGRAM")]
    pub program: ShaderProgram,

    /// Destination PNG.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Frames to render before exporting.
    #[arg(long, value_name = "N", default_value_t = 60)]
    pub frames: u32,

    #[arg(long, value_name = "WIDTHxHEIGHT", default_value_t = SurfaceSize::default())]
    pub size: SurfaceSize,

    /// Pointer position as viewport fractions (e.g. `0.8,0.2`).
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<(f32, f32)>,

    /// Prefer a discrete GPU when more than one adapter is present.
    #[arg(long)]
    pub high_performance: bool,
}

#[derive(Parser, Debug)]
pub struct SubmitArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub message: String,

    /// Override the configured form endpoint.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Form relay access key; falls back to the configured one.
    #[arg(long, env = "LUMENFOLIO_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SceneCommand {
    #[command(subcommand)]
    pub action: SceneAction,
}

#[derive(Subcommand, Debug)]
pub enum SceneAction {
    /// Download a configured scene into the cache (no-op when cached).
    Fetch {
        /// Scene id from the `[scenes]` table.
        id: String,
    },
    /// List cached scenes.
    List,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Parse and validate a configuration file.
    Check {
        /// Defaults to the effective configuration.
        path: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML.
    Print,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| format!("invalid duration '{trimmed}'; expected seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("duration must be a non-negative number, got {trimmed}"));
    }
    Ok(Duration::from_secs_f64(seconds))
}

pub fn parse_pointer(value: &str) -> Result<(f32, f32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{value}'"))?;
    let parse = |part: &str| -> Result<f32, String> {
        let parsed: f32 = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid pointer coordinate '{}'", part.trim()))?;
        if !(0.0..=1.0).contains(&parsed) {
            return Err(format!("pointer coordinates must lie in [0, 1], got {parsed}"));
        }
        Ok(parsed)
    };
    Ok((parse(x)?, parse(y)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fractional_seconds() {
        assert_eq!(parse_seconds("2.5").unwrap(), Duration::from_millis(2500));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn parses_pointer_fractions() {
        assert_eq!(parse_pointer("0.8, 0.2").unwrap(), (0.8, 0.2));
        assert!(parse_pointer("0.8").is_err());
        assert!(parse_pointer("1.5,0").is_err());
    }

    #[test]
    fn render_accepts_program_aliases() {
        let cli = Cli::try_parse_from([
            "lumenfolio", "render", "transition", "--output", "out.png", "--size", "64x32",
        ])
        .unwrap();
        match cli.command {
            Command::Render(args) => {
                assert_eq!(args.program, ShaderProgram::RadialRings);
                assert_eq!(args.size, SurfaceSize::new(64, 32));
                assert_eq!(args.frames, 60);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
