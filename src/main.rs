use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use driftfield::{Backend, FieldConfig, Viewport};
use tracing_subscriber::EnvFilter;

mod export;
mod io;
mod page;
mod server;
mod simulate;

use io::ConfigFormat;
use simulate::RunOptions;

/// Ambient particle-field backdrop: headless runs, snapshots and a dev server.
#[derive(Parser)]
#[command(name = "driftfield")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the field headless and print a JSON report
    Simulate {
        /// Config file (.json, .yaml, .yml); defaults to the canvas preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to run
        #[arg(long, default_value_t = 300)]
        frames: u64,

        /// Logical viewport width
        #[arg(long, default_value_t = 1280.0)]
        width: f32,

        /// Logical viewport height
        #[arg(long, default_value_t = 720.0)]
        height: f32,

        /// Device pixel ratio
        #[arg(long, default_value_t = 1.0)]
        dpr: f32,

        /// Hold the pointer still at X,Y
        #[arg(long, value_parser = parse_point)]
        pointer: Option<(f32, f32)>,

        /// Frame at which to resize
        #[arg(long, requires = "resize_to")]
        resize_at: Option<u64>,

        /// New size as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size, requires = "resize_at")]
        resize_to: Option<(f32, f32)>,

        /// RNG seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the field headless and write the last frame as SVG
    Snapshot {
        /// Config file (.json, .yaml, .yml); defaults to the canvas preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to run before capturing
        #[arg(long, default_value_t = 120)]
        frames: u64,

        #[arg(long, default_value_t = 1280.0)]
        width: f32,

        #[arg(long, default_value_t = 720.0)]
        height: f32,

        #[arg(long)]
        seed: Option<u64>,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a preset configuration
    Config {
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,

        #[arg(long, value_enum, default_value_t = Preset::Canvas)]
        preset: Preset,
    },
    /// Serve the host page with live reload
    Serve {
        /// Config file to embed; the page regenerates when it changes
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory to render into and serve
        #[arg(short, long, default_value = "site")]
        dir: PathBuf,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Canvas,
    Webgpu,
}

impl From<Preset> for Backend {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Canvas => Backend::Canvas,
            Preset::Webgpu => Backend::WebGpu,
        }
    }
}

fn parse_pair(s: &str, sep: char, what: &str) -> Result<(f32, f32), String> {
    let (a, b) = s
        .split_once(sep)
        .ok_or_else(|| format!("expected {what}, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("invalid number '{v}' in {what}: {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

fn parse_point(s: &str) -> Result<(f32, f32), String> {
    parse_pair(s, ',', "X,Y")
}

fn parse_size(s: &str) -> Result<(f32, f32), String> {
    parse_pair(&s.to_ascii_lowercase(), 'x', "WIDTHxHEIGHT")
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Logs go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(config: Option<&std::path::Path>) -> anyhow::Result<FieldConfig> {
    Ok(io::load_or_preset(config, Backend::Canvas)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            width,
            height,
            dpr,
            pointer,
            resize_at,
            resize_to,
            seed,
        } => {
            let config = load(config.as_deref())?;
            let options = RunOptions {
                frames,
                width,
                height,
                dpr,
                pointer,
                resize_at,
                resize_to,
                seed,
            };
            let report = simulate::run(config, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Snapshot {
            config,
            frames,
            width,
            height,
            seed,
            output,
        } => {
            let mut config = load(config.as_deref())?;
            if seed.is_some() {
                config.seed = seed;
            }
            let entropy = std::process::id() as u64;
            let svg = export::snapshot(config, Viewport::new(width, height, 1.0), frames, entropy)?;
            export::write_snapshot(&svg, &output)?;
            tracing::info!(output = %output.display(), frames, "snapshot written");
        }
        Commands::Config { format, preset } => {
            let config = FieldConfig::preset(preset.into());
            print!("{}", io::write_config(&config, format)?);
            if format == ConfigFormat::Json {
                println!();
            }
        }
        Commands::Serve { config, dir, port } => {
            server::serve(config.as_deref(), &dir, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["driftfield"]).is_err());
    }

    #[test]
    fn cli_parses_simulate_with_defaults() {
        let cli = Cli::try_parse_from(["driftfield", "simulate"]).unwrap();
        match cli.command {
            Commands::Simulate {
                config,
                frames,
                width,
                height,
                dpr,
                pointer,
                ..
            } => {
                assert!(config.is_none());
                assert_eq!(frames, 300);
                assert_eq!((width, height, dpr), (1280.0, 720.0, 1.0));
                assert!(pointer.is_none());
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn cli_parses_pointer_and_resize() {
        let cli = Cli::try_parse_from([
            "driftfield",
            "simulate",
            "--pointer",
            "120,80.5",
            "--resize-at",
            "10",
            "--resize-to",
            "640x360",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Simulate {
                pointer,
                resize_at,
                resize_to,
                ..
            } => {
                assert_eq!(pointer, Some((120.0, 80.5)));
                assert_eq!(resize_at, Some(10));
                assert_eq!(resize_to, Some((640.0, 360.0)));
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn resize_flags_come_in_pairs() {
        assert!(Cli::try_parse_from(["driftfield", "simulate", "--resize-at", "3"]).is_err());
        assert!(Cli::try_parse_from(["driftfield", "simulate", "--resize-to", "3x3"]).is_err());
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_point("12").is_err());
        assert!(parse_size("640by360").is_err());
        assert!(parse_point("a,1").is_err());
        assert_eq!(parse_size("800X600"), Ok((800.0, 600.0)));
    }

    #[test]
    fn cli_parses_snapshot_subcommand() {
        let cli = Cli::try_parse_from([
            "driftfield",
            "snapshot",
            "--frames",
            "5",
            "--output",
            "out.svg",
        ])
        .unwrap();
        match cli.command {
            Commands::Snapshot { frames, output, .. } => {
                assert_eq!(frames, 5);
                assert_eq!(output, PathBuf::from("out.svg"));
            }
            _ => panic!("Expected Snapshot command"),
        }
    }

    #[test]
    fn cli_parses_config_subcommand() {
        let cli =
            Cli::try_parse_from(["driftfield", "config", "--format", "yaml", "--preset", "webgpu"])
                .unwrap();
        match cli.command {
            Commands::Config { format, preset } => {
                assert_eq!(format, ConfigFormat::Yaml);
                assert_eq!(Backend::from(preset), Backend::WebGpu);
            }
            _ => panic!("Expected Config command"),
        }
    }

    #[test]
    fn cli_parses_serve_subcommand() {
        let cli = Cli::try_parse_from(["driftfield", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Commands::Serve { config, dir, port } => {
                assert!(config.is_none());
                assert_eq!(dir, PathBuf::from("site"));
                assert_eq!(port, 8080);
            }
            _ => panic!("Expected Serve command"),
        }
    }
}
