use chrono::Datelike;
use clap::{Parser, Subcommand};
use lowkey_folio::headless::{self, Headless};
use lowkey_folio::types::Viewport;
use lowkey_folio::{config, markup, output, site};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lowkey")]
#[command(about = "Single-page portfolio renderer and behavior harness")]
#[command(long_about = "\
Single-page portfolio renderer and behavior harness

The page is described by one TOML file: navigation, sections and blocks.
'render' turns it into an index.html whose interactive behavior (navbar,
accordions, lightbox, reveal animations, autoplaying clips) is provided by
the lowkey_folio wasm package, built separately with the `web` feature.

Section kinds and how their blocks render:

  projects   accordion entries; may hold a gallery and a video
  about      columns of an about grid
  skills     skill groups
  contact    contact cards

Behavior timings and thresholds come from an optional behavior.toml.
Run 'lowkey gen-config' to print a documented one.

Set RUST_LOG=lowkey_folio=debug to trace controller decisions.")]
#[command(version)]
struct Cli {
    /// Site content file
    #[arg(long, default_value = "site.toml", global = true)]
    site: PathBuf,

    /// Behavior config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the page into an output directory
    Render {
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Validate site content and behavior config without rendering
    Check {
        /// Print the parsed site as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock behavior.toml with all options documented
    GenConfig,
    /// Drive the page headlessly through a scripted interaction
    Replay {
        /// Script file with [[steps]] entries
        #[arg(long)]
        script: PathBuf,

        /// Viewport width in px
        #[arg(long, default_value_t = 1280.0)]
        width: f64,

        /// Viewport height in px
        #[arg(long, default_value_t = 800.0)]
        height: f64,

        /// Print snapshots as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render { output: out } => {
            let behavior = config::load_config(cli.config.as_deref())?;
            let content = site::load_site(&cli.site)?;
            let year = chrono::Local::now().year();
            let path = markup::render_site(&content, &behavior, year, &out)?;
            println!("==> Rendered {}", path.display());
        }
        Command::Check { json } => {
            config::load_config(cli.config.as_deref())?;
            let content = site::load_site(&cli.site)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&content)?);
            } else {
                println!("==> Checking {}", cli.site.display());
                output::print_check_output(&content, &cli.site);
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Replay {
            script,
            width,
            height,
            json,
        } => {
            let behavior = config::load_config(cli.config.as_deref())?;
            let content = site::load_site(&cli.site)?;
            let script = headless::load_script(&script)?;
            let mut page = Headless::new(&content, &behavior, Viewport::new(width, height));
            let frames = page.replay(&script)?;
            if json {
                let snapshots: Vec<_> = frames.iter().map(|(_, snapshot)| snapshot).collect();
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            } else {
                output::print_replay_output(&frames);
            }
        }
    }

    Ok(())
}
