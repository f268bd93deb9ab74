//! README card generator.
//!
//! Reads its settings from the environment, queries the GitHub GraphQL API
//! and writes SVG cards plus JSON/Markdown summaries for the profile README.

mod generator;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sysadmin_core::cards_config::CardsConfig;

use crate::generator::Generator;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// Generate GitHub stats, language and streak cards.
#[derive(Parser, Debug)]
#[command(
    name = "readme-cards",
    version,
    about = "Generate README SVG cards from the GitHub GraphQL API"
)]
struct Args {
    /// Directory the cards and summaries are written to.
    #[arg(long, default_value = "assets/readme-cards")]
    out_dir: PathBuf,

    /// NuGet spec whose version is shown on the stats card.
    #[arg(long, default_value = "sysadmin-prosuite.nuspec")]
    nuspec: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    // stdout is reserved for the OK lines.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = CardsConfig::from_env()?;
    let generator = Generator::new(config, args.out_dir, args.nuspec)?;
    let written = generator.run().await?;

    let paths = generator.paths();
    println!(
        "OK: wrote {}, {}, {}",
        paths.stats_svg.display(),
        paths.languages_svg.display(),
        paths.streak_svg.display()
    );
    println!(
        "OK: wrote {}, {}",
        paths.per_repo_json.display(),
        paths.release_json.display()
    );
    if written.markdown {
        println!("OK: wrote {}", paths.per_repo_md.display());
    }
    if written.local_scan {
        println!(
            "INFO: LOCAL_SCAN enabled -> repo-local language sizes written to {}",
            paths.per_repo_json.display()
        );
    }
    Ok(())
}
