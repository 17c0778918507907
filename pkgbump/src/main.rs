use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use pkgbump::cli::Args;
use pkgbump::{RunOutcome, TableRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = args.to_config().context("Invalid configuration")?;

    let progress_bar = if args.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("=>-"),
        );
        bar
    };

    let bar = progress_bar.clone();
    let outcome = pkgbump::run_with_progress(&config, move |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    })
    .await;
    progress_bar.finish_and_clear();

    let outcome = outcome
        .with_context(|| format!("Failed to update {}", config.manifest_path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_report(&outcome, !args.no_color);
    }

    Ok(())
}

/// Default to warnings only; each -v raises the level for pkgbump itself.
/// `RUST_LOG` takes precedence.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,pkgbump={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_report(outcome: &RunOutcome, show_colors: bool) {
    TableRenderer::new(show_colors).render(&outcome.rows);

    if outcome.written {
        println!();
        println!("Run {} to install the new versions.", "npm install".cyan());
    } else if outcome.has_updates && outcome.dry_run {
        println!();
        println!("{}", "Dry run: package.json was not modified.".dimmed());
    }
}
