//! Bundle the browser build described by a `pack.json`.
//!
//! Examples:
//!   trigon-pack
//!   trigon-pack --config crates/trigon_web/pack.json
//!   trigon-pack --entry static/main.js --out dist --json
//!
//! Flags override the matching descriptor fields; relative flag paths are
//! taken from the current directory. Without a descriptor file `--entry`
//! alone is enough, and the output lands in `dist` next to where the
//! descriptor would be.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use trigon_pack::descriptor::DESCRIPTOR_FILE;
use trigon_pack::{bundle, Overrides};

#[derive(Parser)]
#[command(name = "trigon-pack", version, about = "Package the entry script and static assets")]
struct Cli {
    #[arg(long, default_value = DESCRIPTOR_FILE, help = "Build descriptor to read")]
    config: PathBuf,
    #[arg(long, help = "Entry script (overrides `entry`)")]
    entry: Option<PathBuf>,
    #[arg(long, help = "Output directory (overrides `output.path`)")]
    out: Option<PathBuf>,
    #[arg(long, help = "Output script name (overrides `output.filename`)")]
    filename: Option<String>,
    #[arg(long, help = "Asset to copy; repeatable (replaces `copy`)")]
    copy: Vec<PathBuf>,
    #[arg(long, help = "Print the build report as JSON")]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let overrides = Overrides {
        entry: cli.entry,
        out: cli.out,
        filename: cli.filename,
        copy: cli.copy,
    };
    let desc = match overrides.load(&cli.config) {
        Ok(desc) => desc,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match bundle(&desc) {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        error!("failed to encode report: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
