//! Native demo: boot the in-process module and run one call.
//!
//! Examples:
//!   trigon draw
//!   trigon --width 640 --height 480 --out triangle.ppm draw
//!   trigon add 2 3

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use trigon::bootstrap::{boot, Call, TracingConsole};
use trigon::native::{NativeLoader, DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[derive(Parser)]
#[command(name = "trigon", version, about = "Draw the triangle scene in software")]
struct Cli {
    #[arg(long, default_value_t = DEFAULT_WIDTH, help = "Framebuffer width in pixels")]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_HEIGHT, help = "Framebuffer height in pixels")]
    height: u32,
    #[arg(long, help = "Write the drawn frame to this path as binary PPM")]
    out: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Construct the scene and draw it")]
    Draw,
    #[command(about = "Add two integers")]
    Add {
        #[arg(allow_negative_numbers = true)]
        a: i32,
        #[arg(allow_negative_numbers = true)]
        b: i32,
    },
}

impl From<&Command> for Call {
    fn from(command: &Command) -> Self {
        match *command {
            Command::Draw => Call::Draw,
            Command::Add { a, b } => Call::Add(a, b),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let loader = NativeLoader {
        width: cli.width,
        height: cli.height,
    };

    let booted = match pollster::block_on(boot(&loader, Call::from(&cli.command), &TracingConsole)) {
        Ok(booted) => booted,
        Err(_) => return ExitCode::FAILURE,
    };

    if let (Some(path), Some(frame)) = (cli.out.as_ref(), booted.module.last_frame()) {
        if let Err(e) = std::fs::write(path, frame.to_ppm()) {
            error!("failed to write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!("frame written to {}", path.display());
    }
    ExitCode::SUCCESS
}
