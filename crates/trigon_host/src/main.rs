//! Load a compiled module from disk and run one call against it.
//!
//! Examples:
//!   trigon-host add 2 3
//!   trigon-host --module build/scene.wasm draw
//!   trigon-host --trap-unknown-imports add 2 3
//!
//! The module path defaults to the web crate's `wasm-pack` output,
//! `crates/trigon_web/dist/pkg/trigon_web_bg.wasm`; override with `--module`
//! or `TRIGON_MODULE`. That build supports `add` (with
//! `--trap-unknown-imports`). `draw` needs a module exporting the raw
//! `scene_new: () -> i32` and `scene_draw: (i32) -> ()` pair; other export
//! types are reported when the module loads.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use trigon::bootstrap::{boot, Call, TracingConsole};
use trigon_host::{HostOptions, WasmLoader, DEFAULT_MODULE_PATH};

#[derive(Parser)]
#[command(name = "trigon-host", version, about = "Run a compiled trigon module natively")]
struct Cli {
    #[arg(
        long,
        env = "TRIGON_MODULE",
        default_value = DEFAULT_MODULE_PATH,
        help = "Path to the .wasm module"
    )]
    module: PathBuf,
    #[arg(long, help = "Stub unresolved imports with traps instead of failing to load")]
    trap_unknown_imports: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Call scene_new, then scene_draw on the result")]
    Draw,
    #[command(about = "Call add(a, b)")]
    Add {
        #[arg(allow_negative_numbers = true)]
        a: i32,
        #[arg(allow_negative_numbers = true)]
        b: i32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let call = match cli.command {
        Command::Draw => Call::Draw,
        Command::Add { a, b } => Call::Add(a, b),
    };
    let loader = WasmLoader::new(cli.module).with_options(HostOptions {
        trap_unknown_imports: cli.trap_unknown_imports,
    });

    match boot(&loader, call, &TracingConsole).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
