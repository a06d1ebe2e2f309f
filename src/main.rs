mod cli;
mod command_handlers;
mod command_tree;
mod config;
mod error;
mod flags;
mod installer;
mod ops;
mod platform;
mod verbose;

use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::command_handlers::dispatch::{dispatch, Console};
use crate::config::AtticConfig;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ATTIC_LOG").unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let tree = match cli::build_tree() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("fatal: {e}");
            return ExitCode::FAILURE;
        }
    };

    let argv: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let (stdout, stderr) = (io::stdout(), io::stderr());
    let (mut out, mut err) = (stdout.lock(), stderr.lock());
    let mut console = Console {
        out: &mut out,
        err: &mut err,
    };
    dispatch(&tree, &argv, &mut console, AtticConfig::load).into()
}
