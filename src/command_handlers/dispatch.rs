use crate::command_handlers::Session;
use crate::command_tree::{CommandTree, ResolveError};
use crate::config::AtticConfig;
use crate::error::{AtticError, Status};
use crate::flags;
use crate::verbose::Verbose;
use anyhow::Result;
use std::io::Write;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where dispatch writes: progress and version to `out`, everything else to `err`.
pub struct Console<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

/// Resolve `argv` against `tree`, parse its flags and run the command.
///
/// Configuration is only loaded once a run behavior is about to execute, so
/// help, version and usage errors never touch the filesystem.
pub fn dispatch(
    tree: &CommandTree,
    argv: &[String],
    console: &mut Console<'_>,
    load_config: impl FnOnce() -> Result<AtticConfig>,
) -> Status {
    let resolution = match tree.resolve(argv) {
        Ok(r) => r,
        Err(ResolveError::NoArguments) => {
            let _ = write!(console.err, "{}", tree.render_help(tree.root()));
            return Status::Usage;
        }
        Err(err) => {
            let ResolveError::UnknownCommand { command, .. } = &err else {
                return Status::Usage;
            };
            let _ = write!(console.err, "{err}\n\n{}", tree.render_help(*command));
            return Status::Usage;
        }
    };

    let parsed = match flags::parse(resolution, &argv[resolution.index..]) {
        Ok(p) => p,
        Err(e) => {
            let _ = write!(console.err, "{e}\n\n{}", tree.render_usage(resolution.command));
            return Status::Usage;
        }
    };

    if parsed.help {
        let _ = write!(console.err, "{}", tree.render_help(parsed.command));
        return Status::Success;
    }
    if parsed.version {
        let _ = writeln!(
            console.out,
            "{} version {VERSION}",
            tree.get(tree.root()).name
        );
        return Status::Success;
    }

    let command = tree.get(parsed.command);
    let Some(run) = command.run else {
        let _ = write!(console.err, "{}", tree.render_help(parsed.command));
        return Status::Usage;
    };

    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = writeln!(console.err, "ERROR: {e:#}");
            return Status::Failure;
        }
    };

    let result = {
        let mut session = Session {
            config: &config,
            verbose: Verbose::new(parsed.verbose),
            out: &mut *console.out,
        };
        run(&mut session, &parsed.args)
    };

    match result {
        Ok(()) => Status::Success,
        Err(AtticError::Usage(msg)) => {
            let _ = write!(console.err, "{msg}\n\n{}", tree.render_usage(parsed.command));
            Status::Usage
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let _ = writeln!(console.err, "{e}");
            Status::Failure
        }
    }
}
