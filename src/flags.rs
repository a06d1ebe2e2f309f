use crate::command_tree::{CommandId, Resolution};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction};
use thiserror::Error;

/// argv resolved against the command tree, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvocation {
    pub command: CommandId,
    pub args: Vec<String>,
    pub verbose: bool,
    pub help: bool,
    pub version: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("Unknown flag: {token}")]
    UnknownFlag { token: String },
}

// Help and version text come from the command tree, so clap's own are off.
fn flag_parser() -> clap::Command {
    clap::Command::new("attic")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .args_override_self(true)
        .arg(Arg::new("help").short('h').long("help").action(ArgAction::SetTrue))
        .arg(Arg::new("verbose").short('v').long("verbose").action(ArgAction::SetTrue))
        .arg(Arg::new("version").long("version").action(ArgAction::SetTrue))
        .arg(Arg::new("args").action(ArgAction::Append).value_name("ARGS"))
}

/// Parse the flags and positionals that follow the resolved command.
///
/// `rest` starts at `resolution.index`. Flags and positionals may be mixed;
/// everything after `--` is positional. Flags take effect left to right:
/// the first `-h`/`--help` or `--version` ends the invocation, so only one of
/// the two is ever set, and tokens after it are not checked.
pub fn parse(resolution: Resolution, rest: &[String]) -> Result<ParsedInvocation, FlagError> {
    let terminator = first_terminator(rest);
    let matches = match flag_parser().try_get_matches_from(rest) {
        Ok(m) => m,
        Err(e) => {
            let Some(terminator) = terminator else {
                return Err(unknown_flag(&e, rest));
            };
            tracing::debug!(?terminator, "ignoring tokens after terminating flag");
            return Ok(ParsedInvocation {
                command: resolution.command,
                args: Vec::new(),
                verbose: false,
                help: terminator == Terminator::Help,
                version: terminator == Terminator::Version,
            });
        }
    };
    let args = matches
        .get_many::<String>("args")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();
    Ok(ParsedInvocation {
        command: resolution.command,
        args,
        verbose: matches.get_flag("verbose"),
        help: terminator == Some(Terminator::Help),
        version: terminator == Some(Terminator::Version),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Help,
    Version,
}

/// The first help or version flag in argv order, unless an unrecognized
/// flag or `--` comes before it.
fn first_terminator(rest: &[String]) -> Option<Terminator> {
    for token in rest {
        match token.as_str() {
            "--" => return None,
            "--help" => return Some(Terminator::Help),
            "--version" => return Some(Terminator::Version),
            "--verbose" => {}
            long if long.starts_with("--") => return None,
            short if short.len() > 1 && short.starts_with('-') => {
                for c in short[1..].chars() {
                    match c {
                        'h' => return Some(Terminator::Help),
                        'v' => {}
                        _ => return None,
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn unknown_flag(err: &clap::Error, rest: &[String]) -> FlagError {
    tracing::debug!(kind = ?err.kind(), "flag parsing failed");
    let from_context = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(s)) => Some(s.clone()),
        _ => None,
    };
    let token = from_context
        .or_else(|| {
            if err.kind() == ErrorKind::UnknownArgument {
                rest.iter().find(|t| t.starts_with('-')).cloned()
            } else {
                None
            }
        })
        .unwrap_or_else(|| rest.join(" "));
    FlagError::UnknownFlag { token }
}
