pub mod config;
pub mod dispatch;
pub mod install;
pub mod list;
pub mod reinstall;
pub mod uninstall;

use crate::config::AtticConfig;
use crate::error::AtticError;
use crate::verbose::Verbose;
use std::fmt;
use std::io::Write;

/// Everything a running command needs: settings, the verbose sink and stdout.
///
/// Output is best effort: a failed write to `out` (a closed pipe, say) is
/// dropped, and the command's status comes from the filesystem work alone.
pub struct Session<'a> {
    pub config: &'a AtticConfig,
    pub verbose: Verbose,
    pub out: &'a mut dyn Write,
}

impl Session<'_> {
    /// Progress line on stdout.
    pub fn say(&mut self, args: fmt::Arguments<'_>) {
        let _ = writeln!(self.out, "{args}");
    }

    /// Progress line on stdout, only with `--verbose`.
    pub fn trace(&mut self, args: fmt::Arguments<'_>) {
        self.verbose.print(&mut *self.out, args);
    }
}

/// Take exactly one positional argument or fail with a usage error.
pub(crate) fn single_arg<'a>(command: &str, args: &'a [String]) -> Result<&'a str, AtticError> {
    match args {
        [one] => Ok(one.as_str()),
        [] => Err(AtticError::Usage(format!("{command}: missing argument"))),
        _ => Err(AtticError::Usage(format!(
            "{command}: expected one argument, got {}",
            args.len()
        ))),
    }
}

pub(crate) fn no_args(command: &str, args: &[String]) -> Result<(), AtticError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(AtticError::Usage(format!(
            "{command}: unexpected argument '{}'",
            args[0]
        )))
    }
}
