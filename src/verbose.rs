use std::fmt;
use std::io::Write;

/// Sink for `--verbose` progress lines.
///
/// Built once from the parsed `-v` flag and handed to the running command;
/// there is no process-wide toggle. Every line is also emitted as a `debug`
/// trace event, so `ATTIC_LOG=debug` shows it on stderr without the flag.
#[derive(Debug, Default, Clone, Copy)]
pub struct Verbose {
    enabled: bool,
}

impl Verbose {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn print(&self, out: &mut dyn Write, args: fmt::Arguments<'_>) {
        tracing::debug!("{args}");
        if self.is_enabled() {
            let _ = writeln!(out, "{args}");
        }
    }
}
