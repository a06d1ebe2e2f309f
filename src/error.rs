use crate::installer::InstallError;
use std::process::ExitCode;
use thiserror::Error;

/// Exit status for usage and validation errors.
pub const USAGE_EXIT_CODE: u8 = 2;

/// What a command's run behavior can fail with.
#[derive(Debug, Error)]
pub enum AtticError {
    /// Bad positional arguments; the dispatcher follows it with the command's usage.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error("ERROR: {0:#}")]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
    Usage,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failure => ExitCode::FAILURE,
            Status::Usage => ExitCode::from(USAGE_EXIT_CODE),
        }
    }
}
