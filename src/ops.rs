use crate::platform::platform;
use fs_err as fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUFFER_SIZE: usize = 8192;

/// Failure of [`copy_file`], split by which side of the transfer broke.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("could not create destination: {0}")]
    Create(io::Error),
    #[error("read error: {0}")]
    Read(io::Error),
    #[error("write error: {0}")]
    Write(io::Error),
}

impl CopyError {
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            CopyError::Create(e) | CopyError::Read(e) | CopyError::Write(e) => e.kind(),
        }
    }
}

/// True when `path` resolves to a file or directory.
pub fn file_exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}

pub fn dir_exists(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// True when `path` is a symlink, whether or not its target exists.
pub fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Join `name` onto `dir`, keeping only the final component of `name`.
pub fn join_base_name(dir: &Path, name: &Path) -> Option<PathBuf> {
    name.file_name().map(|base| dir.join(base))
}

/// Copy `src` to a newly created executable at `dst`.
///
/// The destination is created exclusively: an existing file is never
/// overwritten. Both handles are dropped before any error is returned. A
/// failed read or write leaves the partial destination in place.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, CopyError> {
    let mut reader = fs::File::open(src).map_err(CopyError::Read)?;
    let mut writer = platform()
        .create_executable(dst)
        .map_err(CopyError::Create)?;
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buffer[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
    writer.flush().map_err(CopyError::Write)?;
    tracing::debug!(bytes = total, "copied {} to {}", src.display(), dst.display());
    Ok(total)
}
