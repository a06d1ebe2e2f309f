pub fn platform() -> &'static dyn PlatformOps {
    &ConcretePlatform
}

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// Permission bits given to every installed copy (rwxr-xr-x).
pub const INSTALL_MODE: u32 = 0o755;

pub trait PlatformOps: Sync + Send {
    fn home_dir(&self) -> Option<PathBuf>;
    /// Where installed copies live when nothing is configured.
    fn default_install_dir(&self, home: &Path) -> PathBuf;
    /// Directory on PATH that receives the symlinks.
    fn public_bin_dir(&self) -> PathBuf;
    fn is_executable(&self, path: &Path, meta: &Metadata) -> bool;
    /// Create `path` exclusively with [`INSTALL_MODE`]. Fails if it already exists.
    fn create_executable(&self, path: &Path) -> io::Result<fs_err::File>;
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()>;
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::UNIX_PLATFORM as ConcretePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WINDOWS_PLATFORM as ConcretePlatform;
