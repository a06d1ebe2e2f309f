use crate::platform::{PlatformOps, INSTALL_MODE};
use std::fs::{Metadata, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub static UNIX_PLATFORM: Unix = Unix;

pub struct Unix;

const OWNER_EXECUTE: u32 = 0o100;

impl PlatformOps for Unix {
    fn home_dir(&self) -> Option<PathBuf> {
        // dirs falls back to the passwd entry when HOME is unset
        dirs::home_dir()
    }
    fn default_install_dir(&self, home: &Path) -> PathBuf {
        home.join(".attic").join("installs")
    }
    fn public_bin_dir(&self) -> PathBuf {
        PathBuf::from("/usr/local/bin")
    }
    fn is_executable(&self, _path: &Path, meta: &Metadata) -> bool {
        !meta.is_dir() && meta.permissions().mode() & OWNER_EXECUTE != 0
    }
    fn create_executable(&self, path: &Path) -> io::Result<fs_err::File> {
        use fs_err::os::unix::fs::OpenOptionsExt;
        let file = fs_err::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(INSTALL_MODE)
            .open(path)?;
        // the umask may have stripped group/other bits
        fs_err::set_permissions(path, Permissions::from_mode(INSTALL_MODE))?;
        Ok(file)
    }
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(original, link)
    }
}
