use crate::platform::PlatformOps;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

pub static WINDOWS_PLATFORM: Windows = Windows;

pub struct Windows;

const EXECUTABLE_EXTENSIONS: [&str; 4] = ["exe", "bat", "cmd", "com"];

impl PlatformOps for Windows {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
    fn default_install_dir(&self, home: &Path) -> PathBuf {
        home.join(".attic").join("installs")
    }
    fn public_bin_dir(&self) -> PathBuf {
        self.home_dir()
            .map(|h| h.join(".attic").join("bin"))
            .unwrap_or_else(|| PathBuf::from(r"C:\attic\bin"))
    }
    fn is_executable(&self, path: &Path, meta: &Metadata) -> bool {
        !meta.is_dir()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| EXECUTABLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
    }
    fn create_executable(&self, path: &Path) -> io::Result<fs_err::File> {
        fs_err::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
    }
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_file(original, link)
    }
}
