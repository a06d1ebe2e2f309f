use crate::command_handlers::Session;
use crate::ops::{self, CopyError};
use crate::platform::platform;
use chrono::{DateTime, Local};
use fs_err as fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("ERROR: File does not exist!")]
    SourceMissing,
    #[error("ERROR: Not a valid executable. Cannot install.")]
    NotExecutable,
    #[error("ERROR: {} does not exist!\nRun `attic config setup` to set it up", .dir.display())]
    InstallDirMissing { dir: PathBuf },
    #[error("ERROR: {} does not name a file", .path.display())]
    InvalidFileName { path: PathBuf },
    #[error("ERROR: Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: CopyError,
    },
    #[error("Error occurred while symlinking {}:\n{source}", .link.display())]
    Symlink { link: PathBuf, source: io::Error },
    #[error("ERROR: {name} is not installed")]
    NotInstalled { name: String },
    #[error("ERROR: {} is not managed by attic", .path.display())]
    NotManaged { path: PathBuf },
    #[error("ERROR: {0}")]
    Io(#[from] io::Error),
}

/// The file to install plus the paths derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub source: PathBuf,
    /// Copy inside the install directory, under the source's base name.
    pub destination: PathBuf,
    /// Symlink inside the public bin directory.
    pub link: PathBuf,
}

impl InstallRequest {
    pub fn new(file: &str, install_dir: &Path, bin_dir: &Path) -> Result<Self, InstallError> {
        let source = PathBuf::from(file);
        let invalid = || InstallError::InvalidFileName {
            path: source.clone(),
        };
        let destination = ops::join_base_name(install_dir, &source).ok_or_else(invalid)?;
        let link = ops::join_base_name(bin_dir, &source).ok_or_else(invalid)?;
        Ok(Self {
            source,
            destination,
            link,
        })
    }
}

/// Install `file`: check it, copy it into the install directory, link it
/// into the bin directory.
///
/// Each step runs only if the previous one succeeded. Nothing is undone on
/// failure: a copy stays in place even when the symlink step fails.
pub fn install(session: &mut Session<'_>, file: &str) -> Result<(), InstallError> {
    let request = prepare(session, file)?;
    place(session, file, request)
}

/// Steps that only read the filesystem: source exists, is executable, and
/// the install directory is there.
fn prepare(session: &mut Session<'_>, file: &str) -> Result<InstallRequest, InstallError> {
    let config = session.config;
    let install_dir = &config.install_location;
    let bin_dir = &config.bin_dir;
    let source = Path::new(file);

    session.say(format_args!("Installing {file} ..."));
    session.trace(format_args!("Checking {file}"));

    let meta = std::fs::metadata(source).map_err(|e| {
        tracing::debug!(error = %e, "stat {file} failed");
        InstallError::SourceMissing
    })?;

    session.trace(format_args!("Checking if file is executable"));
    if !platform().is_executable(source, &meta) {
        return Err(InstallError::NotExecutable);
    }

    session.trace(format_args!("Checking if install directory exists"));
    if !ops::dir_exists(install_dir) {
        return Err(InstallError::InstallDirMissing {
            dir: install_dir.clone(),
        });
    }
    session.trace(format_args!("Install directory exists"));

    InstallRequest::new(file, install_dir, bin_dir)
}

/// Copy and link a request that [`prepare`] accepted.
fn place(session: &mut Session<'_>, file: &str, request: InstallRequest) -> Result<(), InstallError> {
    let config = session.config;
    let install_dir = &config.install_location;
    let bin_dir = &config.bin_dir;

    session.say(format_args!("Moving {file} to {}", install_dir.display()));
    if let Err(source) = ops::copy_file(&request.source, &request.destination) {
        if source.io_kind() == io::ErrorKind::AlreadyExists {
            session.trace(format_args!(
                "{} is already installed; use `attic reinstall` to replace it",
                request.destination.display()
            ));
        }
        return Err(InstallError::Copy {
            from: request.source,
            to: request.destination,
            source,
        });
    }

    session.say(format_args!("Symlinking {file} to {}", bin_dir.display()));
    platform()
        .symlink(&request.destination, &request.link)
        .map_err(|source| InstallError::Symlink {
            link: request.link.clone(),
            source,
        })?;

    session.say(format_args!("Successfully installed {file}!"));
    check_path(&request);
    Ok(())
}

/// Warn when the installed name does not resolve to our link on PATH.
fn check_path(request: &InstallRequest) {
    let Some(name) = request.link.file_name() else {
        return;
    };
    match which::which(name) {
        Ok(found) if found == request.link => {}
        Ok(found) => tracing::warn!(
            "{} is shadowed on PATH by {}",
            request.link.display(),
            found.display()
        ),
        Err(_) => tracing::warn!(
            "{} is not on PATH; {} will not be found by the shell",
            request
                .link
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            name.to_string_lossy()
        ),
    }
}

/// Remove the link and the stored copy for `name` (a base name or a path).
///
/// The link is checked before anything is deleted: a file at the link
/// location that is not our symlink aborts the uninstall untouched.
pub fn uninstall(session: &mut Session<'_>, name: &str) -> Result<(), InstallError> {
    let request = InstallRequest::new(
        name,
        &session.config.install_location,
        &session.config.bin_dir,
    )?;
    let base = request
        .destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());

    session.say(format_args!("Uninstalling {base} ..."));

    let link_meta = std::fs::symlink_metadata(&request.link).ok();
    let has_copy = std::fs::symlink_metadata(&request.destination).is_ok();
    if link_meta.is_none() && !has_copy {
        return Err(InstallError::NotInstalled { name: base });
    }

    if let Some(meta) = link_meta {
        let ours = meta.file_type().is_symlink()
            && fs::read_link(&request.link)? == request.destination;
        if !ours {
            return Err(InstallError::NotManaged { path: request.link });
        }
        session.say(format_args!("Removing {}", request.link.display()));
        fs::remove_file(&request.link)?;
    } else {
        session.trace(format_args!("No link at {}", request.link.display()));
    }

    if has_copy {
        session.say(format_args!("Removing {}", request.destination.display()));
        fs::remove_file(&request.destination)?;
    }

    session.say(format_args!("Successfully uninstalled {base}!"));
    Ok(())
}

/// Uninstall whatever is installed under `file`'s base name, then install `file`.
///
/// The new source is checked before the old copy is removed, so a reinstall
/// that cannot proceed leaves the existing install alone.
pub fn reinstall(session: &mut Session<'_>, file: &str) -> Result<(), InstallError> {
    let request = prepare(session, file)?;
    match uninstall(session, file) {
        Ok(()) => {}
        Err(InstallError::NotInstalled { name }) => {
            session.trace(format_args!("{name} was not installed, skipping removal"));
        }
        Err(e) => return Err(e),
    }
    place(session, file, request)
}

/// One file in the install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledEntry {
    pub name: String,
    pub modified: Option<DateTime<Local>>,
    pub linked: bool,
}

pub fn installed(install_dir: &Path, bin_dir: &Path) -> Result<Vec<InstalledEntry>, InstallError> {
    if !ops::dir_exists(install_dir) {
        return Err(InstallError::InstallDirMissing {
            dir: install_dir.to_path_buf(),
        });
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(install_dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name();
        let link = bin_dir.join(&name);
        let linked = ops::is_symlink(&link)
            && std::fs::read_link(&link).map(|t| t == entry.path()).unwrap_or(false);
        entries.push(InstalledEntry {
            name: name.to_string_lossy().into_owned(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
            linked,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

pub fn list(session: &mut Session<'_>) -> Result<(), InstallError> {
    let entries = installed(&session.config.install_location, &session.config.bin_dir)?;
    if entries.is_empty() {
        session.say(format_args!("No executables installed"));
        return Ok(());
    }
    for e in entries {
        let modified = e
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let state = if e.linked { "linked" } else { "not linked" };
        session.say(format_args!("{:<24} {modified}  {state}", e.name));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::AtticConfig;
    use crate::verbose::Verbose;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    struct Fixture {
        root: TempDir,
        config: AtticConfig,
    }

    impl Fixture {
        /// Install and bin directories exist; nothing is installed.
        fn new() -> Self {
            let root = tempfile::tempdir().unwrap();
            let config = AtticConfig {
                install_location: root.path().join("installs"),
                bin_dir: root.path().join("bin"),
                path: None,
            };
            std::fs::create_dir(&config.install_location).unwrap();
            std::fs::create_dir(&config.bin_dir).unwrap();
            Self { root, config }
        }

        fn source(&self, name: &str, contents: &[u8], mode: u32) -> String {
            let dir = self.root.path().join("build");
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join(name);
            std::fs::write(&path, contents).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn run<T>(
            &self,
            verbose: bool,
            f: impl FnOnce(&mut Session<'_>) -> Result<T, InstallError>,
        ) -> (Result<T, InstallError>, String) {
            let mut out = Vec::new();
            let result = {
                let mut session = Session {
                    config: &self.config,
                    verbose: Verbose::new(verbose),
                    out: &mut out,
                };
                f(&mut session)
            };
            (result, String::from_utf8(out).unwrap())
        }

        fn installed_copy(&self, name: &str) -> PathBuf {
            self.config.install_location.join(name)
        }

        fn link(&self, name: &str) -> PathBuf {
            self.config.bin_dir.join(name)
        }

        fn dir_is_empty(dir: &Path) -> bool {
            std::fs::read_dir(dir).unwrap().next().is_none()
        }

        fn untouched(&self) -> bool {
            Self::dir_is_empty(&self.config.install_location) && Self::dir_is_empty(&self.config.bin_dir)
        }
    }

    #[test]
    fn missing_source_fails_first() {
        let fx = Fixture::new();
        let missing = fx.root.path().join("nope").to_string_lossy().into_owned();
        let (res, out) = fx.run(false, |s| install(s, &missing));
        let err = res.unwrap_err();
        assert!(matches!(err, InstallError::SourceMissing));
        assert!(err.to_string().contains("File does not exist"));
        assert_eq!(out, format!("Installing {missing} ...\n"));
        assert!(fx.untouched());
    }

    #[test]
    fn non_executable_source_leaves_filesystem_untouched() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"#!/bin/sh\n", 0o644);
        let (res, _) = fx.run(false, |s| install(s, &src));
        let err = res.unwrap_err();
        assert!(matches!(err, InstallError::NotExecutable));
        assert!(err.to_string().contains("Not a valid executable"));
        assert!(fx.untouched());
    }

    #[test]
    fn directory_is_not_an_executable() {
        let fx = Fixture::new();
        let dir = fx.root.path().join("somedir");
        std::fs::create_dir(&dir).unwrap();
        let (res, _) = fx.run(false, |s| install(s, &dir.to_string_lossy()));
        assert!(matches!(res.unwrap_err(), InstallError::NotExecutable));
        assert!(fx.untouched());
    }

    #[test]
    fn missing_install_dir_suggests_setup() {
        let mut fx = Fixture::new();
        fx.config.install_location = fx.root.path().join("absent");
        let src = fx.source("tool", b"bin", 0o755);
        let (res, _) = fx.run(false, |s| install(s, &src));
        let msg = res.unwrap_err().to_string();
        assert!(msg.contains(&*fx.config.install_location.to_string_lossy()));
        assert!(msg.contains("does not exist"));
        assert!(msg.contains("attic config setup"));
        assert!(!fx.config.install_location.exists());
        assert!(Fixture::dir_is_empty(&fx.config.bin_dir));
    }

    #[test]
    fn successful_install_copies_and_links() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"\x7fELF fake binary", 0o700);
        let (res, out) = fx.run(false, |s| install(s, &src));
        res.unwrap();

        let copy = fx.installed_copy("tool");
        assert_eq!(std::fs::read(&copy).unwrap(), b"\x7fELF fake binary");
        assert_eq!(std::fs::metadata(&copy).unwrap().permissions().mode() & 0o777, 0o755);
        assert_eq!(std::fs::read_link(fx.link("tool")).unwrap(), copy);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                format!("Installing {src} ..."),
                format!("Moving {src} to {}", fx.config.install_location.display()),
                format!("Symlinking {src} to {}", fx.config.bin_dir.display()),
                format!("Successfully installed {src}!"),
            ]
        );
    }

    #[test]
    fn verbose_adds_check_lines() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"x", 0o755);
        let (res, out) = fx.run(true, |s| install(s, &src));
        res.unwrap();
        assert!(out.contains(&format!("Checking {src}\n")));
        assert!(out.contains("Checking if file is executable\n"));
        assert!(out.contains("Checking if install directory exists\n"));
        assert!(out.contains("Install directory exists\n"));
    }

    #[test]
    fn second_install_fails_at_copy_without_touching_destination() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"v1", 0o755);
        fx.run(false, |s| install(s, &src)).0.unwrap();
        std::fs::write(&src, b"v2").unwrap();

        for _ in 0..2 {
            let (res, out) = fx.run(false, |s| install(s, &src));
            match res.unwrap_err() {
                InstallError::Copy { source, .. } => {
                    assert!(matches!(source, CopyError::Create(_)));
                    assert_eq!(source.io_kind(), io::ErrorKind::AlreadyExists);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!out.contains("Symlinking"));
            assert_eq!(std::fs::read(fx.installed_copy("tool")).unwrap(), b"v1");
        }
    }

    #[test]
    fn symlink_failure_keeps_the_copy() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"bin", 0o755);
        std::fs::write(fx.link("tool"), b"someone else's").unwrap();

        let (res, out) = fx.run(false, |s| install(s, &src));
        let err = res.unwrap_err();
        assert!(matches!(err, InstallError::Symlink { .. }));
        assert!(err.to_string().starts_with("Error occurred while symlinking "));
        assert!(out.contains("Symlinking"));
        assert!(!out.contains("Successfully"));
        assert!(fx.installed_copy("tool").exists());
    }

    #[test]
    fn uninstall_removes_link_and_copy() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"bin", 0o755);
        fx.run(false, |s| install(s, &src)).0.unwrap();

        let (res, out) = fx.run(false, |s| uninstall(s, "tool"));
        res.unwrap();
        assert!(fx.untouched());
        assert!(out.ends_with("Successfully uninstalled tool!\n"));
    }

    #[test]
    fn uninstall_unknown_name() {
        let fx = Fixture::new();
        let (res, _) = fx.run(false, |s| uninstall(s, "ghost"));
        assert!(matches!(res.unwrap_err(), InstallError::NotInstalled { name } if name == "ghost"));
    }

    #[test]
    fn uninstall_refuses_foreign_file_at_link() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"bin", 0o755);
        std::fs::write(fx.link("tool"), b"foreign").unwrap();
        let _ = fx.run(false, |s| install(s, &src));

        let (res, _) = fx.run(false, |s| uninstall(s, "tool"));
        assert!(matches!(res.unwrap_err(), InstallError::NotManaged { .. }));
        assert!(fx.link("tool").exists());
        assert!(fx.installed_copy("tool").exists());
    }

    #[test]
    fn uninstall_without_link_removes_copy() {
        let fx = Fixture::new();
        std::fs::write(fx.installed_copy("tool"), b"orphan").unwrap();
        let (res, _) = fx.run(false, |s| uninstall(s, "tool"));
        res.unwrap();
        assert!(fx.untouched());
    }

    #[test]
    fn reinstall_replaces_copy() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"v1", 0o755);
        fx.run(false, |s| install(s, &src)).0.unwrap();
        std::fs::write(&src, b"v2").unwrap();

        let (res, _) = fx.run(false, |s| reinstall(s, &src));
        res.unwrap();
        assert_eq!(std::fs::read(fx.installed_copy("tool")).unwrap(), b"v2");
        assert_eq!(std::fs::read_link(fx.link("tool")).unwrap(), fx.installed_copy("tool"));
    }

    #[test]
    fn failed_reinstall_keeps_existing_install() {
        let fx = Fixture::new();
        let src = fx.source("tool", b"v1", 0o755);
        fx.run(false, |s| install(s, &src)).0.unwrap();

        std::fs::remove_file(&src).unwrap();
        let (res, out) = fx.run(false, |s| reinstall(s, &src));
        assert!(matches!(res.unwrap_err(), InstallError::SourceMissing));
        assert!(!out.contains("Removing"));
        assert_eq!(std::fs::read(fx.installed_copy("tool")).unwrap(), b"v1");
        assert_eq!(std::fs::read_link(fx.link("tool")).unwrap(), fx.installed_copy("tool"));

        fx.source("tool", b"v2", 0o644);
        let (res, _) = fx.run(false, |s| reinstall(s, &src));
        assert!(matches!(res.unwrap_err(), InstallError::NotExecutable));
        assert_eq!(std::fs::read(fx.installed_copy("tool")).unwrap(), b"v1");
        assert!(fx.link("tool").exists());
    }

    #[test]
    fn unwritable_stdout_does_not_change_the_outcome() {
        struct Closed;
        impl io::Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
        }

        let fx = Fixture::new();
        let src = fx.source("tool", b"bin", 0o755);
        let mut out = Closed;
        let mut session = Session {
            config: &fx.config,
            verbose: Verbose::new(true),
            out: &mut out,
        };
        install(&mut session, &src).unwrap();
        assert_eq!(std::fs::read_link(fx.link("tool")).unwrap(), fx.installed_copy("tool"));
    }

    #[test]
    fn reinstall_of_new_file_just_installs() {
        let fx = Fixture::new();
        let src = fx.source("fresh", b"x", 0o755);
        let (res, out) = fx.run(false, |s| reinstall(s, &src));
        res.unwrap();
        assert!(out.contains("Successfully installed"));
        assert!(fx.installed_copy("fresh").exists());
    }

    #[test]
    fn listing_reports_link_state() {
        let fx = Fixture::new();
        let a = fx.source("alpha", b"a", 0o755);
        fx.run(false, |s| install(s, &a)).0.unwrap();
        std::fs::write(fx.installed_copy("beta"), b"b").unwrap();
        std::fs::create_dir(fx.installed_copy("subdir")).unwrap();

        let entries = installed(&fx.config.install_location, &fx.config.bin_dir).unwrap();
        let summary: Vec<(&str, bool)> = entries.iter().map(|e| (e.name.as_str(), e.linked)).collect();
        assert_eq!(summary, vec![("alpha", true), ("beta", false)]);
        assert!(entries.iter().all(|e| e.modified.is_some()));

        let (res, out) = fx.run(false, list);
        res.unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alpha") && lines[0].ends_with("  linked"));
        assert!(lines[1].starts_with("beta") && lines[1].ends_with("not linked"));
    }

    #[test]
    fn empty_listing() {
        let fx = Fixture::new();
        let (res, out) = fx.run(false, list);
        res.unwrap();
        assert_eq!(out, "No executables installed\n");
    }

    #[test]
    fn request_paths_use_base_name() {
        let req = InstallRequest::new("./target/release/tool", Path::new("/i"), Path::new("/b")).unwrap();
        assert_eq!(req.destination, PathBuf::from("/i/tool"));
        assert_eq!(req.link, PathBuf::from("/b/tool"));
        assert!(matches!(
            InstallRequest::new("..", Path::new("/i"), Path::new("/b")),
            Err(InstallError::InvalidFileName { .. })
        ));
    }
}
