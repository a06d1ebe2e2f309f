use super::{no_args, Session};
use crate::config::ConfigFile;
use crate::error::AtticError;
use anyhow::{Context, Result};
use fs_err as fs;

/// `attic config setup`: create the install directory and, if there is no
/// config file yet, write one recording the effective install location.
pub fn run_setup(session: &mut Session<'_>, args: &[String]) -> Result<(), AtticError> {
    no_args("config setup", args)?;
    setup(session)?;
    Ok(())
}

pub fn run_show(session: &mut Session<'_>, args: &[String]) -> Result<(), AtticError> {
    no_args("config show", args)?;
    let cfg = session.config;
    let file = cfg
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<none>".to_string());
    session.say(format_args!("config file: {file}"));
    session.say(format_args!(
        "install_location = {}",
        cfg.install_location.display()
    ));
    session.say(format_args!("bin_dir = {}", cfg.bin_dir.display()));
    Ok(())
}

fn setup(session: &mut Session<'_>) -> Result<()> {
    let cfg = session.config;
    if cfg.install_location.is_dir() {
        session.say(format_args!(
            "Install directory {} already exists",
            cfg.install_location.display()
        ));
    } else {
        fs::create_dir_all(&cfg.install_location).with_context(|| {
            format!(
                "creating install directory {}",
                cfg.install_location.display()
            )
        })?;
        session.say(format_args!(
            "Created install directory {}",
            cfg.install_location.display()
        ));
    }

    match &cfg.path {
        Some(path) if !path.exists() => {
            let file = ConfigFile {
                install_location: Some(cfg.install_location.clone()),
                bin_dir: None,
            };
            file.write(path)
                .with_context(|| format!("writing {}", path.display()))?;
            session.say(format_args!("Wrote {}", path.display()));
        }
        Some(path) => session.trace(format_args!("Keeping existing {}", path.display())),
        None => session.trace(format_args!("No config file location; nothing written")),
    }

    if !cfg.bin_dir.is_dir() {
        tracing::warn!(
            "bin directory {} does not exist; installs will fail to link",
            cfg.bin_dir.display()
        );
    }
    session.say(format_args!("Setup complete."));
    Ok(())
}
