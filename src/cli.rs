use crate::command_handlers::{config, install, list, reinstall, uninstall};
use crate::command_tree::{Command, CommandTree, TreeError};

pub const ROOT_NAME: &str = "attic";

/// Build the full command tree. Called once from `main`.
pub fn build_tree() -> Result<CommandTree, TreeError> {
    let mut tree = CommandTree::new(
        Command::new(
            ROOT_NAME,
            "attic is a small program to easily install executables globally.",
        )
        .arg_desc("[command]"),
    );
    let root = tree.root();
    let top = tree.add_children(
        root,
        vec![
            Command::new("install", "Install an executable globally")
                .arg_desc("<file>")
                .run(install::run),
            Command::new("reinstall", "Replace an installed executable with a new copy")
                .arg_desc("<file>")
                .run(reinstall::run),
            Command::new("uninstall", "Remove an installed executable and its link")
                .arg_desc("<name>")
                .run(uninstall::run),
            Command::new("list", "List installed executables").run(list::run),
            Command::new("config", "Manage attic configuration"),
        ],
    )?;
    tree.add_children(
        top[4],
        vec![
            Command::new("setup", "Create the install directory and config file")
                .run(config::run_setup),
            Command::new("show", "Print the effective configuration").run(config::run_show),
        ],
    )?;
    Ok(tree)
}
