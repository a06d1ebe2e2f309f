use crate::command_handlers::Session;
use crate::error::AtticError;
use std::fmt::Write as _;
use thiserror::Error;

/// Run behavior of a command. Receives the positional arguments left after
/// resolution and flag parsing.
pub type RunFn = fn(&mut Session<'_>, &[String]) -> Result<(), AtticError>;

/// Index of a command inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(usize);

pub struct Command {
    pub name: &'static str,
    pub desc: &'static str,
    pub arg_desc: Option<&'static str>,
    pub run: Option<RunFn>,
    children: Vec<CommandId>,
    parent: Option<CommandId>,
}

impl Command {
    pub fn new(name: &'static str, desc: &'static str) -> Self {
        Self {
            name,
            desc,
            arg_desc: None,
            run: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn arg_desc(mut self, arg_desc: &'static str) -> Self {
        self.arg_desc = Some(arg_desc);
        self
    }

    pub fn run(mut self, run: RunFn) -> Self {
        self.run = Some(run);
        self
    }

    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("command '{parent}' already has a subcommand named '{name}'")]
    DuplicateCommand { parent: String, name: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no command given")]
    NoArguments,
    /// `command` is where the walk stopped; its help is what the user sees.
    #[error("Unknown command: {token}")]
    UnknownCommand { token: String, command: CommandId },
}

/// Deepest command matched by a prefix of argv.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub command: CommandId,
    /// Index into argv of the first token not consumed as a command name.
    pub index: usize,
}

/// Arena of commands. Parents own their children through the arena; the
/// parent link on each node is a plain index used for navigation.
pub struct CommandTree {
    nodes: Vec<Command>,
}

impl CommandTree {
    pub fn new(root: Command) -> Self {
        let mut root = root;
        root.parent = None;
        root.children.clear();
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    pub fn get(&self, id: CommandId) -> &Command {
        &self.nodes[id.0]
    }

    /// Append `children` to `parent`, wiring each child's parent link.
    ///
    /// All names are checked before anything is added, so a rejected batch
    /// leaves the tree unchanged.
    pub fn add_children(
        &mut self,
        parent: CommandId,
        children: Vec<Command>,
    ) -> Result<Vec<CommandId>, TreeError> {
        for (i, child) in children.iter().enumerate() {
            let taken = self.find_child(parent, child.name).is_some()
                || children[..i].iter().any(|c| c.name == child.name);
            if taken {
                return Err(TreeError::DuplicateCommand {
                    parent: self.path(parent),
                    name: child.name,
                });
            }
        }
        let mut ids = Vec::with_capacity(children.len());
        for mut child in children {
            let id = CommandId(self.nodes.len());
            child.parent = Some(parent);
            child.children.clear();
            self.nodes.push(child);
            self.nodes[parent.0].children.push(id);
            ids.push(id);
        }
        Ok(ids)
    }

    pub fn find_child(&self, parent: CommandId, name: &str) -> Option<CommandId> {
        self.get(parent)
            .children()
            .iter()
            .copied()
            .find(|&c| self.get(c).name == name)
    }

    /// Walk argv (skipping the program name) down the tree.
    ///
    /// Stops at the first token starting with `-`, or at the first token that
    /// names no child of a command that can run on its own.
    pub fn resolve(&self, argv: &[String]) -> Result<Resolution, ResolveError> {
        if argv.len() <= 1 {
            return Err(ResolveError::NoArguments);
        }
        let mut current = self.root();
        let mut index = 1;
        while let Some(token) = argv.get(index) {
            if token.starts_with('-') {
                break;
            }
            match self.find_child(current, token) {
                Some(child) => current = child,
                None if self.get(current).run.is_some() => break,
                None => {
                    return Err(ResolveError::UnknownCommand {
                        token: token.clone(),
                        command: current,
                    })
                }
            }
            index += 1;
        }
        tracing::debug!(command = %self.path(current), index, "resolved command");
        Ok(Resolution {
            command: current,
            index,
        })
    }

    /// Names from the root down to `id`, joined by spaces.
    pub fn path(&self, id: CommandId) -> String {
        let mut names = vec![self.get(id).name];
        let mut cursor = self.get(id).parent();
        while let Some(parent) = cursor {
            names.push(self.get(parent).name);
            cursor = self.get(parent).parent();
        }
        names.reverse();
        names.join(" ")
    }

    pub fn render_usage(&self, id: CommandId) -> String {
        let cmd = self.get(id);
        let path = self.path(id);
        let mut s = String::new();
        match (cmd.arg_desc, cmd.children.is_empty()) {
            (Some(arg_desc), _) => {
                let _ = write!(s, "Usage:\n  {path} {arg_desc}\n\n");
            }
            (None, false) => {
                let _ = write!(s, "Usage:\n  {path} [command]\n\n");
            }
            (None, true) => {
                let _ = write!(s, "Usage:\n  {path}\n\n");
            }
        }

        if !cmd.children.is_empty() {
            s.push_str("Available Commands:\n");
            for &child in &cmd.children {
                let c = self.get(child);
                let _ = writeln!(s, "  {:<11} {}", c.name, c.desc);
            }
            s.push('\n');
        }

        s.push_str("Flags:\n");
        let _ = writeln!(s, "  {:<15} Display help for {}", "-h, --help", cmd.name);
        let _ = writeln!(s, "  {:<15} Enable verbose logging", "-v, --verbose");
        if cmd.is_root() {
            let _ = writeln!(s, "  {:<15} Print the version of {}", "--version", cmd.name);
        }

        if !cmd.children.is_empty() {
            let _ = write!(
                s,
                "\nUse \"{path} [command] --help\" for more information about a command.\n"
            );
        }
        s
    }

    pub fn render_help(&self, id: CommandId) -> String {
        format!("{}\n\n{}", self.get(id).desc, self.render_usage(id))
    }
}
