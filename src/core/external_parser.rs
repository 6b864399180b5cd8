/*
 * Adapter that reaches the parser as a black box: an external command that prints the
 * tree for a file as JSON on stdout. The command line is configured once (program plus
 * arguments); the `{file}` placeholder is replaced by the bound file, or the file is
 * appended when no argument contains the placeholder.
 *
 * The adapter owns the last tree it produced. Node toggles are applied to that tree in
 * place, and `update_tree` re-runs the command and carries expanded flags over by node id,
 * which is the contract `ParserOperations` asks for.
 */
use super::parser::{ParserError, ParserFactoryOperations, ParserOperations, Result};
use super::tree::{NodeId, Tree};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ParserCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        ParserCommand {
            program: program.into(),
            args,
        }
    }

    /*
     * Builds a command from an argv-style list, where the first element is the program.
     * An empty list or an empty program name is rejected.
     */
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        match argv.split_first() {
            Some((program, args)) if !program.trim().is_empty() => {
                Ok(ParserCommand::new(program.clone(), args.to_vec()))
            }
            _ => Err(ParserError::EmptyCommand),
        }
    }

    pub(crate) fn to_command(&self, file_path: &Path) -> Command {
        let file_text = file_path.to_string_lossy();
        let mut command = Command::new(&self.program);
        let mut placeholder_used = false;
        for arg in &self.args {
            if arg.contains(FILE_PLACEHOLDER) {
                placeholder_used = true;
                command.arg(arg.replace(FILE_PLACEHOLDER, &file_text));
            } else {
                command.arg(arg);
            }
        }
        if !placeholder_used {
            command.arg(file_path);
        }
        command
    }
}

pub struct ExternalCommandParser {
    command: ParserCommand,
    bound_file: PathBuf,
    tree: Option<Tree>,
}

impl ExternalCommandParser {
    pub fn new(command: ParserCommand, bound_file: PathBuf) -> Self {
        log::debug!("ExternalCommandParser: Bound to {bound_file:?} using {command:?}");
        ExternalCommandParser {
            command,
            bound_file,
            tree: None,
        }
    }

    fn run(&self) -> Result<Tree> {
        log::trace!(
            "ExternalCommandParser: Running '{}' for {:?}",
            self.command.program,
            self.bound_file
        );
        let output = self.command.to_command(&self.bound_file).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            log::warn!(
                "ExternalCommandParser: Command failed for {:?} with {:?}: {stderr}",
                self.bound_file,
                output.status.code()
            );
            return Err(ParserError::CommandFailed {
                code: output.status.code(),
                stderr,
            });
        }
        let tree: Tree = serde_json::from_slice(&output.stdout)?;
        log::debug!(
            "ExternalCommandParser: Parsed {} nodes from {:?}",
            tree.node_count(),
            self.bound_file
        );
        Ok(tree)
    }
}

impl ParserOperations for ExternalCommandParser {
    fn parse(&mut self) -> Result<Tree> {
        let tree = self.run()?;
        self.tree = Some(tree.clone());
        Ok(tree)
    }

    fn update_tree(&mut self, file_path: &Path) -> Result<Tree> {
        let relevant = match &self.tree {
            None => return self.parse(),
            Some(previous) => file_path == self.bound_file || previous.references_file(file_path),
        };
        if !relevant {
            log::trace!(
                "ExternalCommandParser: {file_path:?} is not part of the tree for {:?}",
                self.bound_file
            );
            return self.tree.clone().ok_or(ParserError::NotParsed);
        }

        let mut fresh = self.run()?;
        if let Some(previous) = &self.tree {
            let carried = fresh.carry_over_expansion(previous);
            log::debug!("ExternalCommandParser: Carried over {carried} expansion flags.");
        }
        self.tree = Some(fresh.clone());
        Ok(fresh)
    }

    fn get_tree(&self) -> Option<Tree> {
        self.tree.clone()
    }

    fn toggle_node(&mut self, id: &NodeId, expanded: bool) -> bool {
        match &mut self.tree {
            Some(tree) => tree.set_expanded(id, expanded),
            None => false,
        }
    }

    fn bound_file_path(&self) -> &Path {
        &self.bound_file
    }
}

pub struct ExternalParserFactory {
    command: ParserCommand,
}

impl ExternalParserFactory {
    pub fn new(command: ParserCommand) -> Self {
        ExternalParserFactory { command }
    }
}

impl ParserFactoryOperations for ExternalParserFactory {
    fn construct(&self, file_path: &Path) -> Result<Box<dyn ParserOperations>> {
        if self.command.program.trim().is_empty() {
            return Err(ParserError::EmptyCommand);
        }
        Ok(Box::new(ExternalCommandParser::new(
            self.command.clone(),
            file_path.to_path_buf(),
        )))
    }
}
