/*
 * Defines the contract of the external parser that turns a source file into a `Tree`.
 * The parsing algorithm itself lives outside this crate; the session only talks to it
 * through `ParserOperations` (one parser bound to one entry file) and creates new
 * parsers through `ParserFactoryOperations`. Both traits allow mock implementations
 * in tests, in the same way the rest of `core` is injected.
 */
use super::tree::{NodeId, Tree, display_name_of};
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum ParserError {
    Io(io::Error),
    InvalidOutput(serde_json::Error),
    CommandFailed { code: Option<i32>, stderr: String },
    EmptyCommand,
    NotParsed,
}

impl From<io::Error> for ParserError {
    fn from(err: io::Error) -> Self {
        ParserError::Io(err)
    }
}

impl From<serde_json::Error> for ParserError {
    fn from(err: serde_json::Error) -> Self {
        ParserError::InvalidOutput(err)
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserError::Io(e) => write!(f, "Parser I/O error: {e}"),
            ParserError::InvalidOutput(e) => write!(f, "Parser produced an invalid tree: {e}"),
            ParserError::CommandFailed { code, stderr } => match code {
                Some(code) => write!(f, "Parser command exited with status {code}: {stderr}"),
                None => write!(f, "Parser command was terminated: {stderr}"),
            },
            ParserError::EmptyCommand => write!(f, "No parser command configured"),
            ParserError::NotParsed => write!(f, "Parser has not produced a tree yet"),
        }
    }
}

impl std::error::Error for ParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParserError::Io(e) => Some(e),
            ParserError::InvalidOutput(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;

/*
 * A parse session bound to one entry file.
 * `update_tree` must keep the expanded flag of nodes whose id survives the
 * re-derivation; the session relies on this and does not merge trees itself.
 */
pub trait ParserOperations: Send {
    // Full parse of the bound file. Replaces the parser's tree.
    fn parse(&mut self) -> Result<Tree>;

    /*
     * Re-derives the tree after `file_path` was saved. The parser decides whether the
     * path is relevant to its tree; when it is not, the current tree is returned as is.
     */
    fn update_tree(&mut self, file_path: &Path) -> Result<Tree>;

    // Last computed tree, without recomputation. `None` before the first parse.
    fn get_tree(&self) -> Option<Tree>;

    // Flips one node's expanded flag in place. Returns `false` if the id is unknown.
    fn toggle_node(&mut self, id: &NodeId, expanded: bool) -> bool;

    fn bound_file_path(&self) -> &Path;

    fn bound_file_name(&self) -> String {
        display_name_of(self.bound_file_path())
    }
}

pub trait ParserFactoryOperations: Send + Sync {
    // Binds a new parser to `file_path`. Does not parse yet.
    fn construct(&self, file_path: &Path) -> Result<Box<dyn ParserOperations>>;
}
