/*
 * This module holds the `TreeSession`, the single record of which tree is currently open.
 * A session owns at most one parser (bound to one entry file) together with the last tree
 * that parser produced. Opening a file always replaces the parser; it never merges with
 * the previous tree. Saves and node toggles are forwarded to the existing parser, and are
 * silently ignored while no parser exists.
 */
use super::parser::{ParserError, ParserFactoryOperations, ParserOperations};
use super::tree::{NodeId, Tree};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
pub enum SessionError {
    // An empty or absent file path was given; callers treat this as a cancel.
    MissingInput,
    Parser(ParserError),
}

impl From<ParserError> for SessionError {
    fn from(err: ParserError) -> Self {
        SessionError::Parser(err)
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::MissingInput => write!(f, "No file path given"),
            SessionError::Parser(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Parser(e) => Some(e),
            SessionError::MissingInput => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

/*
 * Invariant: `current_tree` is only `Some` while `parser` is `Some`, and it always holds
 * the result of the most recent completed parser operation.
 */
pub struct TreeSession {
    parser_factory: Arc<dyn ParserFactoryOperations>,
    parser: Option<Box<dyn ParserOperations>>,
    current_tree: Option<Tree>,
}

impl TreeSession {
    pub fn new(parser_factory: Arc<dyn ParserFactoryOperations>) -> Self {
        TreeSession {
            parser_factory,
            parser: None,
            current_tree: None,
        }
    }

    /*
     * Binds a new parser to `path` and runs a full parse. Any previous parser and tree are
     * dropped before the new parser is constructed, so a failed open leaves the session
     * empty rather than showing the previous file's tree.
     */
    pub fn open_file(&mut self, path: &Path) -> Result<&Tree> {
        if path.as_os_str().is_empty() {
            return Err(SessionError::MissingInput);
        }

        if let Some(previous) = self.parser.take() {
            log::debug!(
                "TreeSession: Discarding session for {:?} to open {path:?}",
                previous.bound_file_path()
            );
        }
        self.current_tree = None;

        let mut parser = self.parser_factory.construct(path)?;
        let tree = parser.parse()?;
        log::info!(
            "TreeSession: Opened {path:?} with {} nodes.",
            tree.node_count()
        );
        self.parser = Some(parser);
        Ok(&*self.current_tree.insert(tree))
    }

    /*
     * Asks the parser to re-derive its tree after `path` was saved.
     * Returns `Ok(None)` when no session exists. On a parser error the previous tree is
     * kept, since no newer operation completed.
     */
    pub fn reparse_on_save(&mut self, path: &Path) -> Result<Option<&Tree>> {
        let Some(parser) = self.parser.as_mut() else {
            log::trace!("TreeSession: Save of {path:?} ignored, no session.");
            return Ok(None);
        };
        let tree = parser.update_tree(path)?;
        log::debug!("TreeSession: Tree refreshed after save of {path:?}.");
        Ok(Some(&*self.current_tree.insert(tree)))
    }

    // The parser's last known tree, without recomputation.
    pub fn get_current_tree(&mut self) -> Option<&Tree> {
        let parser = self.parser.as_ref()?;
        self.current_tree = parser.get_tree();
        self.current_tree.as_ref()
    }

    /*
     * Forwards an expand/collapse flag to the parser. Returns `true` when a node was
     * changed. A toggle without a session, or for an id that is not in the tree, is a
     * no-op.
     */
    pub fn toggle_node(&mut self, id: &NodeId, expanded: bool) -> bool {
        let Some(parser) = self.parser.as_mut() else {
            log::debug!("TreeSession: Toggle of node '{id}' ignored, no session.");
            return false;
        };
        if parser.toggle_node(id, expanded) {
            self.current_tree = parser.get_tree();
            true
        } else {
            log::warn!("TreeSession: Toggle of unknown node '{id}' ignored.");
            false
        }
    }

    pub fn get_bound_file_name(&self) -> Option<String> {
        self.parser.as_ref().map(|p| p.bound_file_name())
    }

    pub fn bound_file_path(&self) -> Option<&Path> {
        self.parser.as_ref().map(|p| p.bound_file_path())
    }

    #[cfg(test)]
    pub fn is_bound(&self) -> bool {
        self.parser.is_some()
    }
}
