/*
 * This module consolidates the core, platform-agnostic logic of the application:
 * the tree model, the parser contract (`ParserOperations`, `ParserFactoryOperations`)
 * with its external-command adapter, the `TreeSession` that owns the open tree, and
 * the settings store abstraction (`SettingsStoreOperations`).
 */
pub mod external_parser;
pub mod parser;
pub mod settings;
pub mod tree;
pub mod tree_session;

// Re-export key structures
pub use tree::{NodeId, Tree, TreeNode};

pub use parser::{ParserError, ParserFactoryOperations, ParserOperations};

pub use external_parser::{ExternalParserFactory, ParserCommand};

pub use tree_session::{SessionError, TreeSession};

pub use settings::{
    CoreSettingsStore, SETTINGS_NAMESPACE, SettingsError, SettingsStoreOperations, SettingsView,
    default_settings_path,
};
