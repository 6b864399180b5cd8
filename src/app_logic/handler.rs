use crate::core::{
    ParserFactoryOperations, SETTINGS_NAMESPACE, SessionError, SettingsStoreOperations,
    TreeSession,
};
use crate::platform_layer::{
    DocumentHostOperations, HostEvent, HostEventHandler, InboundMessage, NodeToggle,
    OutboundMessage, ParseErrorReport, ViewChannel, ViewSurfaceOperations,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/*
 * Keeps the Sapling panel in sync with the host editor. It owns the tree session and the
 * view channel, receives every host event from the event router (one at a time), and
 * answers by posting outbound messages to the panel. It depends on a
 * `SettingsStoreOperations` implementation for the view settings and on
 * `DocumentHostOperations` for editor queries.
 *
 * No handler ever fails: parser and settings errors are logged, and parser errors are
 * reported to the panel as `parse-error` where the panel is expected to be listening.
 */
pub struct SyncController {
    pub(crate) session: TreeSession,
    pub(crate) view: ViewChannel,
    panel_surface: Arc<dyn ViewSurfaceOperations>,
    settings_store: Arc<dyn SettingsStoreOperations>,
    host: Arc<dyn DocumentHostOperations>,
}

// Absent and empty paths both mean "nothing chosen".
fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

impl SyncController {
    /*
     * `panel_surface` is the surface the view channel attaches to once the host reports
     * that the panel exists. Until then the channel is absent and sends are dropped.
     */
    pub fn new(
        parser_factory: Arc<dyn ParserFactoryOperations>,
        settings_store: Arc<dyn SettingsStoreOperations>,
        host: Arc<dyn DocumentHostOperations>,
        panel_surface: Arc<dyn ViewSurfaceOperations>,
    ) -> Self {
        SyncController {
            session: TreeSession::new(parser_factory),
            view: ViewChannel::new(),
            panel_surface,
            settings_store,
            host,
        }
    }

    // --- Host events ---

    pub(crate) fn on_configuration_changed(&mut self) {
        log::debug!("SyncController: Configuration changed, pushing settings.");
        self.send_settings();
    }

    pub(crate) fn on_active_document_changed(&mut self, document: Option<PathBuf>) {
        let Some(document) = non_empty(document) else {
            log::trace!("SyncController: No active document.");
            return;
        };
        self.view.send(OutboundMessage::CurrentTab(document));
    }

    /*
     * Re-parses after a save. The panel only receives the new tree while it is visible;
     * a hidden panel catches up through `onSaplingVisible`.
     */
    pub(crate) fn on_document_saved(&mut self, path: &Path) {
        match self.session.reparse_on_save(path) {
            Ok(Some(tree)) => {
                if self.view.is_visible() {
                    self.view.send(OutboundMessage::ParsedData(tree.clone()));
                } else {
                    log::debug!("SyncController: Panel not visible, tree for {path:?} held back.");
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("SyncController: Re-parse after save of {path:?} failed: {e}");
                if self.view.is_visible() {
                    self.report_parse_error(path, &e);
                }
            }
        }
    }

    pub(crate) fn on_panel_resolved(&mut self, visible: bool) {
        self.view.attach(Arc::clone(&self.panel_surface), visible);
    }

    pub(crate) fn on_panel_visibility_changed(&mut self, visible: bool) {
        self.view.set_visible(visible);
    }

    pub(crate) fn on_panel_disposed(&mut self) {
        self.view.detach();
    }

    pub(crate) fn on_panel_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::OnFile(path) => self.on_file(path),
            InboundMessage::OnViewFile(path) => self.on_view_file(path),
            InboundMessage::OnSaplingVisible => self.on_sapling_visible(),
            InboundMessage::OnSettingsAcquire => self.on_settings_acquire(),
            InboundMessage::OnNodeToggle(toggle) => self.on_node_toggle(toggle),
            InboundMessage::OnBoldCheck => self.on_bold_check(),
        }
    }

    // --- Panel commands ---

    /*
     * Opens a new tree for the chosen entry file, replacing whatever was open before.
     * An absent or empty path is a cancelled picker and changes nothing.
     */
    fn on_file(&mut self, path: Option<PathBuf>) {
        let Some(path) = non_empty(path) else {
            log::debug!("SyncController: onFile without a path ignored.");
            return;
        };
        match self.session.open_file(&path) {
            Ok(tree) => self.view.send(OutboundMessage::ParsedData(tree.clone())),
            Err(SessionError::MissingInput) => {
                log::debug!("SyncController: onFile without a path ignored.");
            }
            Err(e) => {
                log::error!("SyncController: Failed to open {path:?}: {e}");
                self.report_parse_error(&path, &e);
            }
        }
    }

    fn on_view_file(&mut self, path: Option<PathBuf>) {
        let Some(path) = non_empty(path) else {
            log::debug!("SyncController: onViewFile without a path ignored.");
            return;
        };
        if let Err(e) = self.host.show_document(&path) {
            log::warn!("SyncController: Host could not show {path:?}: {e}");
        }
    }

    // Catch-up after the panel was hidden: the current tree, then the bound file name.
    fn on_sapling_visible(&mut self) {
        let Some(tree) = self.session.get_current_tree().cloned() else {
            log::debug!("SyncController: Panel visible with no open tree.");
            return;
        };
        self.view.send(OutboundMessage::ParsedData(tree));
        if let Some(file_name) = self.session.get_bound_file_name() {
            self.view.send(OutboundMessage::SavedFile(file_name));
        }
    }

    fn on_settings_acquire(&mut self) {
        self.send_settings();
    }

    // Tree state only; nothing is sent back since the panel already shows the change.
    fn on_node_toggle(&mut self, toggle: NodeToggle) {
        let NodeToggle { id, expanded } = toggle;
        if self.session.toggle_node(&id, expanded) {
            log::trace!("SyncController: Node '{id}' expanded: {expanded}.");
        }
    }

    fn on_bold_check(&mut self) {
        match self.host.active_document() {
            Some(document) => self.view.send(OutboundMessage::CurrentTab(document)),
            None => log::debug!("SyncController: onBoldCheck with no active document."),
        }
    }

    // --- Helpers ---

    fn send_settings(&self) {
        match self.settings_store.load_view_settings(SETTINGS_NAMESPACE) {
            Ok(settings) => self.view.send(OutboundMessage::SettingsData(settings)),
            Err(e) => log::error!("SyncController: Failed to read view settings: {e}"),
        }
    }

    fn report_parse_error(&self, file: &Path, error: &SessionError) {
        self.view.send(OutboundMessage::ParseError(ParseErrorReport {
            file: file.to_path_buf(),
            message: error.to_string(),
        }));
    }

    fn bound_node_count(&mut self) -> Option<usize> {
        self.session.get_current_tree().map(|tree| tree.node_count())
    }

    #[cfg(test)]
    pub(crate) fn test_is_expanded(&mut self, id: &str) -> Option<bool> {
        let id = crate::core::NodeId::from(id);
        self.session
            .get_current_tree()
            .and_then(|tree| tree.find_node(&id))
            .map(|node| node.expanded)
    }
}

impl HostEventHandler for SyncController {
    fn handle_event(&mut self, event: HostEvent) {
        log::trace!("SyncController: Handling {event:?}");
        match event {
            HostEvent::ConfigurationChanged => self.on_configuration_changed(),
            HostEvent::ActiveDocumentChanged(document) => self.on_active_document_changed(document),
            HostEvent::DocumentSaved(path) => self.on_document_saved(&path),
            HostEvent::PanelResolved { visible } => self.on_panel_resolved(visible),
            HostEvent::PanelVisibilityChanged(visible) => self.on_panel_visibility_changed(visible),
            HostEvent::PanelDisposed => self.on_panel_disposed(),
            HostEvent::PanelMessage(message) => self.on_panel_message(message),
            HostEvent::Shutdown => log::debug!("SyncController: Shutdown reached the handler."),
        }
    }

    fn on_quit(&mut self) {
        let node_count = self.bound_node_count();
        match (self.session.bound_file_path(), node_count) {
            (Some(path), Some(count)) => {
                log::info!("SyncController: Quitting with {path:?} open ({count} nodes).")
            }
            _ => log::info!("SyncController: Quitting with no open tree."),
        }
    }
}
