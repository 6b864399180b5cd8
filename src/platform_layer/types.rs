/*
 * This module defines the data types exchanged between the host, the panel and the
 * application logic. Inbound panel messages (`InboundMessage`), outbound panel messages
 * (`OutboundMessage`), host events (`HostEvent`) and host requests (`HostRequest`) are
 * closed enums, so every message kind is handled by an exhaustive `match`.
 * The serialized shapes follow the panel protocol: `{"type": ..., "value": ...}`.
 * It also defines the traits the application logic implements (`HostEventHandler`)
 * and consumes (`DocumentHostOperations`).
 */
use super::error::Result as PlatformResult;
use crate::core::{NodeId, SettingsView, Tree};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Payload of an `onNodeToggle` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeToggle {
    pub id: NodeId,
    pub expanded: bool,
}

/*
 * Messages posted by the panel. File paths are optional because the panel may send the
 * message without a value (e.g. a cancelled file picker); handlers treat a missing or
 * empty path as a silent cancel.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum InboundMessage {
    OnFile(Option<PathBuf>),
    OnViewFile(Option<PathBuf>),
    OnSaplingVisible,
    OnSettingsAcquire,
    OnNodeToggle(NodeToggle),
    OnBoldCheck,
}

// Reported to the panel when the parser fails for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrorReport {
    pub file: PathBuf,
    pub message: String,
}

// Messages posted to the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum OutboundMessage {
    SettingsData(SettingsView),
    CurrentTab(PathBuf),
    ParsedData(Tree),
    SavedFile(String),
    ParseError(ParseErrorReport),
}

impl OutboundMessage {
    // Wire name of the message, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::SettingsData(_) => "settings-data",
            OutboundMessage::CurrentTab(_) => "current-tab",
            OutboundMessage::ParsedData(_) => "parsed-data",
            OutboundMessage::SavedFile(_) => "saved-file",
            OutboundMessage::ParseError(_) => "parse-error",
        }
    }
}

/*
 * Events delivered by the host. Panel lifecycle events (`PanelResolved`,
 * `PanelVisibilityChanged`, `PanelDisposed`) drive the view channel state; the rest are
 * routed to the controller's handlers.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "value", rename_all = "camelCase")]
pub enum HostEvent {
    ConfigurationChanged,
    // `None` when the last editor was closed.
    ActiveDocumentChanged(Option<PathBuf>),
    DocumentSaved(PathBuf),
    PanelResolved { visible: bool },
    PanelVisibilityChanged(bool),
    PanelDisposed,
    PanelMessage(InboundMessage),
    Shutdown,
}

// Requests sent from the application logic to the host editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum HostRequest {
    ShowDocument(PathBuf),
}

// --- Traits between App Logic and the host ---

/*
 * Implemented by the application logic. The event router calls `handle_event` for one
 * event at a time; the next event is not delivered until the call returns.
 */
pub trait HostEventHandler: Send + 'static {
    fn handle_event(&mut self, event: HostEvent);

    // Called once when the router stops, after the last event was handled.
    fn on_quit(&mut self) {}
}

// Capabilities of the host editor used by the application logic.
pub trait DocumentHostOperations: Send + Sync {
    // Path of the document in the active editor, if any.
    fn active_document(&self) -> Option<PathBuf>;

    // Opens `path` in an editor and brings it to the front.
    fn show_document(&self, path: &Path) -> PlatformResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TreeNode;
    use serde_json::json;

    #[test]
    fn test_inbound_messages_deserialize_from_panel_shape() {
        let cases = vec![
            (
                json!({"type": "onFile", "value": "/src/App.jsx"}),
                InboundMessage::OnFile(Some(PathBuf::from("/src/App.jsx"))),
            ),
            (
                json!({"type": "onViewFile", "value": null}),
                InboundMessage::OnViewFile(None),
            ),
            (
                json!({"type": "onSaplingVisible"}),
                InboundMessage::OnSaplingVisible,
            ),
            (
                json!({"type": "onSettingsAcquire"}),
                InboundMessage::OnSettingsAcquire,
            ),
            (
                json!({"type": "onNodeToggle", "value": {"id": "n1", "expanded": true}}),
                InboundMessage::OnNodeToggle(NodeToggle {
                    id: NodeId::from("n1"),
                    expanded: true,
                }),
            ),
            (json!({"type": "onBoldCheck"}), InboundMessage::OnBoldCheck),
        ];

        for (wire, expected) in cases {
            let parsed: InboundMessage = serde_json::from_value(wire.clone())
                .unwrap_or_else(|e| panic!("Failed to parse {wire}: {e}"));
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn test_unknown_inbound_type_is_rejected() {
        let result = serde_json::from_value::<InboundMessage>(json!({"type": "onFiel"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_outbound_messages_use_kebab_case_types() {
        let tree = Tree::new(TreeNode::new("r", "App", PathBuf::from("/src/App.jsx")));

        let parsed = serde_json::to_value(OutboundMessage::ParsedData(tree)).unwrap();
        let saved = serde_json::to_value(OutboundMessage::SavedFile("App.jsx".into())).unwrap();
        let tab = serde_json::to_value(OutboundMessage::CurrentTab("/src/B.jsx".into())).unwrap();

        assert_eq!(parsed["type"], "parsed-data");
        assert_eq!(parsed["value"]["name"], "App");
        assert_eq!(saved, json!({"type": "saved-file", "value": "App.jsx"}));
        assert_eq!(tab, json!({"type": "current-tab", "value": "/src/B.jsx"}));
    }

    #[test]
    fn test_outbound_kind_matches_wire_type() {
        let messages = vec![
            OutboundMessage::SettingsData(SettingsView::default()),
            OutboundMessage::CurrentTab(PathBuf::from("/a")),
            OutboundMessage::SavedFile("a".into()),
            OutboundMessage::ParseError(ParseErrorReport {
                file: PathBuf::from("/a"),
                message: "boom".into(),
            }),
        ];
        for message in messages {
            let value = serde_json::to_value(&message).unwrap();
            assert_eq!(value["type"], message.kind());
        }
    }

    #[test]
    fn test_host_events_deserialize() {
        let saved: HostEvent =
            serde_json::from_value(json!({"event": "documentSaved", "value": "/src/A.jsx"}))
                .unwrap();
        let closed: HostEvent =
            serde_json::from_value(json!({"event": "activeDocumentChanged", "value": null}))
                .unwrap();
        let resolved: HostEvent =
            serde_json::from_value(json!({"event": "panelResolved", "value": {"visible": false}}))
                .unwrap();
        let nested: HostEvent = serde_json::from_value(json!({
            "event": "panelMessage",
            "value": {"type": "onFile", "value": "/src/A.jsx"}
        }))
        .unwrap();

        assert_eq!(saved, HostEvent::DocumentSaved(PathBuf::from("/src/A.jsx")));
        assert_eq!(closed, HostEvent::ActiveDocumentChanged(None));
        assert_eq!(resolved, HostEvent::PanelResolved { visible: false });
        assert_eq!(
            nested,
            HostEvent::PanelMessage(InboundMessage::OnFile(Some(PathBuf::from("/src/A.jsx"))))
        );
    }
}
