/*
 * Everything that touches the host editor or the panel: the message types, the view
 * channel to the panel, the event router that serializes host events, and the
 * line-oriented stdio bridge used by the binary.
 */
pub mod error;
pub mod event_router;
pub mod stdio_bridge;
pub mod types;
pub mod view_channel;

pub use error::Result as PlatformResult;
pub use event_router::EventRouter;
pub use stdio_bridge::StdioHost;
pub use types::{
    DocumentHostOperations, HostEvent, HostEventHandler, InboundMessage, NodeToggle,
    OutboundMessage, ParseErrorReport,
};
pub use view_channel::{PanelState, ViewChannel, ViewSurfaceOperations};
