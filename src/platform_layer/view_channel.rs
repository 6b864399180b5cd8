/*
 * The view channel is the application logic's only way to reach the panel.
 * The panel surface may be absent (not created yet, or disposed), hidden, or visible.
 * Sending to an absent surface is a silent no-op, and delivery errors are logged and
 * swallowed here so that no handler ever fails because the panel went away.
 * Visibility is tracked so callers can skip expensive pushes while the panel is hidden.
 */
use super::error::Result as PlatformResult;
use super::types::OutboundMessage;
use std::sync::Arc;

// A live panel surface able to receive messages.
pub trait ViewSurfaceOperations: Send + Sync {
    fn post_message(&self, message: &OutboundMessage) -> PlatformResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Absent,
    Hidden,
    Visible,
}

pub struct ViewChannel {
    surface: Option<Arc<dyn ViewSurfaceOperations>>,
    visible: bool,
}

impl ViewChannel {
    // Creates a channel with no surface attached.
    pub fn new() -> Self {
        ViewChannel {
            surface: None,
            visible: false,
        }
    }

    pub fn attach(&mut self, surface: Arc<dyn ViewSurfaceOperations>, visible: bool) {
        log::debug!("ViewChannel: Surface attached (visible: {visible}).");
        self.surface = Some(surface);
        self.visible = visible;
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.surface.is_none() {
            log::debug!("ViewChannel: Visibility change to {visible} ignored, no surface.");
            return;
        }
        log::trace!("ViewChannel: Visibility changed to {visible}.");
        self.visible = visible;
    }

    pub fn detach(&mut self) {
        if self.surface.take().is_some() {
            log::debug!("ViewChannel: Surface detached.");
        }
        self.visible = false;
    }

    pub fn state(&self) -> PanelState {
        match (&self.surface, self.visible) {
            (None, _) => PanelState::Absent,
            (Some(_), false) => PanelState::Hidden,
            (Some(_), true) => PanelState::Visible,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state() == PanelState::Visible
    }

    /*
     * Posts `message` to the surface if one exists, regardless of visibility.
     * Callers that must not push while hidden check `is_visible` first.
     */
    pub fn send(&self, message: OutboundMessage) {
        let Some(surface) = &self.surface else {
            log::trace!(
                "ViewChannel: Dropped '{}' message, no surface.",
                message.kind()
            );
            return;
        };
        match surface.post_message(&message) {
            Ok(()) => log::trace!("ViewChannel: Sent '{}' message.", message.kind()),
            Err(e) => log::warn!(
                "ViewChannel: Failed to deliver '{}' message: {e}",
                message.kind()
            ),
        }
    }
}

impl Default for ViewChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::error::PlatformError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSurface {
        messages: Mutex<Vec<OutboundMessage>>,
    }

    impl ViewSurfaceOperations for RecordingSurface {
        fn post_message(&self, message: &OutboundMessage) -> PlatformResult<()> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct BrokenSurface;

    impl ViewSurfaceOperations for BrokenSurface {
        fn post_message(&self, _message: &OutboundMessage) -> PlatformResult<()> {
            Err(PlatformError::ChannelUnavailable("webview disposed".into()))
        }
    }

    fn tab_message() -> OutboundMessage {
        OutboundMessage::CurrentTab(PathBuf::from("/src/App.jsx"))
    }

    #[test]
    fn test_new_channel_is_absent_and_send_is_noop() {
        crate::initialize_logging();
        let channel = ViewChannel::new();

        channel.send(tab_message());

        assert_eq!(channel.state(), PanelState::Absent);
        assert!(!channel.is_visible());
    }

    #[test]
    fn test_lifecycle_transitions() {
        // Arrange
        let mut channel = ViewChannel::new();
        let surface = Arc::new(RecordingSurface::default());

        // Act & Assert
        channel.set_visible(true);
        assert_eq!(channel.state(), PanelState::Absent);

        channel.attach(surface, false);
        assert_eq!(channel.state(), PanelState::Hidden);

        channel.set_visible(true);
        assert_eq!(channel.state(), PanelState::Visible);
        assert!(channel.is_visible());

        channel.detach();
        assert_eq!(channel.state(), PanelState::Absent);
        assert!(!channel.is_visible());
    }

    #[test]
    fn test_send_while_hidden_still_delivers() {
        let mut channel = ViewChannel::new();
        let surface = Arc::new(RecordingSurface::default());
        channel.attach(Arc::clone(&surface) as Arc<dyn ViewSurfaceOperations>, false);

        channel.send(tab_message());

        assert_eq!(*surface.messages.lock().unwrap(), vec![tab_message()]);
    }

    #[test]
    fn test_send_after_detach_is_dropped() {
        let mut channel = ViewChannel::new();
        let surface = Arc::new(RecordingSurface::default());
        channel.attach(Arc::clone(&surface) as Arc<dyn ViewSurfaceOperations>, true);
        channel.detach();

        channel.send(tab_message());

        assert!(surface.messages.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delivery_error_is_swallowed() {
        crate::initialize_logging();
        let mut channel = ViewChannel::new();
        channel.attach(Arc::new(BrokenSurface), true);

        channel.send(tab_message());

        assert!(channel.is_visible());
    }
}
