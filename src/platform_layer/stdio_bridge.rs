/*
 * Line-oriented bridge to the host editor. The host writes one JSON `HostEvent` per line
 * to our input; we write one JSON object per line to our output, either a panel message
 * (`{"channel":"panel","message":{...}}`) or a host request
 * (`{"channel":"host","request":{...}}`).
 *
 * `StdioHost` provides the host-side capabilities (active document, show document) and
 * the panel surface. `LineEventSource` is the event source that feeds the router from the
 * input stream on its own thread; it also records the active document as events pass by,
 * since the host reports it only through `activeDocumentChanged`.
 */
use super::error::{PlatformError, Result as PlatformResult};
use super::event_router::{EventSink, EventSource};
use super::types::{DocumentHostOperations, HostEvent, HostRequest, OutboundMessage};
use super::view_channel::ViewSurfaceOperations;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

type ActiveDocument = Arc<Mutex<Option<PathBuf>>>;

#[derive(Debug, Serialize)]
#[serde(tag = "channel", rename_all = "camelCase")]
enum BridgeOutput<'a> {
    Panel { message: &'a OutboundMessage },
    Host { request: &'a HostRequest },
}

// Serializes output lines; shared by the panel surface and host requests.
struct LineWriter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl LineWriter {
    fn write_output(&self, output: &BridgeOutput<'_>) -> PlatformResult<()> {
        let line = serde_json::to_string(output)?;
        let mut out = self.out.lock().map_err(|_| {
            PlatformError::ChannelUnavailable("output stream lock poisoned".to_string())
        })?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

struct PanelSurface {
    writer: Arc<LineWriter>,
}

impl ViewSurfaceOperations for PanelSurface {
    fn post_message(&self, message: &OutboundMessage) -> PlatformResult<()> {
        self.writer.write_output(&BridgeOutput::Panel { message })
    }
}

pub struct StdioHost {
    writer: Arc<LineWriter>,
    active_document: ActiveDocument,
}

impl StdioHost {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        StdioHost {
            writer: Arc::new(LineWriter {
                out: Mutex::new(out),
            }),
            active_document: Arc::new(Mutex::new(None)),
        }
    }

    // The panel surface writing to this host's output. Attached once the panel exists.
    pub fn panel_surface(&self) -> Arc<dyn ViewSurfaceOperations> {
        Arc::new(PanelSurface {
            writer: Arc::clone(&self.writer),
        })
    }

    pub fn event_source<R: BufRead + Send + 'static>(&self, reader: R) -> LineEventSource<R> {
        LineEventSource {
            reader,
            active_document: Arc::clone(&self.active_document),
        }
    }
}

impl DocumentHostOperations for StdioHost {
    fn active_document(&self) -> Option<PathBuf> {
        self.active_document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn show_document(&self, path: &Path) -> PlatformResult<()> {
        log::debug!("StdioHost: Requesting host to show {path:?}");
        let request = HostRequest::ShowDocument(path.to_path_buf());
        self.writer.write_output(&BridgeOutput::Host { request: &request })
    }
}

pub struct LineEventSource<R> {
    reader: R,
    active_document: ActiveDocument,
}

impl<R: BufRead + Send + 'static> EventSource for LineEventSource<R> {
    fn name(&self) -> &'static str {
        "host-stream"
    }

    fn subscribe(self: Box<Self>, sink: EventSink) -> PlatformResult<()> {
        let LineEventSource {
            reader,
            active_document,
        } = *self;
        thread::Builder::new()
            .name("host-reader".to_string())
            .spawn(move || {
                let posted = read_events(reader, &active_document, &sink);
                log::info!(
                    "LineEventSource[{}]: Host stream closed after {posted} events.",
                    sink.source()
                );
            })?;
        Ok(())
    }
}

/*
 * Reads events until end of input, a read error, or the router stopping. Blank lines are
 * skipped; lines that are not UTF-8 or not a valid event are logged and skipped.
 * Returns the number of events posted.
 */
fn read_events<R: BufRead>(
    mut reader: R,
    active_document: &Mutex<Option<PathBuf>>,
    sink: &EventSink,
) -> usize {
    let mut posted = 0;
    let mut line_number = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => line_number += 1,
            Err(e) => {
                log::error!("LineEventSource: Failed to read host stream: {e}");
                break;
            }
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                log::warn!("LineEventSource: Skipping non-UTF-8 line {line_number}: {e}");
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        let event: HostEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("LineEventSource: Skipping malformed line {line_number}: {e}");
                continue;
            }
        };
        if let HostEvent::ActiveDocumentChanged(document) = &event {
            *active_document
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = document.clone();
        }
        if !sink.post(event) {
            break;
        }
        posted += 1;
    }
    posted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::event_router::EventRouter;
    use crate::platform_layer::types::{HostEventHandler, InboundMessage};
    use std::io::{self, Cursor};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn lines(&self) -> Vec<serde_json::Value> {
            let text = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            text.lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    #[derive(Default)]
    struct CollectingHandler {
        events: Vec<HostEvent>,
    }

    impl HostEventHandler for CollectingHandler {
        fn handle_event(&mut self, event: HostEvent) {
            self.events.push(event);
        }
    }

    #[test]
    fn test_read_events_skips_blank_and_malformed_lines() {
        // Arrange
        crate::initialize_logging();
        let input = concat!(
            "{\"event\":\"configurationChanged\"}\n",
            "\n",
            "this is not json\n",
            "{\"event\":\"panelMessage\",\"value\":{\"type\":\"onBoldCheck\"}}\n",
        );
        let router = EventRouter::new();
        let sink = router.sink("test");
        let active = Mutex::new(None);

        // Act
        let posted = read_events(Cursor::new(input), &active, &sink);
        let mut handler = CollectingHandler::default();
        router.dispatch_pending(&mut handler);

        // Assert
        assert_eq!(posted, 2);
        assert_eq!(
            handler.events,
            vec![
                HostEvent::ConfigurationChanged,
                HostEvent::PanelMessage(InboundMessage::OnBoldCheck)
            ]
        );
    }

    #[test]
    fn test_read_events_skips_non_utf8_line_and_keeps_reading() {
        // Arrange
        crate::initialize_logging();
        let mut input = b"{\"event\":\"configurationChanged\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"event\":\"panelMessage\",\"value\":{\"type\":\"onBoldCheck\"}}\r\n");
        let router = EventRouter::new();
        let sink = router.sink("test");
        let active = Mutex::new(None);

        // Act
        let posted = read_events(Cursor::new(input), &active, &sink);
        let mut handler = CollectingHandler::default();
        router.dispatch_pending(&mut handler);

        // Assert
        assert_eq!(posted, 2);
        assert_eq!(
            handler.events,
            vec![
                HostEvent::ConfigurationChanged,
                HostEvent::PanelMessage(InboundMessage::OnBoldCheck)
            ]
        );
    }

    #[test]
    fn test_read_events_handles_last_line_without_newline() {
        let input = "{\"event\":\"panelDisposed\"}";
        let router = EventRouter::new();
        let sink = router.sink("test");
        let active = Mutex::new(None);

        let posted = read_events(Cursor::new(input), &active, &sink);
        let mut handler = CollectingHandler::default();
        router.dispatch_pending(&mut handler);

        assert_eq!(posted, 1);
        assert_eq!(handler.events, vec![HostEvent::PanelDisposed]);
    }

    #[test]
    fn test_event_source_tracks_active_document() {
        // Arrange
        let host = StdioHost::new(Box::new(SharedBuffer::default()));
        let input = concat!(
            "{\"event\":\"activeDocumentChanged\",\"value\":\"/src/A.jsx\"}\n",
            "{\"event\":\"activeDocumentChanged\",\"value\":\"/src/B.jsx\"}\n",
        );
        let router = EventRouter::new();
        router
            .subscribe(Box::new(host.event_source(Cursor::new(input))))
            .unwrap();
        let mut handler = CollectingHandler::default();

        // Act
        let handled = router.run(&mut handler);

        // Assert
        assert_eq!(handled, 2);
        assert_eq!(host.active_document(), Some(PathBuf::from("/src/B.jsx")));
    }

    #[test]
    fn test_active_document_cleared_when_editors_close() {
        let host = StdioHost::new(Box::new(SharedBuffer::default()));
        let input = concat!(
            "{\"event\":\"activeDocumentChanged\",\"value\":\"/src/A.jsx\"}\n",
            "{\"event\":\"activeDocumentChanged\",\"value\":null}\n",
        );
        let router = EventRouter::new();
        router
            .subscribe(Box::new(host.event_source(Cursor::new(input))))
            .unwrap();

        router.run(&mut CollectingHandler::default());

        assert_eq!(host.active_document(), None);
    }

    #[test]
    fn test_panel_surface_writes_panel_envelope() {
        let buffer = SharedBuffer::default();
        let host = StdioHost::new(Box::new(buffer.clone()));

        host.panel_surface()
            .post_message(&OutboundMessage::SavedFile("App.jsx".to_string()))
            .unwrap();

        assert_eq!(
            buffer.lines(),
            vec![serde_json::json!({
                "channel": "panel",
                "message": {"type": "saved-file", "value": "App.jsx"}
            })]
        );
    }

    #[test]
    fn test_show_document_writes_host_request() {
        let buffer = SharedBuffer::default();
        let host = StdioHost::new(Box::new(buffer.clone()));

        host.show_document(Path::new("/src/App.jsx")).unwrap();

        assert_eq!(
            buffer.lines(),
            vec![serde_json::json!({
                "channel": "host",
                "request": {"type": "showDocument", "value": "/src/App.jsx"}
            })]
        );
    }
}
