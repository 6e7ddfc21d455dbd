//! JSON-line printer for streaming council events.
//!
//! Writes one JSON object per line to stdout, in the order the pipeline
//! emitted them. Machine-readable by design, so no colors here.

use council_domain::CouncilEvent;
use tokio::sync::mpsc::Receiver;

/// Render one event as a single JSON line
pub fn format_event_line(event: &CouncilEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
}

/// Drain the event channel to stdout until the pipeline closes it.
///
/// Returns the terminal event, when one arrived before the channel closed.
pub async fn print_event_stream(mut rx: Receiver<CouncilEvent>) -> Option<CouncilEvent> {
    let mut terminal = None;
    while let Some(event) = rx.recv().await {
        println!("{}", format_event_line(&event));
        if event.is_terminal() {
            terminal = Some(event);
        }
    }
    terminal
}
