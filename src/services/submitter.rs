use crate::order::OrderPayload;
use crate::services::sink::OrderSink;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// Result of one sink call, drained by the UI loop.
#[derive(Debug)]
pub(crate) struct SubmitMsg {
    pub(crate) outcome: Result<String, String>,
}

// Run the sink off the UI thread and report back through the channel.
pub(crate) fn spawn_submit(sink: Arc<dyn OrderSink>, payload: OrderPayload, tx: Sender<SubmitMsg>) {
    thread::spawn(move || {
        let outcome = sink.submit(&payload).map_err(|e| format!("{e:#}"));
        let _ = tx.send(SubmitMsg { outcome });
    });
}
