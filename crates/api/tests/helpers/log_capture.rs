use std::io;
use std::sync::{Arc, Mutex};
use tracing::dispatcher::DefaultGuard;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;

/// Shared buffer that a fmt layer writes formatted events into.
#[derive(Clone, Default)]
pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl LogWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes events on the current thread into a fresh [`LogWriter`] until the
/// guard is dropped.
pub fn capture_logs() -> (LogWriter, DefaultGuard) {
    let logs = LogWriter::default();
    let writer = logs.clone();

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(move || writer.clone())
        .with_ansi(false);
    let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer));

    (logs, tracing::dispatcher::set_default(&dispatch))
}
