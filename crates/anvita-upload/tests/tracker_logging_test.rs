use std::io;
use std::sync::{Arc, Mutex};

use anvita_upload::UploadTracker;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn captured_lines(sink: &SharedBuffer) -> Vec<serde_json::Value> {
    let bytes = sink.0.lock().expect("lock output").clone();
    let text = String::from_utf8(bytes).expect("utf8 log output");
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("json log line"))
        .collect()
}

#[test]
fn ticks_are_logged_at_debug() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::DEBUG)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let tracker = UploadTracker::new();
        tracker.begin("upload_a");
        tracker.tick("upload_a", 10);
    });

    let lines = captured_lines(&sink);
    let tick = lines
        .iter()
        .find(|l| {
            l.pointer("/fields/message").and_then(|v| v.as_str()) == Some("Progress tick")
        })
        .expect("tick log line");
    assert_eq!(tick.get("level").and_then(|v| v.as_str()), Some("DEBUG"));
    assert_eq!(
        tick.pointer("/fields/upload_id").and_then(|v| v.as_str()),
        Some("upload_a")
    );
    assert_eq!(tick.pointer("/fields/percent").and_then(|v| v.as_u64()), Some(10));
}

#[test]
fn ticks_are_hidden_at_info() {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let tracker = UploadTracker::new();
        tracker.begin("upload_a");
        tracker.tick("upload_a", 10);
    });

    assert!(captured_lines(&sink).is_empty());
}
