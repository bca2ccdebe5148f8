//! Structured event stream for `Crossway`.
//!
//! Discrete, typed controller events serialized as newline-delimited JSON
//! (JSONL). Each line carries a monotonically increasing sequence number so
//! consumers can detect gaps and order lines from a rotated file.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use crossway_core::{Color, Direction, SequenceConfig};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted while the controller runs.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The controller has started and the API is listening.
    ServerStarted {
        /// When the controller started.
        timestamp: DateTime<Utc>,
        /// Address the HTTP API is bound to.
        bind_addr: String,
        /// Configured history cap.
        history_size: usize,
    },

    /// The controller has stopped.
    ServerStopped {
        /// When the controller stopped.
        timestamp: DateTime<Utc>,
        /// Human-readable stop reason.
        reason: String,
    },

    /// A phase was committed and is now showing.
    PhaseEntered {
        /// When the phase was committed.
        timestamp: DateTime<Utc>,
        /// Logical sequence id (same as the history record id).
        sequence_id: u64,
        /// Active approach.
        direction: Direction,
        /// Active aspect.
        color: Color,
        /// Configured phase length in milliseconds.
        duration_ms: u64,
    },

    /// The phase table was replaced.
    SequenceUpdated {
        /// When the new table was installed.
        timestamp: DateTime<Utc>,
        /// The applied timing.
        timing: SequenceConfig,
    },

    /// Advancement was frozen.
    Paused {
        /// When the controller paused.
        timestamp: DateTime<Utc>,
        /// Sequence id of the frozen phase.
        sequence_id: u64,
    },

    /// Advancement resumed.
    Resumed {
        /// When the controller resumed.
        timestamp: DateTime<Utc>,
        /// Sequence id of the restarted phase.
        sequence_id: u64,
    },

    /// The conflict guard tripped and the controller force-paused.
    ConflictDetected {
        /// When the fault was detected.
        timestamp: DateTime<Utc>,
        /// Human-readable fault description.
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) increments the sequence counter,
/// serializes the event as one JSON line, and flushes. Serialization or I/O
/// failures are dropped: observability must never stall the signal cycle.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug, so Debug is implemented by hand.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output in tests.
    #[derive(Clone)]
    pub(crate) struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        pub(crate) fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        pub(crate) fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }

        pub(crate) fn lines(&self) -> Vec<serde_json::Value> {
            self.contents()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sample_event() -> Event {
        Event::PhaseEntered {
            timestamp: DateTime::parse_from_rfc3339("2026-05-04T10:15:30Z")
                .unwrap()
                .with_timezone(&Utc),
            sequence_id: 3,
            direction: Direction::East,
            color: Color::Green,
            duration_ms: 20_000,
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let parsed = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(parsed["type"], "PhaseEntered");
        assert_eq!(parsed["direction"], "EAST");
        assert_eq!(parsed["color"], "GREEN");
    }

    #[test]
    fn emitter_writes_valid_jsonl() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(sample_event());

        let lines = tw.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], "PhaseEntered");
        assert_eq!(lines[0]["sequence_id"], 3);
        assert_eq!(lines[0]["sequence"], 0);
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(sample_event());
        emitter.emit(Event::ServerStopped {
            timestamp: Utc::now(),
            reason: "signal".to_owned(),
        });

        assert_eq!(emitter.event_count(), 2);

        let lines = tw.lines();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["type"], "ServerStopped");
    }

    #[test]
    fn sequence_updated_carries_timing() {
        let event = Event::SequenceUpdated {
            timestamp: Utc::now(),
            timing: SequenceConfig {
                ns_green_secs: 5,
                ns_yellow_secs: 2,
                ew_green_secs: 4,
                ew_yellow_secs: 2,
            },
        };
        let parsed = serde_json::to_value(event).unwrap();
        assert_eq!(parsed["timing"]["ns_green_secs"], 5);
        assert_eq!(parsed["timing"]["ew_green_secs"], 4);
    }

    #[test]
    fn noop_emitter_counts_but_discards() {
        let emitter = EventEmitter::noop();
        emitter.emit(sample_event());
        assert_eq!(emitter.event_count(), 1);
    }
}
