use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Feedback cue emitted by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Keypress,
    Error,
    Success,
}

/// Receiver of per-keystroke and completion cues.
///
/// Purely observational: nothing a sink does can change session state.
pub trait FeedbackSink {
    fn notify(&mut self, cue: Cue);
}

/// Discards every cue
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn notify(&mut self, _cue: Cue) {}
}

/// Rings the terminal bell on errors and on completion
#[derive(Debug)]
pub struct BellSink<W: Write> {
    out: W,
    enabled: bool,
}

impl<W: Write> BellSink<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FeedbackSink for BellSink<W> {
    fn notify(&mut self, cue: Cue) {
        if !self.enabled {
            return;
        }
        let bells: &[u8] = match cue {
            Cue::Keypress => return,
            Cue::Error => b"\x07",
            Cue::Success => b"\x07\x07",
        };
        if let Err(err) = self.out.write_all(bells).and_then(|_| self.out.flush()) {
            tracing::debug!(%err, "unable to ring terminal bell");
        }
    }
}

/// Bell bytes held back until the terminal owner writes them out.
///
/// The TUI backend owns stdout, so the sink writes here and the draw loop
/// drains the queue through the backend.
#[derive(Clone, Debug, Default)]
pub struct BellQueue {
    pending: Rc<RefCell<Vec<u8>>>,
}

impl BellQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Write and flush everything queued so far
    pub fn drain_into(&self, out: &mut impl Write) -> io::Result<()> {
        let bytes = std::mem::take(&mut *self.pending.borrow_mut());
        if bytes.is_empty() {
            return Ok(());
        }
        out.write_all(&bytes)?;
        out.flush()
    }
}

impl Write for BellQueue {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps every cue in a shared log so tests can inspect it after handing the sink away
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    cues: Rc<RefCell<Vec<Cue>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.borrow().clone()
    }
}

impl FeedbackSink for RecordingSink {
    fn notify(&mut self, cue: Cue) {
        self.cues.borrow_mut().push(cue);
    }
}
