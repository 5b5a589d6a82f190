use std::io::{self, Write};

/// Default accumulation capacity before a flush is forced.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// How often a range was captured during the current accumulation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capture {
    #[default]
    None,
    Once,
    /// Seen more than once; never treated as a match.
    Repeated,
}

/// A `[start, end)` window into the accumulator's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: usize,
    pub end: usize,
    /// Opened during the current accumulation cycle.
    pub opened: bool,
    pub capture: Capture,
}

impl Range {
    pub fn open(&mut self, at: usize) {
        self.start = at;
        self.end = self.end.max(at);
        self.opened = true;
    }

    /// Closes the range at `at` and bumps the capture marker. A close with no
    /// open since the last reset (the opener went out with an earlier flush)
    /// is ignored.
    pub fn close(&mut self, at: usize) {
        if !self.opened {
            return;
        }
        self.end = at.max(self.start);
        self.capture = match self.capture {
            Capture::None => Capture::Once,
            _ => Capture::Repeated,
        };
    }

    pub fn is_once(&self) -> bool {
        self.capture == Capture::Once
    }

    pub fn is_captured(&self) -> bool {
        self.capture != Capture::None
    }
}

/// Text accumulated since the last flush, plus everything the lexer and the
/// miners recorded about it.
#[derive(Debug)]
pub struct Accumulator {
    data: Vec<u8>,
    capacity: usize,
    pub function: Range,
    pub arglist: Range,
    pub body: Range,
    pub description: Range,
    pub comment_start: Option<usize>,
    pub statement_start: Option<usize>,
    pub todos: Vec<Vec<u8>>,
    pub notes: Vec<Vec<u8>>,
    pub retvals: Vec<Vec<u8>>,
}

impl Accumulator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: Vec::with_capacity(capacity.min(DEFAULT_BUFFER_CAPACITY)),
            capacity,
            function: Range::default(),
            arglist: Range::default(),
            body: Range::default(),
            description: Range::default(),
            comment_start: None,
            statement_start: None,
            todos: Vec::new(),
            notes: Vec::new(),
            retvals: Vec::new(),
        }
    }

    /// Position the next pushed byte will occupy.
    pub fn pos(&self) -> usize {
        self.data.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends one byte. Returns `true` once the buffer has reached capacity
    /// and can not take another byte without a flush.
    pub fn push(&mut self, b: u8) -> bool {
        self.data.push(b);
        self.data.len() >= self.capacity
    }

    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        let end = end.min(self.data.len());
        &self.data[start.min(end)..end]
    }

    pub fn emit<W: Write>(&self, out: &mut W, start: usize, end: usize) -> io::Result<()> {
        out.write_all(self.slice(start, end))
    }

    /// Forgets the previous description candidate.
    pub fn discard_description(&mut self) {
        self.description = Range::default();
    }

    /// Rewinds to empty: ranges, markers, mined lists and the bytes themselves.
    pub fn reset(&mut self) {
        self.data.clear();
        self.function = Range::default();
        self.arglist = Range::default();
        self.body = Range::default();
        self.description = Range::default();
        self.comment_start = None;
        self.statement_start = None;
        self.todos.clear();
        self.notes.clear();
        self.retvals.clear();
    }
}

/// Fixed-capacity byte builder; appends past the capacity are silently cut.
#[derive(Debug, Clone)]
pub struct BoundedBuf {
    buf: Vec<u8>,
    capacity: usize,
}

impl BoundedBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        let room = self.capacity.saturating_sub(self.buf.len());
        self.buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
