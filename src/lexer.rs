//! Byte-at-a-time lexical state machine.
//!
//! The lexer never touches the accumulated text. Each byte goes through
//! [`LexState::advance`], a pure function of the current state, the byte and a
//! single byte of lookahead, which yields the next state plus a [`Step`]
//! telling the caller which range boundary (if any) the byte marks and
//! whether the accumulated construct is complete.

use crate::text::is_space;

/// Where to return once an escaped byte has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Normal,
    Directive,
    LineComment { directive: bool },
    SingleQuoted,
    DoubleQuoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Preprocessor line, from `#` to the unescaped newline.
    Directive,
    LineComment { directive: bool },
    /// Just saw the `/` of `/*`; the next byte is the opener's `*`.
    BlockCommentOpen { directive: bool },
    BlockComment { directive: bool, star: bool },
    SingleQuoted,
    DoubleQuoted,
    /// The next logical character is literal.
    Escape(Context),
    /// Second half of an escaped CRLF / LFCR pair.
    EscapeTail(Context),
}

impl From<Context> for Mode {
    fn from(ctx: Context) -> Self {
        match ctx {
            Context::Normal => Mode::Normal,
            Context::Directive => Mode::Directive,
            Context::LineComment { directive } => Mode::LineComment { directive },
            Context::SingleQuoted => Mode::SingleQuoted,
            Context::DoubleQuoted => Mode::DoubleQuoted,
        }
    }
}

/// Range bookkeeping requested by a byte. Positions are relative to where the
/// byte is about to be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Comment opened at depth 0: flush, then start `description` here.
    OpenDescription,
    /// Comment opened inside a body: remember it for mining.
    OpenBodyComment,
    /// Comment closed at depth 0; `inclusive` keeps the current byte.
    CloseDescription { inclusive: bool },
    /// Comment closed inside a body: mine it.
    CloseBodyComment,
    /// A directive follows; the pending comment was not a description.
    DiscardDescription,
    /// `(` at top level: end of the declarator, start of the argument list.
    OpenArglist,
    /// Matching `)`: end of the argument list (inclusive).
    CloseArglist,
    OpenBody,
    /// Final `}` (inclusive).
    CloseBody,
    /// `;`, `{` or `}` inside a body: mine the finished statement.
    Statement,
    /// First significant byte of a top-level construct.
    MarkDeclarator,
    /// First significant byte of a statement inside a body.
    MarkStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    pub action: Option<Action>,
    /// The construct is complete once this byte has been appended.
    pub flush: bool,
}

impl Step {
    fn action(action: Action) -> Self {
        Self { action: Some(action), flush: false }
    }

    fn flush() -> Self {
        Self { action: None, flush: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexState {
    pub mode: Mode,
    pub depth_curly: usize,
    pub depth_round: usize,
    /// Only whitespace seen so far on this line.
    pub line_start: bool,
    /// Between constructs: the next significant byte starts a new one.
    pub between: bool,
}

impl Default for LexState {
    fn default() -> Self {
        Self {
            mode: Mode::Normal,
            depth_curly: 0,
            depth_round: 0,
            line_start: true,
            between: true,
        }
    }
}

fn is_newline(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// `\r\n` or `\n\r`: one logical newline.
fn is_newline_pair(c: u8, next: Option<u8>) -> bool {
    matches!((c, next), (b'\r', Some(b'\n')) | (b'\n', Some(b'\r')))
}

impl LexState {
    pub fn in_comment(&self) -> bool {
        matches!(
            self.mode,
            Mode::LineComment { .. }
                | Mode::BlockCommentOpen { .. }
                | Mode::BlockComment { .. }
                | Mode::Escape(Context::LineComment { .. })
                | Mode::EscapeTail(Context::LineComment { .. })
        )
    }

    fn top_level(&self) -> bool {
        self.depth_curly == 0
    }

    /// Computes the state after `c`, given one byte of lookahead.
    pub fn advance(self, c: u8, next: Option<u8>) -> (LexState, Step) {
        let mut s = self;
        let step = match self.mode {
            Mode::Escape(ctx) => {
                s.mode = if is_newline_pair(c, next) {
                    Mode::EscapeTail(ctx)
                } else {
                    ctx.into()
                };
                Step::default()
            }
            Mode::EscapeTail(ctx) => {
                s.mode = ctx.into();
                Step::default()
            }
            Mode::LineComment { directive } => match c {
                b'\\' => {
                    s.mode = Mode::Escape(Context::LineComment { directive });
                    Step::default()
                }
                c if is_newline(c) => {
                    s.mode = Mode::Normal;
                    s.line_start = true;
                    if self.top_level() {
                        Step {
                            action: Some(Action::CloseDescription { inclusive: false }),
                            flush: directive,
                        }
                    } else {
                        Step::action(Action::CloseBodyComment)
                    }
                }
                _ => Step::default(),
            },
            Mode::BlockCommentOpen { directive } => {
                s.mode = Mode::BlockComment { directive, star: false };
                Step::default()
            }
            Mode::BlockComment { directive, star } => {
                if star && c == b'/' {
                    s.mode = if directive { Mode::Directive } else { Mode::Normal };
                    if self.top_level() {
                        Step::action(Action::CloseDescription { inclusive: true })
                    } else {
                        Step::action(Action::CloseBodyComment)
                    }
                } else {
                    s.mode = Mode::BlockComment { directive, star: c == b'*' };
                    Step::default()
                }
            }
            Mode::Directive => match c {
                c if is_newline(c) => {
                    s.mode = Mode::Normal;
                    s.line_start = true;
                    if self.top_level() {
                        Step::flush()
                    } else {
                        Step::default()
                    }
                }
                b'\\' => {
                    s.mode = Mode::Escape(Context::Directive);
                    Step::default()
                }
                b'/' => s.open_comment(next, true),
                _ => Step::default(),
            },
            Mode::SingleQuoted => {
                match c {
                    b'\'' => s.mode = Mode::Normal,
                    b'\\' => s.mode = Mode::Escape(Context::SingleQuoted),
                    _ => {}
                }
                Step::default()
            }
            Mode::DoubleQuoted => {
                match c {
                    b'"' => s.mode = Mode::Normal,
                    b'\\' => s.mode = Mode::Escape(Context::DoubleQuoted),
                    _ => {}
                }
                Step::default()
            }
            Mode::Normal => s.advance_normal(c, next),
        };

        if !is_space(c) {
            s.line_start = false;
        }
        (s, step)
    }

    fn open_comment(&mut self, next: Option<u8>, directive: bool) -> Step {
        self.mode = match next {
            Some(b'*') => Mode::BlockCommentOpen { directive },
            Some(b'/') => Mode::LineComment { directive },
            _ => return Step::default(),
        };
        if self.top_level() {
            Step::action(Action::OpenDescription)
        } else {
            Step::action(Action::OpenBodyComment)
        }
    }

    fn advance_normal(&mut self, c: u8, next: Option<u8>) -> Step {
        match c {
            b'\\' => {
                self.mode = Mode::Escape(Context::Normal);
                Step::default()
            }
            b'/' => self.open_comment(next, false),
            b'#' if self.line_start => {
                self.mode = Mode::Directive;
                if self.top_level() {
                    Step::action(Action::DiscardDescription)
                } else {
                    Step::default()
                }
            }
            b'\'' => {
                self.mode = Mode::SingleQuoted;
                Step::default()
            }
            b'"' => {
                self.mode = Mode::DoubleQuoted;
                Step::default()
            }
            b'(' => {
                let opens = self.top_level() && self.depth_round == 0;
                self.depth_round += 1;
                if opens {
                    Step::action(Action::OpenArglist)
                } else {
                    Step::default()
                }
            }
            b')' => {
                if self.depth_round == 0 {
                    return Step::default();
                }
                self.depth_round -= 1;
                if self.top_level() && self.depth_round == 0 {
                    Step::action(Action::CloseArglist)
                } else {
                    Step::default()
                }
            }
            b'{' => {
                let step = if self.top_level() {
                    Step::action(Action::OpenBody)
                } else {
                    Step::action(Action::Statement)
                };
                self.depth_curly += 1;
                self.between = true;
                step
            }
            b'}' => {
                self.between = true;
                match self.depth_curly {
                    0 => Step::default(),
                    1 => {
                        self.depth_curly = 0;
                        Step { action: Some(Action::CloseBody), flush: true }
                    }
                    _ => {
                        self.depth_curly -= 1;
                        Step::action(Action::Statement)
                    }
                }
            }
            b';' => {
                self.between = true;
                if self.top_level() {
                    Step::flush()
                } else {
                    Step::action(Action::Statement)
                }
            }
            b'\n' | b'\r' => {
                self.line_start = true;
                Step::default()
            }
            c if self.between && !is_space(c) => {
                self.between = false;
                if self.top_level() {
                    Step::action(Action::MarkDeclarator)
                } else {
                    Step::action(Action::MarkStatement)
                }
            }
            _ => Step::default(),
        }
    }
}

/// Thin stateful wrapper over [`LexState::advance`].
#[derive(Debug, Default)]
pub struct Lexer {
    state: LexState,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, c: u8, next: Option<u8>) -> Step {
        let (state, step) = self.state.advance(c, next);
        self.state = state;
        step
    }

    pub fn state(&self) -> &LexState {
        &self.state
    }

    pub fn in_comment(&self) -> bool {
        self.state.in_comment()
    }
}
