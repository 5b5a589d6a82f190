//! The streaming rewriter.
//!
//! Bytes are fed one at a time (with one byte of lookahead) through the
//! [`Lexer`]; the accumulator records where declarators, argument lists,
//! bodies and comments start and end. When the lexer reports a construct
//! boundary the accumulated text is flushed: classified as a file header, a
//! function definition or plain text, rendered, and forgotten. Generated
//! comment blocks therefore land *before* the text that justified them even
//! though the input is read forward only once.

use regex::bytes::Regex;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::sync::OnceLock;

use crate::buffer::Accumulator;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::lexer::{Action, Lexer};
use crate::mining::{mine_comment, mine_statement};
use crate::text::{is_space, skip_comment, skip_space, trim_comment, trim_space};
use crate::typed::{classify, TypeInfo, TypeStyle};

/// Reminder closing every generated function block.
pub const STANDING_TODO: &str = "@todo edit me (automatically generated by insertdox)";

const FILE_TODO: &str = "@todo Edit file comment (automatically generated by insertdox)";
const PLACEHOLDER: &str = "Brief description needed.\n\n\tFollowed by a more complete description.";
const UNKNOWN_FILE: &str = "<unknown>";
const BOILERPLATE_CHUNK: usize = 32 * 1024;

pub struct Annotator<'o, W: Write> {
    out: W,
    options: &'o Options,
    acc: Accumulator,
    lexer: Lexer,
    /// No significant byte seen yet.
    at_start: bool,
    /// The pending comment is the file header.
    file_comment: bool,
    /// A line break comes straight after the text being flushed.
    newline_follows: bool,
}

impl<'o, W: Write> Annotator<'o, W> {
    pub fn new(out: W, options: &'o Options) -> Self {
        Self {
            out,
            options,
            acc: Accumulator::new(options.buffer_capacity),
            lexer: Lexer::new(),
            at_start: true,
            file_comment: false,
            newline_follows: false,
        }
    }

    /// Processes byte `c`; `next` is the following byte, if any.
    pub fn feed(&mut self, c: u8, next: Option<u8>) -> Result<()> {
        let step = self.lexer.step(c, next);
        let mut flush = step.flush;
        // Flushes from `apply` happen before `c` is appended.
        self.newline_follows = is_newline(c);
        if let Some(action) = step.action {
            flush |= self.apply(action)?;
        }

        if self.at_start && !is_space(c) {
            self.at_start = false;
            if self.lexer.in_comment() {
                self.file_comment = true;
            } else {
                self.new_file_comment()?;
            }
        }

        if self.acc.push(c) {
            tracing::debug!(capacity = self.options.buffer_capacity, "buffer full, forcing flush");
            flush = true;
        }

        if flush {
            self.newline_follows = next.is_some_and(is_newline);
            self.flush()?;
            self.file_comment = false;
        }
        Ok(())
    }

    /// Flushes whatever is left and hands back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.newline_follows = false;
        self.flush()?;
        self.out.flush()?;
        Ok(self.out)
    }

    /// Applies a range action for the byte about to be appended. Returns true
    /// when the construct must be flushed once that byte is in.
    fn apply(&mut self, action: Action) -> Result<bool> {
        let pos = self.acc.pos();
        match action {
            Action::OpenDescription => {
                self.flush()?;
                let at = self.acc.pos();
                self.acc.description.open(at);
            }
            Action::OpenBodyComment => self.acc.comment_start = Some(pos),
            Action::CloseDescription { inclusive } => {
                self.acc.description.close(if inclusive { pos + 1 } else { pos });
                if self.file_comment {
                    if inclusive {
                        return Ok(true);
                    }
                    // A line comment ends before its newline; keep the newline
                    // out of the header.
                    self.flush()?;
                    self.file_comment = false;
                }
            }
            Action::CloseBodyComment => mine_comment(&mut self.acc),
            Action::DiscardDescription => self.acc.discard_description(),
            Action::OpenArglist => {
                self.acc.function.close(pos);
                self.acc.arglist.open(pos);
            }
            Action::CloseArglist => self.acc.arglist.close(pos + 1),
            Action::OpenBody => self.acc.body.open(pos),
            Action::CloseBody => self.acc.body.close(pos + 1),
            Action::Statement => mine_statement(&mut self.acc),
            Action::MarkDeclarator => self.acc.function.open(pos),
            Action::MarkStatement => self.acc.statement_start = Some(pos),
        }
        Ok(false)
    }

    fn flush(&mut self) -> Result<()> {
        if !self.acc.is_empty() {
            if self.file_comment {
                tracing::trace!("flush: file header");
                self.render_file_comment()?;
            } else if self.acc.function.is_once() && self.acc.arglist.is_once() && self.acc.body.is_once() {
                tracing::trace!("flush: function");
                self.render_function()?;
            } else if !self.options.only_prototypes {
                tracing::trace!(bytes = self.acc.pos(), "flush: plain text");
                self.acc.emit(&mut self.out, 0, self.acc.pos())?;
            }
        }
        self.acc.reset();
        Ok(())
    }

    fn new_file_comment(&mut self) -> Result<()> {
        let name = self.options.filename.as_deref().unwrap_or(UNKNOWN_FILE);
        write!(self.out, "/**\n\t@file {name}")?;
        self.out.write_all(b"\n\n\tPut a description of the file here.\n")?;
        write_boilerplate(&mut self.out, self.options.boilerplate.as_deref())?;
        write!(self.out, "\n\t{FILE_TODO}\n*/\n/* $Header$ */\n\n")?;
        Ok(())
    }

    fn render_file_comment(&mut self) -> Result<()> {
        let buf = self.acc.bytes();
        let s = skip_comment(buf, 0, buf.len());
        let e = trim_comment(buf, s, buf.len());
        self.out.write_all(b"/**\n\t")?;
        self.out.write_all(&defuse(&buf[s..e]))?;
        self.out.write_all(b"\n")?;
        write_boilerplate(&mut self.out, self.options.boilerplate.as_deref())?;
        // Reuse the line break that already follows the comment, so a re-run
        // does not push the code down by one more line.
        let close: &[u8] = if self.newline_follows { b"\n*/" } else { b"\n*/\n" };
        self.out.write_all(close)?;
        Ok(())
    }

    fn render_function(&mut self) -> Result<()> {
        let acc = &self.acc;
        let buf = acc.bytes();
        let style = self.options.type_style;
        let decl = classify(buf, acc.function.start, acc.function.end, style);

        // `cut` is where the original text stops before the block, `resume`
        // where it picks up again.
        let described = acc.description.is_captured();
        let (cut, resume) = if described {
            (acc.description.start, acc.description.end)
        } else {
            let at = acc.function.start.saturating_sub(1);
            (at, at)
        };
        let existing: &[u8] = if described {
            let s = skip_comment(buf, acc.description.start, acc.description.end);
            &buf[s..trim_comment(buf, s, acc.description.end)]
        } else {
            &[]
        };
        let tags = ExistingTags::scan(existing);

        let mut sections: Vec<Vec<Vec<u8>>> = Vec::new();
        if decl.is_static && !tags.internal {
            sections.push(vec![b"@internal".to_vec()]);
        }
        sections.push(vec![if existing.is_empty() {
            PLACEHOLDER.as_bytes().to_vec()
        } else {
            existing.to_vec()
        }]);
        sections.push(
            param_lines(buf, acc.arglist.start, acc.arglist.end, style)
                .into_iter()
                .filter(|(name, _)| !tags.params.contains(name))
                .map(|(_, line)| line)
                .collect(),
        );
        if !decl.is_void(buf) && !tags.returns {
            sections.push(return_lines(&decl, &acc.retvals));
        }
        if self.options.render_notes {
            sections.push(mined_lines(b"@note ", &acc.notes, &tags));
        }
        let mut todos = mined_lines(b"@todo ", &acc.todos, &tags);
        if !tags.has_line(STANDING_TODO.as_bytes()) {
            todos.push(STANDING_TODO.as_bytes().to_vec());
        }
        sections.push(todos);

        let mut block = Vec::new();
        if !described {
            block.push(b'\n');
        }
        block.extend_from_slice(b"/**\n");
        let mut first = true;
        for section in sections.iter().filter(|s| !s.is_empty()) {
            if !first {
                block.push(b'\n');
            }
            first = false;
            for line in section {
                block.push(b'\t');
                block.extend_from_slice(&defuse(line));
                block.push(b'\n');
            }
        }
        block.extend_from_slice(b"*/");
        // Nothing precedes a declarator at offset 0 to carry the line break.
        if !described && acc.function.start == 0 {
            block.push(b'\n');
        }

        acc.emit(&mut self.out, 0, cut)?;
        self.out.write_all(&block)?;
        if self.options.only_prototypes {
            acc.emit(&mut self.out, resume, acc.arglist.end)?;
            self.out.write_all(b";\n\n")?;
        } else {
            acc.emit(&mut self.out, resume, acc.pos())?;
        }
        Ok(())
    }
}

/// One `@param` line per top-level declarator of the argument list, paired
/// with the parameter name.
fn param_lines(buf: &[u8], start: usize, end: usize, style: TypeStyle) -> Vec<(Vec<u8>, Vec<u8>)> {
    let end = end.min(buf.len());
    let mut s = start;
    while s < end && (is_space(buf[s]) || buf[s] == b'(') {
        s += 1;
    }

    let mut lines = Vec::new();
    let mut depth = 0usize;
    for p in s..end {
        match buf[p] {
            b'(' => depth += 1,
            b')' if depth > 0 => depth -= 1,
            b',' | b')' if depth == 0 => {
                if trim_space(buf, s, p) > skip_space(buf, s, p) {
                    let info = classify(buf, s, p, style);
                    let name = info.name(buf);
                    if name != b"void" {
                        let dir: &[u8] = if info.input_only { b"in" } else { b"in,out" };
                        let line = join(&[b"@param[", dir, b"] \t", name, b" \t", &info.phrase]);
                        lines.push((name.to_vec(), line));
                    }
                }
                s = p + 1;
            }
            _ => {}
        }
    }
    lines
}

fn is_newline(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// Breaks up any `*/` in `text` so it cannot end a generated block early.
fn defuse(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut rest = text;
    while let Some(i) = rest.windows(2).position(|w| w == b"*/") {
        out.extend_from_slice(&rest[..=i]);
        out.extend_from_slice(b" /");
        rest = &rest[i + 2..];
    }
    out.extend_from_slice(rest);
    out
}

fn join(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn return_lines(decl: &TypeInfo, retvals: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut lines = vec![join(&[b"@return ", &decl.phrase])];
    // Most recently mined first.
    lines.extend(retvals.iter().rev().map(|v| join(&[b"@retval ", v])));
    lines
}

fn mined_lines(tag: &[u8], entries: &[Vec<u8>], tags: &ExistingTags) -> Vec<Vec<u8>> {
    entries
        .iter()
        .rev()
        .map(|v| join(&[tag, v]))
        .filter(|line| !tags.has_line(line))
        .collect()
}

/// Tags an existing description already carries, so a second run over the
/// tool's own output does not repeat them.
#[derive(Debug, Default)]
struct ExistingTags {
    internal: bool,
    returns: bool,
    params: HashSet<Vec<u8>>,
    lines: HashSet<Vec<u8>>,
}

fn param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@param(?:\[[^\]]*\])?\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid param regex")
    })
}

fn return_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@returns?\b").expect("valid return regex"))
}

fn trim_line(line: &[u8]) -> &[u8] {
    let s = skip_space(line, 0, line.len());
    &line[s..trim_space(line, s, line.len())]
}

impl ExistingTags {
    fn scan(text: &[u8]) -> Self {
        let mut tags = Self::default();
        for line in text.split(|&b| b == b'\n' || b == b'\r').map(trim_line) {
            if line.is_empty() {
                continue;
            }
            if line == b"@internal" {
                tags.internal = true;
            } else if return_re().is_match(line) {
                tags.returns = true;
            } else if let Some(caps) = param_re().captures(line) {
                tags.params.insert(caps[1].to_vec());
            }
            tags.lines.insert(line.to_vec());
        }
        tags
    }

    fn has_line(&self, line: &[u8]) -> bool {
        let line = defuse(line);
        self.lines.contains(trim_line(&line))
    }
}

/// Streams the boilerplate file into `out` in fixed-size chunks.
fn write_boilerplate<W: Write>(out: &mut W, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let mut file = File::open(path).map_err(|source| Error::Boilerplate {
        path: path.to_path_buf(),
        source,
    })?;
    let mut chunk = vec![0u8; BOILERPLATE_CHUNK];
    loop {
        let n = match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(Error::Boilerplate {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        out.write_all(&chunk[..n])?;
    }
    Ok(())
}

/// Rewrites everything read from `input` into `output`.
pub fn process<R: Read, W: Write>(input: R, output: W, options: &Options) -> Result<W> {
    let mut annotator = Annotator::new(output, options);
    let mut bytes = BufReader::new(input).bytes().peekable();
    while let Some(c) = bytes.next() {
        let c = c?;
        let next = match bytes.peek() {
            Some(Ok(b)) => Some(*b),
            _ => None,
        };
        annotator.feed(c, next)?;
    }
    annotator.finish()
}

/// In-memory convenience over [`process`].
pub fn annotate(source: &[u8], options: &Options) -> Result<Vec<u8>> {
    process(source, Vec::new(), options)
}
