//! Mining of function bodies: marker comments and `return` expressions.

use crate::buffer::Accumulator;
use crate::text::{skip_punct, skip_space, starts_with_keyword, starts_with_word, trim_comment, trim_space};

const TODO_MARKERS: &[&str] = &["todo", "fixme", "fix-me"];
const NOTE_MARKERS: &[&str] = &["note", "nb"];

enum Marker {
    Todo,
    Note,
}

fn match_marker(buf: &[u8], at: usize, to: usize) -> Option<(Marker, usize)> {
    let find = |words: &[&str]| {
        words
            .iter()
            .find(|w| starts_with_word(buf, at, to, w))
            .map(|w| at + w.len())
    };
    find(TODO_MARKERS)
        .map(|end| (Marker::Todo, end))
        .or_else(|| find(NOTE_MARKERS).map(|end| (Marker::Note, end)))
}

/// Called when a comment inside a body closes. The comment runs from
/// `comment_start` to the current end of the accumulator.
pub fn mine_comment(acc: &mut Accumulator) {
    let Some(start) = acc.comment_start.take() else {
        return;
    };
    let end = acc.pos();
    let buf = acc.bytes();
    let p = skip_punct(buf, start, end);
    let Some((marker, after)) = match_marker(buf, p, end) else {
        return;
    };
    let s = skip_punct(buf, after, end);
    let e = trim_comment(buf, s, end);
    let text = buf[s..e].to_vec();
    match marker {
        Marker::Todo => acc.todos.push(text),
        Marker::Note => acc.notes.push(text),
    }
}

/// Replaces `/* */` and `//` comments in an expression with a single space.
/// Quoted text is copied untouched.
fn strip_comments(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < text.len() {
        let c = text[i];
        match quote {
            Some(q) => {
                out.push(c);
                if c == b'\\' && i + 1 < text.len() {
                    i += 1;
                    out.push(text[i]);
                } else if c == q {
                    quote = None;
                }
            }
            None if c == b'"' || c == b'\'' => {
                quote = Some(c);
                out.push(c);
            }
            None if text[i..].starts_with(b"/*") => {
                i = text[i + 2..]
                    .windows(2)
                    .position(|w| w == b"*/")
                    .map_or(text.len(), |p| i + 2 + p + 2);
                out.push(b' ');
                continue;
            }
            None if text[i..].starts_with(b"//") => {
                i = text[i..].iter().position(|&b| b == b'\n').map_or(text.len(), |p| i + p);
                out.push(b' ');
                continue;
            }
            None => out.push(c),
        }
        i += 1;
    }
    out
}

/// Called at `;`, `{` or `}` inside a body. Records the value of a `return`
/// statement, minus comments and one redundant pair of outer parentheses.
pub fn mine_statement(acc: &mut Accumulator) {
    let Some(start) = acc.statement_start.take() else {
        return;
    };
    let end = acc.pos();
    let buf = acc.bytes();
    if !starts_with_keyword(buf, start, end, "return") {
        return;
    }
    let expr = strip_comments(&buf[start + "return".len()..end]);
    let mut s = skip_space(&expr, 0, expr.len());
    let mut e = trim_space(&expr, s, expr.len());

    // `(a)+(b)` keeps its parentheses: only a single wrapping pair goes.
    if s < e && expr[s] == b'(' {
        let opens = expr[s..e].iter().filter(|&&b| b == b'(').count();
        if opens == 1 && expr[e - 1] == b')' {
            s = skip_space(&expr, s + 1, e - 1);
            e = trim_space(&expr, s, e - 1);
        }
    }
    if s < e {
        acc.retvals.push(expr[s..e].to_vec());
    }
}
