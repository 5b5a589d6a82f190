//! Small byte-range helpers shared by the lexer, the miners and the renderer.
//!
//! All functions take a byte slice plus a `[from, to)` window and return an
//! offset inside that window. They never read outside it.

/// C `isspace`: ASCII whitespace plus vertical tab.
pub fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0b
}

pub fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_comment_punct(b: u8) -> bool {
    is_space(b) || b == b'/' || b == b'*'
}

/// First offset in `[from, to)` that is not whitespace, or `to`.
pub fn skip_space(buf: &[u8], from: usize, to: usize) -> usize {
    skip_while(buf, from, to, is_space)
}

/// End offset of `[from, to)` once trailing whitespace is dropped.
pub fn trim_space(buf: &[u8], from: usize, to: usize) -> usize {
    trim_while(buf, from, to, is_space)
}

/// Skips a run of whitespace, `/` and `*`.
pub fn skip_comment(buf: &[u8], from: usize, to: usize) -> usize {
    skip_while(buf, from, to, is_comment_punct)
}

/// Trims a trailing run of whitespace, `/` and `*`.
pub fn trim_comment(buf: &[u8], from: usize, to: usize) -> usize {
    trim_while(buf, from, to, is_comment_punct)
}

/// Skips a run of whitespace and ASCII punctuation.
pub fn skip_punct(buf: &[u8], from: usize, to: usize) -> usize {
    skip_while(buf, from, to, |b| is_space(b) || b.is_ascii_punctuation())
}

fn skip_while(buf: &[u8], from: usize, to: usize, pred: impl Fn(u8) -> bool) -> usize {
    let to = to.min(buf.len());
    let mut p = from.min(to);
    while p < to && pred(buf[p]) {
        p += 1;
    }
    p
}

fn trim_while(buf: &[u8], from: usize, to: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut e = to.min(buf.len());
    while e > from && pred(buf[e - 1]) {
        e -= 1;
    }
    e.max(from)
}

fn word_matches(buf: &[u8], at: usize, to: usize, word: &str, eq: fn(&[u8], &[u8]) -> bool) -> bool {
    let word = word.as_bytes();
    let to = to.min(buf.len());
    let end = at + word.len();
    if end > to {
        return false;
    }
    eq(&buf[at..end], word) && (end == to || !is_ident(buf[end]))
}

/// Case-insensitive marker match at `at` that also requires the marker not
/// to run on into an identifier (`nb` must not match `nbytes`).
pub fn starts_with_word(buf: &[u8], at: usize, to: usize, word: &str) -> bool {
    word_matches(buf, at, to, word, <[u8]>::eq_ignore_ascii_case)
}

/// Exact C keyword match at `at`: `RETURN` and `Const` are someone's macros.
pub fn starts_with_keyword(buf: &[u8], at: usize, to: usize, word: &str) -> bool {
    word_matches(buf, at, to, word, |a, b| a == b)
}

/// The filename element of a path, for the generated `@file` tag.
pub fn filename_from_path(path: &str) -> &str {
    path.rfind(|c: char| c == '/' || c == std::path::MAIN_SEPARATOR)
        .map_or(path, |i| &path[i + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_and_trim_stay_inside_window() {
        let s = b"  abc  ";
        assert_eq!(skip_space(s, 0, s.len()), 2);
        assert_eq!(trim_space(s, 0, s.len()), 5);

        let blank = b"   ";
        assert_eq!(skip_space(blank, 0, 3), 3);
        assert_eq!(trim_space(blank, 0, 3), 0);
        assert_eq!(trim_space(blank, 2, 3), 2);
    }

    #[test]
    fn comment_punctuation_is_stripped_from_both_ends() {
        let c = b"/***** hello world *****/";
        let s = skip_comment(c, 0, c.len());
        let e = trim_comment(c, s, c.len());
        assert_eq!(&c[s..e], b"hello world");
    }

    #[test]
    fn punct_skip_handles_leading_markers() {
        let c = b"// -- TODO: x";
        assert_eq!(skip_punct(c, 0, c.len()), 6);
    }

    #[test]
    fn word_match_respects_boundaries() {
        let s = b"NB: careful";
        assert!(starts_with_word(s, 0, s.len(), "nb"));
        let s = b"nbytes are counted";
        assert!(!starts_with_word(s, 0, s.len(), "nb"));
        let s = b"return";
        assert!(starts_with_word(s, 0, s.len(), "return"));
        assert!(!starts_with_word(s, 0, 3, "return"));
    }

    #[test]
    fn keyword_match_is_case_sensitive() {
        let s = b"const char";
        assert!(starts_with_keyword(s, 0, s.len(), "const"));
        let s = b"CONST char";
        assert!(!starts_with_keyword(s, 0, s.len(), "const"));
        let s = b"constant";
        assert!(!starts_with_keyword(s, 0, s.len(), "const"));
    }

    #[test]
    fn filename_drops_directories() {
        assert_eq!(filename_from_path("src/lib/parser.c"), "parser.c");
        assert_eq!(filename_from_path("parser.c"), "parser.c");
    }
}
