//! Declarator classification: `const char **name[]` → name, type phrase and
//! a guess at whether the function can modify the argument.

use crate::buffer::BoundedBuf;
use crate::text::{is_ident, is_space, skip_space, starts_with_keyword, trim_space};

/// Capacity of a rendered type phrase, in bytes.
pub const DEFAULT_TYPE_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy)]
pub struct TypeStyle {
    pub capacity: usize,
    /// Prefix plain types with `a `/`an `.
    pub article: bool,
}

impl Default for TypeStyle {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TYPE_CAPACITY,
            article: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// The trailing identifier, as offsets into the classified buffer.
    pub name: (usize, usize),
    pub phrase: Vec<u8>,
    pub is_static: bool,
    pub is_const: bool,
    pub is_array: bool,
    pub pointer_depth: usize,
    /// Const, or passed by value. Typedef'd pointers and qualifiers hidden
    /// behind macros fool it.
    pub input_only: bool,
    base: (usize, usize),
}

impl TypeInfo {
    pub fn name<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.name.0..self.name.1]
    }

    pub fn base<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.base.0..self.base.1]
    }

    /// True when the type renders as exactly `void`, articles aside.
    pub fn is_void(&self, buf: &[u8]) -> bool {
        !self.is_const && !self.is_array && self.pointer_depth == 0 && self.base(buf) == b"void"
    }
}

fn is_vowel(b: u8) -> bool {
    matches!(b.to_ascii_lowercase(), b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Classifies the declarator `buf[start..end]`.
pub fn classify(buf: &[u8], start: usize, end: usize, style: TypeStyle) -> TypeInfo {
    let end = end.min(buf.len());
    let mut s = skip_space(buf, start, end);
    let mut e = trim_space(buf, s, end);

    // One trailing `[...]` makes it an array.
    let mut is_array = false;
    if e > s && buf[e - 1] == b']' {
        is_array = true;
        let open = buf[s..e - 1].iter().rposition(|&b| b == b'[').map_or(s, |i| s + i);
        e = trim_space(buf, s, open);
    }

    let mut p = e;
    while p > s && is_ident(buf[p - 1]) {
        p -= 1;
    }
    let name = (p, e);

    let mut is_static = false;
    let mut is_const = false;
    loop {
        if starts_with_keyword(buf, s, p, "static") {
            is_static = true;
            s = skip_space(buf, s + "static".len(), p);
        } else if starts_with_keyword(buf, s, p, "const") {
            is_const = true;
            s = skip_space(buf, s + "const".len(), p);
        } else {
            break;
        }
    }

    let mut t = trim_space(buf, s, p);
    let mut pointer_depth = 0;
    while t > s && buf[t - 1] == b'*' {
        pointer_depth += 1;
        t -= 1;
        while t > s && is_space(buf[t - 1]) {
            t -= 1;
        }
    }

    let input_only = is_const || (pointer_depth == 0 && !is_array);

    let mut phrase = BoundedBuf::new(style.capacity);
    for _ in 0..pointer_depth {
        phrase.push(b"a pointer to ");
    }
    if is_array {
        phrase.push(b"an array of ");
    } else if style.article {
        if !is_const && s < t && is_vowel(buf[s]) {
            phrase.push(b"an ");
        } else {
            phrase.push(b"a ");
        }
    }
    if is_const {
        phrase.push(b"const ");
    }
    phrase.push(&buf[s..t]);

    TypeInfo {
        name,
        phrase: phrase.into_bytes(),
        is_static,
        is_const,
        is_array,
        pointer_depth,
        input_only,
        base: (s, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(decl: &str) -> (String, String, TypeInfo) {
        run_with(decl, TypeStyle::default())
    }

    fn run_with(decl: &str, style: TypeStyle) -> (String, String, TypeInfo) {
        let b = decl.as_bytes();
        let info = classify(b, 0, b.len(), style);
        let name = String::from_utf8_lossy(info.name(b)).into_owned();
        let phrase = String::from_utf8_lossy(&info.phrase).into_owned();
        (name, phrase, info)
    }

    #[test]
    fn const_pointer_is_input_only() {
        let (name, phrase, info) = run("const char *s");
        assert_eq!(name, "s");
        assert_eq!(phrase, "a pointer to const char");
        assert!(info.input_only);
    }

    #[test]
    fn by_value_is_input_only() {
        let (name, phrase, info) = run(" int n ");
        assert_eq!((name.as_str(), phrase.as_str()), ("n", "int"));
        assert!(info.input_only);
    }

    #[test]
    fn mutable_pointer_is_in_out() {
        let (name, phrase, info) = run("char *buf");
        assert_eq!(name, "buf");
        assert_eq!(phrase, "a pointer to char");
        assert!(!info.input_only);
    }

    #[test]
    fn arrays_and_pointer_depth() {
        let (name, phrase, info) = run("const char ** argv[]");
        assert_eq!(name, "argv");
        assert_eq!(phrase, "a pointer to a pointer to an array of const char");
        assert_eq!(info.pointer_depth, 2);
        assert!(info.is_array && info.is_const && info.input_only);

        let (name, _, info) = run("int table [16]");
        assert_eq!(name, "table");
        assert!(!info.input_only);
    }

    #[test]
    fn static_and_const_in_any_order() {
        let (name, phrase, info) = run("const static unsigned long f");
        assert_eq!(name, "f");
        assert_eq!(phrase, "const unsigned long");
        assert!(info.is_static);

        let (_, phrase, info) = run("static void *alloc");
        assert_eq!(phrase, "a pointer to void");
        assert!(info.is_static && !info.is_const);
    }

    #[test]
    fn keyword_prefixes_need_word_boundaries() {
        let (_, phrase, info) = run("constant_t v");
        assert_eq!(phrase, "constant_t");
        assert!(!info.is_const);
    }

    #[test]
    fn uppercase_qualifiers_are_plain_type_words() {
        let (name, phrase, info) = run("CONST char *p");
        assert_eq!(name, "p");
        assert_eq!(phrase, "a pointer to CONST char");
        assert!(!info.is_const && !info.input_only);

        let (_, phrase, info) = run("STATIC int q");
        assert_eq!(phrase, "STATIC int");
        assert!(!info.is_static);
    }

    #[test]
    fn void_detection_ignores_articles() {
        let b = b"void f";
        let info = classify(b, 0, b.len(), TypeStyle { article: true, ..TypeStyle::default() });
        assert_eq!(info.phrase, b"a void");
        assert!(info.is_void(b));

        let b = b"void *f";
        assert!(!classify(b, 0, b.len(), TypeStyle::default()).is_void(b));
    }

    #[test]
    fn article_prefix_picks_a_or_an() {
        let style = TypeStyle { article: true, ..TypeStyle::default() };
        assert_eq!(run_with("int x", style).1, "an int");
        assert_eq!(run_with("long x", style).1, "a long");
        assert_eq!(run_with("const int x", style).1, "a const int");
    }

    #[test]
    fn phrase_never_exceeds_capacity() {
        let style = TypeStyle { capacity: 16, article: false };
        let (_, phrase, _) = run_with("char ***p", style);
        assert_eq!(phrase.len(), 16);
        assert_eq!(phrase, "a pointer to a p");
    }

    #[test]
    fn offsets_are_relative_to_the_buffer() {
        let b = b"int f(const int x, char *y)";
        let info = classify(b, 19, 26, TypeStyle::default());
        assert_eq!(info.name(b), b"y");
        assert_eq!(info.phrase, b"a pointer to char");
    }
}
