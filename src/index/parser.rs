//! Parser for Doxygen `search/*.js` scripts.
//!
//! The scripts are a single JavaScript assignment of a nested array literal:
//!
//! ```text
//! var searchData=
//! [
//!   ['point3d_3',['point3d',['../classPoint3D.html',1,'Point3D'], ...]],
//! ];
//! ```
//!
//! Parsing happens in two passes: the literal is read into a small value tree
//! (strings, integers, arrays, each tagged with its source position), then the
//! tree is checked against the record shape and turned into [`Entry`] values.
//! Any failure aborts the whole parse; there is no partial result.

use std::iter::Peekable;
use std::str::Chars;

use super::entities::decode_entities;
use super::error::MalformedIndexError;
use crate::model::{Entry, Reference, SearchKey};

/// Parse a complete search script (or a bare array literal) into entries.
pub fn parse_search_script(source: &str) -> Result<Vec<Entry>, MalformedIndexError> {
    let mut lexer = Lexer::new(source);
    lexer.skip_trivia()?;
    lexer.skip_assignment_prefix()?;
    lexer.skip_trivia()?;
    let root = lexer.value()?;
    lexer.skip_trivia()?;
    if lexer.peek() == Some(';') {
        lexer.bump();
        lexer.skip_trivia()?;
    }
    if let Some(c) = lexer.peek() {
        return Err(lexer.error(format!("unexpected trailing character {c:?}")));
    }

    records_from_value(root)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pos {
    line: usize,
    column: usize,
}

impl Pos {
    fn error(self, reason: impl Into<String>) -> MalformedIndexError {
        MalformedIndexError::new(self.line, self.column, reason)
    }
}

#[derive(Debug)]
enum Value {
    Str(Pos, String),
    Int(Pos, i64),
    Array(Pos, Vec<Value>),
}

impl Value {
    fn pos(&self) -> Pos {
        match self {
            Value::Str(p, _) | Value::Int(p, _) | Value::Array(p, _) => *p,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Str(..) => "string",
            Value::Int(..) => "integer",
            Value::Array(..) => "array",
        }
    }
}

/// Records nest four arrays deep; anything far past that is not an index.
const MAX_DEPTH: usize = 16;

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, reason: impl Into<String>) -> MalformedIndexError {
        self.pos().error(reason)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn expect(&mut self, want: char) -> Result<(), MalformedIndexError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected {want:?}, found {c:?}"))),
            None => Err(self.error(format!("unexpected end of input, expected {want:?}"))),
        }
    }

    /// Whitespace plus `//` and `/* */` comments.
    fn skip_trivia(&mut self) -> Result<(), MalformedIndexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let start = self.pos();
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(start.error("unterminated comment")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consume `var <ident> =` when present.
    fn skip_assignment_prefix(&mut self) -> Result<(), MalformedIndexError> {
        if !matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_' || c == '$') {
            return Ok(());
        }
        let keyword = self.identifier();
        if matches!(keyword.as_str(), "var" | "let" | "const") {
            self.skip_trivia()?;
            if self.identifier().is_empty() {
                return Err(self.error("expected variable name"));
            }
        }
        self.skip_trivia()?;
        self.expect('=')
    }

    fn identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn value(&mut self) -> Result<Value, MalformedIndexError> {
        match self.peek() {
            Some('[') => self.array(),
            Some(q @ ('\'' | '"')) => self.string(q),
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer(),
            Some(c) => Err(self.error(format!("unexpected character {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn array(&mut self) -> Result<Value, MalformedIndexError> {
        if self.depth == MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let array = self.array_items();
        self.depth -= 1;
        array
    }

    fn array_items(&mut self) -> Result<Value, MalformedIndexError> {
        let start = self.pos();
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(']') => {
                    self.bump();
                    return Ok(Value::Array(start, items));
                }
                None => return Err(self.error("unexpected end of input inside array")),
                _ => {}
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                Some(c) => return Err(self.error(format!("expected ',' or ']', found {c:?}"))),
                None => return Err(self.error("unexpected end of input inside array")),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<Value, MalformedIndexError> {
        let start = self.pos();
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(start.error("unterminated string"));
            };
            match c {
                '\\' => text.push(self.escape()?),
                '\n' => return Err(start.error("unterminated string")),
                c if c == quote => return Ok(Value::Str(start, text)),
                c => text.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, MalformedIndexError> {
        let pos = self.pos();
        let Some(c) = self.bump() else {
            return Err(pos.error("unterminated escape sequence"));
        };
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'x' => self.hex_escape(2, pos)?,
            'u' => self.hex_escape(4, pos)?,
            // `\'`, `\"`, `\\`, `\/` and any other identity escape.
            other => other,
        })
    }

    fn hex_escape(&mut self, digits: usize, pos: Pos) -> Result<char, MalformedIndexError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| pos.error("invalid hex escape"))?;
            code = code * 16 + d;
        }
        char::from_u32(code).ok_or_else(|| pos.error("escape is not a valid character"))
    }

    fn integer(&mut self) -> Result<Value, MalformedIndexError> {
        let start = self.pos();
        let mut digits = String::new();
        if self.peek() == Some('-') {
            digits.push('-');
            self.bump();
        }
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.bump();
        }
        digits
            .parse()
            .map(|n| Value::Int(start, n))
            .map_err(|_| start.error(format!("invalid integer {digits:?}")))
    }
}

fn records_from_value(root: Value) -> Result<Vec<Entry>, MalformedIndexError> {
    let records = match root {
        Value::Array(_, records) => records,
        other => {
            return Err(other
                .pos()
                .error(format!("expected array of records, found {}", other.kind())));
        }
    };
    records.into_iter().map(entry_from_value).collect()
}

/// `['key_n', ['label', [ref], [ref], ...]]`
fn entry_from_value(record: Value) -> Result<Entry, MalformedIndexError> {
    let pos = record.pos();
    let fields = match record {
        Value::Array(_, fields) => fields,
        other => return Err(pos.error(format!("expected record array, found {}", other.kind()))),
    };
    let mut fields = fields.into_iter();

    let raw_key = match fields.next() {
        Some(Value::Str(_, key)) if !key.is_empty() => key,
        Some(Value::Str(p, _)) => return Err(p.error("empty search key")),
        Some(other) => {
            return Err(other.pos().error(format!("expected search key string, found {}", other.kind())));
        }
        None => return Err(pos.error("empty record")),
    };

    let body = fields
        .next()
        .ok_or_else(|| pos.error(format!("record {raw_key:?} is missing its reference list")))?;
    if let Some(extra) = fields.next() {
        return Err(extra.pos().error(format!("unexpected extra field in record {raw_key:?}")));
    }
    let body_pos = body.pos();
    let body = match body {
        Value::Array(_, body) => body,
        other => {
            return Err(body_pos.error(format!(
                "record {raw_key:?}: expected label and references, found {}",
                other.kind()
            )));
        }
    };
    let mut body = body.into_iter();

    let label = match body.next() {
        Some(Value::Str(_, label)) => decode_entities(&label),
        Some(other) => {
            return Err(other.pos().error(format!("record {raw_key:?}: expected label string, found {}", other.kind())));
        }
        None => return Err(body_pos.error(format!("record {raw_key:?} has no label"))),
    };

    let references = body
        .map(|value| reference_from_value(&raw_key, value))
        .collect::<Result<Vec<_>, _>>()?;
    if references.is_empty() {
        return Err(body_pos.error(format!("record {raw_key:?} has no references")));
    }

    Ok(Entry {
        key: SearchKey::parse(&raw_key),
        label,
        references,
    })
}

/// `[anchor, flag?, owner, signature?]`
fn reference_from_value(raw_key: &str, value: Value) -> Result<Reference, MalformedIndexError> {
    let pos = value.pos();
    let parts = match value {
        Value::Array(_, parts) => parts,
        other => {
            return Err(pos.error(format!(
                "record {raw_key:?}: expected reference array, found {}",
                other.kind()
            )));
        }
    };
    let mut parts = parts.into_iter().peekable();

    let anchor_path = match parts.next() {
        Some(Value::Str(p, anchor)) => {
            if anchor.trim().is_empty() {
                return Err(p.error(format!("record {raw_key:?}: empty anchor path")));
            }
            anchor
        }
        Some(other) => {
            return Err(other.pos().error(format!("record {raw_key:?}: reference is missing its anchor path")));
        }
        None => return Err(pos.error(format!("record {raw_key:?}: empty reference"))),
    };

    let target_parent = match parts.next_if(|v| matches!(v, Value::Int(..))) {
        Some(Value::Int(_, flag)) => flag != 0,
        _ => true,
    };

    let owner_label = match parts.next() {
        Some(Value::Str(_, owner)) => decode_entities(&owner),
        Some(other) => {
            return Err(other.pos().error(format!("record {raw_key:?}: expected owner label, found {}", other.kind())));
        }
        None => return Err(pos.error(format!("record {raw_key:?}: reference is missing its owner label"))),
    };

    let overload_signature = match parts.next() {
        Some(Value::Str(_, sig)) => Some(decode_entities(&sig)),
        Some(other) => {
            return Err(other.pos().error(format!("record {raw_key:?}: expected overload signature, found {}", other.kind())));
        }
        None => None,
    };

    if let Some(extra) = parts.next() {
        return Err(extra.pos().error(format!("record {raw_key:?}: unexpected extra reference field")));
    }

    Ok(Reference {
        anchor_path,
        target_parent,
        owner_label,
        overload_signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"var searchData=
[
  ['perimeter_1',['perimeter',['../classTriangle2D.html#a36e4',1,'Triangle2D::perimeter()'],['../classTriangle3D.html#a4aa1',1,'Triangle3D::perimeter()']]],
  ['present_4',['present',['../classRenderer.html#a7d85',1,'Renderer']]]
];
";

    #[test]
    fn parses_doxygen_script() {
        let entries = parse_search_script(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let perimeter = &entries[0];
        assert_eq!(perimeter.term(), "perimeter");
        assert_eq!(perimeter.suffix_index(), Some(1));
        assert_eq!(perimeter.label, "perimeter");
        assert_eq!(perimeter.references.len(), 2);
        assert_eq!(perimeter.references[1].owner_label, "Triangle3D::perimeter()");
        assert!(perimeter.references[0].target_parent);

        assert_eq!(entries[1].references[0].anchor_path, "../classRenderer.html#a7d85");
    }

    #[test]
    fn accepts_bare_array_and_all_reference_shapes() {
        let src = r#"[
            ["a_0", ["a", ["../a.html", "A"]]],
            ["b_1", ["b", ["../b.html", "B::b", "(int x)"]]],
            ["c_2", ["c", ["../c.html", 0, "C"]]],
            ["d_3", ["d", ["../d.html", 1, "D::d", "() const"],]],
        ]"#;
        let entries = parse_search_script(src).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].references[0].owner_label, "A");
        assert_eq!(entries[1].references[0].overload_signature.as_deref(), Some("(int x)"));
        assert!(!entries[2].references[0].target_parent);
        assert_eq!(entries[3].references[0].signature(), Some("() const"));
    }

    #[test]
    fn decodes_entities_and_escapes() {
        let src = r"var searchData=[['x_0',['it\'s',['../x.html',1,'X::X(const X &amp;other)']]]];";
        let entries = parse_search_script(src).unwrap();
        assert_eq!(entries[0].label, "it's");
        assert_eq!(entries[0].references[0].owner_label, "X::X(const X &other)");
    }

    #[test]
    fn empty_table_is_well_formed() {
        assert!(parse_search_script("var searchData=\n[\n];\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_record_without_references() {
        let err = parse_search_script("[['pave3d_0',['pave3d']]]").unwrap_err();
        assert!(err.reason.contains("no references"), "{err}");
        assert_eq!((err.line, err.column), (1, 14));
    }

    #[test]
    fn rejects_record_missing_reference_list() {
        let err = parse_search_script("[['pave3d_0']]").unwrap_err();
        assert!(err.reason.contains("missing its reference list"), "{err}");
    }

    #[test]
    fn rejects_reference_without_anchor() {
        let err = parse_search_script("[['p_0',['p',[1,'P']]]]").unwrap_err();
        assert!(err.reason.contains("missing its anchor path"), "{err}");

        let err = parse_search_script("[['p_0',['p',['','P']]]]").unwrap_err();
        assert!(err.reason.contains("empty anchor path"), "{err}");
    }

    #[test]
    fn rejects_reference_without_owner() {
        let err = parse_search_script("[['p_0',['p',['../p.html',1]]]]").unwrap_err();
        assert!(err.reason.contains("owner label"), "{err}");
    }

    #[test]
    fn truncated_input_reports_position() {
        let truncated = &SAMPLE[..SAMPLE.len() / 2];
        let err = parse_search_script(truncated).unwrap_err();
        assert!(err.reason.contains("unterminated") || err.reason.contains("end of input"), "{err}");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let err = parse_search_script("var searchData=[]; extra").unwrap_err();
        assert!(err.reason.contains("trailing"), "{err}");
        assert_eq!((err.line, err.column), (1, 20));
    }

    #[test]
    fn deep_nesting_is_rejected_not_overflowed() {
        let err = parse_search_script(&"[".repeat(200_000)).unwrap_err();
        assert_eq!(err.reason, "nesting too deep");
        assert_eq!((err.line, err.column), (1, MAX_DEPTH + 1));

        let err = parse_search_script(&format!("{}{}", "[".repeat(12), "]".repeat(12))).unwrap_err();
        assert!(!err.reason.contains("nesting"), "{err}");
    }

    #[test]
    fn skips_comments() {
        let src = "// generated\nvar searchData= /* all */ [['a_0',['a',['../a.html',1,'A']]]];";
        assert_eq!(parse_search_script(src).unwrap().len(), 1);
    }
}
