use std::ops::Range;

/// Byte range into the source text
pub type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(Vec<Member>),
    Array(Vec<Node>),
    /// Decoded string value
    String(String),
    Number,
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Span of the raw token(s), quotes included for strings
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Decoded key
    pub key: String,
    pub key_span: Span,
    pub value: Node,
}

impl Node {
    pub fn members(&self) -> &[Member] {
        match &self.kind {
            NodeKind::Object(members) => members,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Structural lookup of a dependency's specifier node: the string value of
/// key `name` inside the object stored under top-level key `section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyQuery<'a> {
    pub section: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    span: Span,
    text: String,
}

/// Parse failure with the byte offset it happened at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

/// Position-aware JSON syntax tree. Every node keeps the byte span it was
/// parsed from; edits are recorded as span replacements and applied on
/// render, so bytes outside an edited span come straight from the source.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    root: Node,
    edits: Vec<Edit>,
}

impl SyntaxTree {
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let mut parser = Parser {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
        };
        if source.starts_with('\u{feff}') {
            parser.pos = '\u{feff}'.len_utf8();
        }
        parser.skip_ws();
        let root = parser.value()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("trailing characters after document"));
        }
        Ok(Self {
            source: source.to_string(),
            root,
            edits: Vec::new(),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// All nodes matching `query`; callers decide how many are acceptable
    pub fn select(&self, query: DependencyQuery<'_>) -> Vec<&Node> {
        self.root
            .members()
            .iter()
            .filter(|section| section.key == query.section)
            .flat_map(|section| section.value.members())
            .filter(|dep| dep.key == query.name && dep.value.as_str().is_some())
            .map(|dep| &dep.value)
            .collect()
    }

    /// Queue `span` to be replaced by `text`; a later edit to the same span
    /// supersedes the earlier one.
    pub fn replace(&mut self, span: Span, text: String) {
        self.edits.retain(|e| e.span != span);
        self.edits.push(Edit { span, text });
    }

    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Render the source with all queued edits applied
    pub fn render(&self) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|e| e.span.start);

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for edit in edits {
            out.push_str(&self.source[cursor..edit.span.start]);
            out.push_str(&edit.text);
            cursor = edit.span.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> SyntaxError {
        SyntaxError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), SyntaxError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(byte))))
        }
    }

    fn value(&mut self) -> Result<Node, SyntaxError> {
        match self.peek() {
            Some(b'{') => self.object(),
            Some(b'[') => self.array(),
            Some(b'"') => {
                let (value, span) = self.string()?;
                Ok(Node {
                    kind: NodeKind::String(value),
                    span,
                })
            }
            Some(b't') => self.literal("true", NodeKind::Bool(true)),
            Some(b'f') => self.literal("false", NodeKind::Bool(false)),
            Some(b'n') => self.literal("null", NodeKind::Null),
            Some(b'-' | b'0'..=b'9') => self.number(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn object(&mut self) -> Result<Node, SyntaxError> {
        let start = self.pos;
        self.expect(b'{')?;
        let mut members = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Node {
                kind: NodeKind::Object(members),
                span: start..self.pos,
            });
        }
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(self.error("expected object key"));
            }
            let (key, key_span) = self.string()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.value()?;
            members.push(Member {
                key,
                key_span,
                value,
            });
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
        Ok(Node {
            kind: NodeKind::Object(members),
            span: start..self.pos,
        })
    }

    fn array(&mut self) -> Result<Node, SyntaxError> {
        let start = self.pos;
        self.expect(b'[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(Node {
                kind: NodeKind::Array(items),
                span: start..self.pos,
            });
        }
        loop {
            self.skip_ws();
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
        Ok(Node {
            kind: NodeKind::Array(items),
            span: start..self.pos,
        })
    }

    /// Scan a string literal and decode it with serde_json, which owns the
    /// escape rules.
    fn string(&mut self) -> Result<(String, Span), SyntaxError> {
        let start = self.pos;
        self.expect(b'"')?;
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => self.pos += 2,
                Some(_) => self.pos += 1,
                None => return Err(self.error("unterminated string")),
            }
        }
        let raw = &self.src[start..self.pos];
        let decoded: String = serde_json::from_str(raw).map_err(|e| SyntaxError {
            offset: start,
            message: format!("invalid string literal: {e}"),
        })?;
        Ok((decoded, start..self.pos))
    }

    fn number(&mut self) -> Result<Node, SyntaxError> {
        let start = self.pos;
        while let Some(b'-' | b'+' | b'.' | b'e' | b'E' | b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        let raw = &self.src[start..self.pos];
        if serde_json::from_str::<serde_json::Number>(raw).is_err() {
            return Err(SyntaxError {
                offset: start,
                message: format!("invalid number '{raw}'"),
            });
        }
        Ok(Node {
            kind: NodeKind::Number,
            span: start..self.pos,
        })
    }

    fn literal(&mut self, word: &str, kind: NodeKind) -> Result<Node, SyntaxError> {
        let start = self.pos;
        if self.src[start..].starts_with(word) {
            self.pos += word.len();
            Ok(Node {
                kind,
                span: start..self.pos,
            })
        } else {
            Err(self.error("invalid literal"))
        }
    }
}
