//! Lossless HTML tokenizer.
//!
//! Splits a document into a flat stream of [`Token`]s. Every token borrows the
//! exact slice of input it was read from ([`Token::raw`]), and the raw slices of
//! consecutive tokens tile the input with no gaps or overlap. Re-emitting the
//! raw slices therefore reproduces the document byte for byte, which is what
//! lets the rewriter touch text nodes and nothing else.
//!
//! This is not an HTML5 tokenizer. It recognises just enough structure to tell
//! text apart from markup:
//! - `<name ...>` start tags and `</name ...>` end tags (name starts with an ASCII letter),
//! - `<!-- ... -->` comments,
//! - `<!...>` declarations, including `<!DOCTYPE ...>` and `<![CDATA[ ... ]]>`,
//! - `<? ... >` processing instructions.
//!
//! Any other `<` is text. Bodies of `script` and `style` elements are raw text:
//! they run until the matching close tag, so `<` inside JavaScript or CSS never
//! opens markup. Constructs left open at end of input extend to the end.
use memchr::memchr;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

/// One attribute of a start tag, as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// `None` for bare attributes such as `disabled`.
    pub value: Option<&'a str>,
}

/// A classified span of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        raw: &'a str,
        name: &'a str,
        attributes: Vec<Attribute<'a>>,
    },
    EndTag {
        raw: &'a str,
        name: &'a str,
    },
    Text(&'a str),
    Comment {
        raw: &'a str,
        body: &'a str,
    },
    Declaration {
        raw: &'a str,
        body: &'a str,
    },
    ProcessingInstruction {
        raw: &'a str,
        body: &'a str,
    },
}

impl<'a> Token<'a> {
    /// The exact input slice this token covers.
    pub fn raw(&self) -> &'a str {
        match self {
            Token::StartTag { raw, .. }
            | Token::EndTag { raw, .. }
            | Token::Comment { raw, .. }
            | Token::Declaration { raw, .. }
            | Token::ProcessingInstruction { raw, .. } => *raw,
            Token::Text(text) => *text,
        }
    }

    /// Tag name as written, for start and end tags.
    pub fn tag_name(&self) -> Option<&'a str> {
        match self {
            Token::StartTag { name, .. } | Token::EndTag { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn is_start_tag(&self, name: &str) -> bool {
        matches!(self, Token::StartTag { name: n, .. } if n.eq_ignore_ascii_case(name))
    }

    pub fn is_end_tag(&self, name: &str) -> bool {
        matches!(self, Token::EndTag { name: n, .. } if n.eq_ignore_ascii_case(name))
    }

    /// Value of the named attribute (ASCII case-insensitive), for start tags.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        match self {
            Token::StartTag { attributes, .. } => attributes
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .and_then(|a| a.value),
            _ => None,
        }
    }
}

/// Iterator over the tokens of a document.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Close-tag prefix to scan for when the next span is a script/style body.
    rawtext: Option<&'static [u8]>,
}

/// Tokenize `input` lazily.
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer::new(input)
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            rawtext: None,
        }
    }

    // Slice endpoints are always ASCII structural bytes or the input end, so
    // every slice below lands on a UTF-8 char boundary.
    fn take(&mut self, end: usize) -> &'a str {
        debug_assert!(self.input.is_char_boundary(self.pos));
        debug_assert!(self.input.is_char_boundary(end));
        let slice = &self.input[self.pos..end];
        self.pos = end;
        slice
    }

    fn read_rawtext(&mut self, close_tag: &[u8]) -> Option<Token<'a>> {
        let input = self.input;
        let rest = &input.as_bytes()[self.pos..];
        let end = match find_rawtext_close_tag(rest, close_tag) {
            Some(rel) => self.pos + rel,
            None => self.input.len(),
        };
        if end == self.pos {
            return None;
        }
        Some(Token::Text(self.take(end)))
    }

    fn read_text(&mut self) -> Token<'a> {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() {
            match memchr(b'<', &bytes[i..]) {
                Some(rel) => {
                    i += rel;
                    if starts_markup(bytes, i) {
                        break;
                    }
                    i += 1;
                }
                None => {
                    i = bytes.len();
                    break;
                }
            }
        }
        let end = i.min(bytes.len());
        Token::Text(self.take(end))
    }

    /// Read `<open ... close`; an unterminated construct runs to end of input.
    fn read_delimited(&mut self, open: &str, close: &str) -> (&'a str, &'a str) {
        let input = self.input;
        let body_start = self.pos + open.len();
        let (body_end, end) = match input[body_start..].find(close) {
            Some(rel) => (body_start + rel, body_start + rel + close.len()),
            None => (input.len(), input.len()),
        };
        let body = &input[body_start..body_end];
        (self.take(end), body)
    }

    fn read_comment(&mut self) -> Token<'a> {
        let input = self.input;
        // `<!-->` and `<!--->` are complete, empty comments.
        for abrupt in ["<!-->", "<!--->"] {
            if input[self.pos..].starts_with(abrupt) {
                let end = self.pos + abrupt.len();
                return Token::Comment {
                    raw: self.take(end),
                    body: "",
                };
            }
        }
        let (raw, body) = self.read_delimited(COMMENT_OPEN, COMMENT_CLOSE);
        Token::Comment { raw, body }
    }

    fn read_end_tag(&mut self) -> Token<'a> {
        let input = self.input;
        let bytes = input.as_bytes();
        let name_start = self.pos + 2;
        let name_end = scan_name(bytes, name_start);
        let end = match memchr(b'>', &bytes[name_end..]) {
            Some(rel) => name_end + rel + 1,
            None => bytes.len(),
        };
        let name = &input[name_start..name_end];
        Token::EndTag {
            raw: self.take(end),
            name,
        }
    }

    fn read_start_tag(&mut self) -> Token<'a> {
        let input = self.input;
        let bytes = input.as_bytes();
        let len = bytes.len();
        let name_start = self.pos + 1;
        let name_end = scan_name(bytes, name_start);
        let name = &input[name_start..name_end];

        let mut attributes = Vec::new();
        let mut k = name_end;

        loop {
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= len {
                break;
            }
            match bytes[k] {
                b'>' => {
                    k += 1;
                    break;
                }
                b'/' => {
                    if k + 1 < len && bytes[k + 1] == b'>' {
                        k += 2;
                        break;
                    }
                    k += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = k;
            while k < len && !is_attribute_name_end(bytes[k]) {
                k += 1;
            }
            if k == attr_start {
                // Stray `=`: skip it rather than stall.
                k += 1;
                continue;
            }
            let attr_name = &input[attr_start..k];

            let mut after_name = k;
            while after_name < len && bytes[after_name].is_ascii_whitespace() {
                after_name += 1;
            }
            if after_name >= len || bytes[after_name] != b'=' {
                attributes.push(Attribute {
                    name: attr_name,
                    value: None,
                });
                continue;
            }

            k = after_name + 1;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                let value_start = k + 1;
                let value_end = match memchr(quote, &bytes[value_start..]) {
                    Some(rel) => value_start + rel,
                    None => len,
                };
                attributes.push(Attribute {
                    name: attr_name,
                    value: Some(&input[value_start..value_end]),
                });
                k = (value_end + 1).min(len);
            } else {
                let value_start = k;
                while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                attributes.push(Attribute {
                    name: attr_name,
                    value: Some(&input[value_start..k]),
                });
            }
        }

        if name.eq_ignore_ascii_case("script") {
            self.rawtext = Some(SCRIPT_CLOSE_TAG);
        } else if name.eq_ignore_ascii_case("style") {
            self.rawtext = Some(STYLE_CLOSE_TAG);
        }

        Token::StartTag {
            raw: self.take(k.min(len)),
            name,
            attributes,
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(close_tag) = self.rawtext.take() {
            if let Some(body) = self.read_rawtext(close_tag) {
                return Some(body);
            }
        }
        if self.pos >= self.input.len() {
            return None;
        }

        let input = self.input;
        let bytes = input.as_bytes();
        let i = self.pos;
        if !starts_markup(bytes, i) {
            return Some(self.read_text());
        }

        let rest = &input[i..];
        let token = match bytes[i + 1] {
            b'!' if rest.starts_with(COMMENT_OPEN) => self.read_comment(),
            b'!' if rest.starts_with(CDATA_OPEN) => {
                let (raw, _) = self.read_delimited(CDATA_OPEN, CDATA_CLOSE);
                // Body spans from after `<!` to before the final `>`.
                let body = &raw[2..raw.len() - usize::from(raw.ends_with('>'))];
                Token::Declaration { raw, body }
            }
            b'!' => {
                let (raw, body) = self.read_delimited("<!", ">");
                Token::Declaration { raw, body }
            }
            b'?' => {
                let (raw, body) = self.read_delimited("<?", ">");
                Token::ProcessingInstruction { raw, body }
            }
            b'/' => self.read_end_tag(),
            _ => self.read_start_tag(),
        };
        Some(token)
    }
}

/// Whether a markup construct opens at `bytes[i]`.
fn starts_markup(bytes: &[u8], i: usize) -> bool {
    if bytes.get(i) != Some(&b'<') {
        return false;
    }
    match bytes.get(i + 1) {
        Some(b'!') | Some(b'?') => true,
        Some(b'/') => bytes.get(i + 2).is_some_and(u8::is_ascii_alphabetic),
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    }
}

/// End of a tag name starting at `start`.
fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'/' && bytes[j] != b'>' {
        j += 1;
    }
    j
}

fn is_attribute_name_end(c: u8) -> bool {
    c.is_ascii_whitespace() || c == b'/' || c == b'>' || c == b'='
}

/// Offset of the first `</script` / `</style` (ASCII case-insensitive) that is
/// followed by whitespace, `/`, `>` or end of input.
fn find_rawtext_close_tag(hay: &[u8], close_tag: &[u8]) -> Option<usize> {
    debug_assert!(close_tag.starts_with(b"</"));
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= hay.len() {
        let rel = memchr(b'<', &hay[i..])?;
        i += rel;
        if i + n > hay.len() {
            return None;
        }
        if hay[i..i + n].eq_ignore_ascii_case(close_tag) {
            match hay.get(i + n) {
                None => return Some(i),
                Some(c) if c.is_ascii_whitespace() || *c == b'/' || *c == b'>' => return Some(i),
                _ => {}
            }
        }
        i += 1;
    }
    None
}
