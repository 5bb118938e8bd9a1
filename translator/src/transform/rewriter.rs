//! Structure-preserving rewriter.
//!
//! Re-emits a document token by token. Markup goes out as the exact slice it
//! was read from; text goes through [`substitute_into`] unless it sits inside
//! a `script` or `style` element.
//!
//! ```text
//!            <script ...>             <style ...>
//!   InScript <───────────── Normal ─────────────> InStyle
//!            ─────────────>        <─────────────
//!              </script>              </style>
//! ```

use serde::Serialize;

use super::substitute::substitute_into;
use super::tokenizer::{tokenize, Token};
use crate::models::Mapping;

/// Where in the document the rewriter currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    #[default]
    Normal,
    InScript,
    InStyle,
}

impl ScanMode {
    /// State after `token` has been emitted.
    ///
    /// Only `script`/`style` start tags and the end tag matching the current
    /// region change the state. Tag names compare ASCII case-insensitively.
    pub fn after(self, token: &Token<'_>) -> ScanMode {
        match token {
            Token::StartTag { name, .. } if name.eq_ignore_ascii_case("script") => ScanMode::InScript,
            Token::StartTag { name, .. } if name.eq_ignore_ascii_case("style") => ScanMode::InStyle,
            Token::EndTag { name, .. } => match self {
                ScanMode::InScript if name.eq_ignore_ascii_case("script") => ScanMode::Normal,
                ScanMode::InStyle if name.eq_ignore_ascii_case("style") => ScanMode::Normal,
                _ => self,
            },
            _ => self,
        }
    }

    /// Whether text seen in this state is substituted.
    pub fn substitutes_text(self) -> bool {
        self == ScanMode::Normal
    }
}

/// Counters gathered during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformStats {
    /// Text tokens seen, in any state
    pub text_nodes: usize,
    /// Text tokens in which at least one character was replaced
    pub substituted_nodes: usize,
    /// Text tokens left alone because they were script or style bodies
    pub protected_nodes: usize,
    /// Characters replaced in total
    pub replaced_chars: usize,
}

/// Transform `document`, substituting text outside script/style regions.
///
/// # Example
/// ```ignore
/// let mapping: Mapping = [("A", "B")].into_iter().collect();
/// assert_eq!(transform("<style>A</style><p>A</p>", &mapping), "<style>A</style><p>B</p>");
/// ```
pub fn transform(document: &str, mapping: &Mapping) -> String {
    transform_with_stats(document, mapping).0
}

/// Same as [`transform`], also returning pass statistics.
pub fn transform_with_stats(document: &str, mapping: &Mapping) -> (String, TransformStats) {
    let mut out = String::with_capacity(document.len() + document.len() / 8);
    let mut stats = TransformStats::default();
    let mut mode = ScanMode::Normal;

    for token in tokenize(document) {
        match token {
            Token::Text(text) => {
                stats.text_nodes += 1;
                if mode.substitutes_text() && !mapping.is_empty() {
                    let replaced = substitute_text(text, mapping, &mut out);
                    if replaced > 0 {
                        stats.substituted_nodes += 1;
                        stats.replaced_chars += replaced;
                    }
                } else {
                    if !mode.substitutes_text() {
                        stats.protected_nodes += 1;
                    }
                    out.push_str(text);
                }
            }
            other => {
                out.push_str(other.raw());
                mode = mode.after(&other);
            }
        }
    }

    (out, stats)
}

/// Substitute a text node.
///
/// A character reference (`&amp;`, `&#12354;`, `&#x3042;`) counts as the
/// character it stands for: it is replaced when that character is a mapping
/// key and copied as written otherwise. The letters and digits spelling the
/// reference are never substituted on their own.
fn substitute_text(text: &str, mapping: &Mapping, out: &mut String) -> usize {
    let mut replaced = 0;
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        replaced += substitute_into(&rest[..amp], mapping, out);
        match char_reference(&rest[amp..]) {
            Some((len, decoded)) => {
                match decoded.and_then(|c| mapping.get_char(c)) {
                    Some(target) => {
                        out.push_str(target);
                        replaced += 1;
                    }
                    None => out.push_str(&rest[amp..amp + len]),
                }
                rest = &rest[amp + len..];
            }
            None => {
                replaced += substitute_into("&", mapping, out);
                rest = &rest[amp + 1..];
            }
        }
    }
    replaced + substitute_into(rest, mapping, out)
}

#[derive(Clone, Copy)]
enum ReferenceKind {
    Named,
    Decimal,
    Hex,
}

/// The character reference at the start of `s`: its length including the
/// `;`, and the character it decodes to when that is known.
///
/// Numeric references outside the Unicode scalar range and named references
/// other than the basic ones decode to `None`.
fn char_reference(s: &str) -> Option<(usize, Option<char>)> {
    let bytes = s.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'&'));

    let (start, kind) = match (bytes.get(1), bytes.get(2)) {
        (Some(b'#'), Some(b'x' | b'X')) => (3, ReferenceKind::Hex),
        (Some(b'#'), _) => (2, ReferenceKind::Decimal),
        (Some(c), _) if c.is_ascii_alphabetic() => (1, ReferenceKind::Named),
        _ => return None,
    };

    let body_len = bytes[start.min(bytes.len())..]
        .iter()
        .take_while(|c| match kind {
            ReferenceKind::Named => c.is_ascii_alphanumeric(),
            ReferenceKind::Decimal => c.is_ascii_digit(),
            ReferenceKind::Hex => c.is_ascii_hexdigit(),
        })
        .count();
    let end = start + body_len;
    if body_len == 0 || bytes.get(end) != Some(&b';') {
        return None;
    }

    let body = &s[start..end];
    let decoded = match kind {
        ReferenceKind::Named => named_reference(body),
        ReferenceKind::Decimal => body.parse::<u32>().ok().and_then(char::from_u32),
        ReferenceKind::Hex => u32::from_str_radix(body, 16).ok().and_then(char::from_u32),
    };
    Some((end + 1, decoded))
}

fn named_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab() -> Mapping {
        [("A", "B")].into_iter().collect()
    }

    #[test]
    fn test_style_content_is_immune() {
        assert_eq!(
            transform("<style>A</style><p>A</p>", &ab()),
            "<style>A</style><p>B</p>"
        );
    }

    #[test]
    fn test_script_content_is_immune() {
        assert_eq!(
            transform("<script>var A = 'A';</script>A", &ab()),
            "<script>var A = 'A';</script>B"
        );
    }

    #[test]
    fn test_attributes_are_immune() {
        assert_eq!(
            transform(r#"<a href="A" class="A">A</a>"#, &ab()),
            r#"<a href="A" class="A">B</a>"#
        );
    }

    #[test]
    fn test_region_tags_case_insensitive_and_verbatim() {
        assert_eq!(
            transform("<SCRIPT>A</SCRIPT>A", &ab()),
            "<SCRIPT>A</SCRIPT>B"
        );
        assert_eq!(
            transform("<Style type=text/css>A</STYLE >A", &ab()),
            "<Style type=text/css>A</STYLE >B"
        );
    }

    #[test]
    fn test_empty_mapping_round_trips() {
        let doc = "<!DOCTYPE html>\n<html><head><style>p{}</style></head>\
                   <body class=x><!-- A --><p id='A'>A &amp; B</p><?pi A?></body></html>";
        assert_eq!(transform(doc, &Mapping::new()), doc);
    }

    #[test]
    fn test_no_mapped_characters_is_identity() {
        let m: Mapping = [("Z", "Y")].into_iter().collect();
        let doc = "<div data-v=\"A\">plain text, nothing to map</div>";
        assert_eq!(transform(doc, &m), doc);
    }

    #[test]
    fn test_markup_passes_through_verbatim() {
        let m: Mapping = [("A", "B"), ("D", "X"), ("p", "q")].into_iter().collect();
        let doc = "<!DOCTYPE html><!--A--><?xml A?><![CDATA[A]]><p A=A>A</p>";
        assert_eq!(
            transform(doc, &m),
            "<!DOCTYPE html><!--A--><?xml A?><![CDATA[A]]><p A=A>B</p>"
        );
    }

    #[test]
    fn test_unquoted_and_bare_attributes_are_not_requoted() {
        let doc = "<input type=checkbox checked value=A>A";
        assert_eq!(transform(doc, &ab()), "<input type=checkbox checked value=A>B");
    }

    #[test]
    fn test_self_closing_script_still_opens_region() {
        assert_eq!(
            transform("<script/><p>A</p>", &ab()),
            "<script/><p>A</p>"
        );
        assert_eq!(
            transform("<style />A</style>A", &ab()),
            "<style />A</style>B"
        );
    }

    #[test]
    fn test_unclosed_region_persists_to_end() {
        assert_eq!(transform("A<script>A<p>A", &ab()), "B<script>A<p>A");
    }

    #[test]
    fn test_reference_spelling_is_never_substituted() {
        let m: Mapping = [("a", "x"), ("m", "y"), ("1", "9"), ("x", "z")].into_iter().collect();
        assert_eq!(
            transform("<p>a &amp; &#12354; &#x3a; & am</p>", &m),
            "<p>x &amp; &#12354; &#x3a; & xy</p>"
        );
    }

    #[test]
    fn test_numeric_references_to_mapped_characters_are_replaced() {
        let m: Mapping = [("あ", "ア")].into_iter().collect();
        assert_eq!(
            transform("<p>&#12354;&#x3042;&#X3042;あ</p>", &m),
            "<p>アアアア</p>"
        );
    }

    #[test]
    fn test_named_references_to_mapped_characters_are_replaced() {
        let m: Mapping = [("&", "＆"), ("<", "＜"), ("\u{a0}", " ")].into_iter().collect();
        let (out, stats) = transform_with_stats("<p>A&amp;B & C &lt;&gt;&nbsp;</p>", &m);
        assert_eq!(out, "<p>A＆B ＆ C ＜&gt; </p>");
        assert_eq!(stats.replaced_chars, 4);
    }

    #[test]
    fn test_unmapped_or_unknown_references_are_copied() {
        let m: Mapping = [("あ", "ア"), ("&", "＆")].into_iter().collect();
        assert_eq!(
            transform("&#12356;&copy;&#xD800;&#99999999999;&#;&amp", &m),
            "&#12356;&copy;&#xD800;&#99999999999;＆#;＆amp"
        );
    }

    #[test]
    fn test_stats() {
        let (out, stats) = transform_with_stats("<p>AA</p><style>A</style><p>c</p>", &ab());
        assert_eq!(out, "<p>BB</p><style>A</style><p>c</p>");
        assert_eq!(
            stats,
            TransformStats {
                text_nodes: 3,
                substituted_nodes: 1,
                protected_nodes: 1,
                replaced_chars: 2,
            }
        );
    }

    #[test]
    fn test_scan_mode_transitions() {
        let start = |name| Token::StartTag {
            raw: "",
            name,
            attributes: vec![],
        };
        let end = |name| Token::EndTag { raw: "", name };

        assert_eq!(ScanMode::Normal.after(&start("SCRIPT")), ScanMode::InScript);
        assert_eq!(ScanMode::Normal.after(&start("style")), ScanMode::InStyle);
        assert_eq!(ScanMode::Normal.after(&start("div")), ScanMode::Normal);
        assert_eq!(ScanMode::InScript.after(&end("Script")), ScanMode::Normal);
        assert_eq!(ScanMode::InScript.after(&end("style")), ScanMode::InScript);
        assert_eq!(ScanMode::InStyle.after(&end("style")), ScanMode::Normal);
        assert_eq!(ScanMode::Normal.after(&end("script")), ScanMode::Normal);
        assert_eq!(
            ScanMode::InStyle.after(&Token::Comment { raw: "", body: "" }),
            ScanMode::InStyle
        );
        assert!(!ScanMode::InScript.substitutes_text());
        assert!(ScanMode::Normal.substitutes_text());
    }

    #[test]
    fn test_structure_is_preserved() {
        fn structure(doc: &str) -> Vec<(String, Vec<(String, Option<String>)>)> {
            tokenize(doc)
                .filter_map(|t| match t {
                    Token::StartTag { name, attributes, .. } => Some((
                        name.to_string(),
                        attributes
                            .iter()
                            .map(|a| (a.name.to_string(), a.value.map(str::to_string)))
                            .collect(),
                    )),
                    Token::EndTag { name, .. } => Some((format!("/{name}"), vec![])),
                    _ => None,
                })
                .collect()
        }

        let m: Mapping = [("あ", "ア"), ("<", "＜"), ("a", "b")].into_iter().collect();
        let doc = "<html><body><h1 class=\"l-page__header-title\">あいう</h1>\
                   <p>a 1 < 2</p><img src=a.png alt='あ'><br/></body></html>";
        let out = transform(doc, &m);
        assert_eq!(structure(&out), structure(doc));
        assert!(out.contains("アいう"));
        assert!(out.contains("b 1 ＜ 2"));
    }
}
