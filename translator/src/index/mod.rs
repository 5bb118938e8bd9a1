//! Link list for a directory of translated pages.
//!
//! Each page's display title is taken from the element carrying the header
//! class marker (`l-page__header-title` by default). Pages without one fall
//! back to their file name.

use serde::Serialize;
use std::path::Path;

use crate::config::{Config, DEFAULT_EXTENSION, DEFAULT_OUTPUT_SUFFIX, DEFAULT_TITLE_MARKER};
use crate::error::PipelineResult;
use crate::logs::{log_error_indent, log_info, log_success_indent};
use crate::transform::pipeline::list_documents;
use crate::transform::tokenizer::{tokenize, Token};

/// Elements that may carry the title marker.
const TITLE_ELEMENTS: [&str; 6] = ["h1", "h2", "h3", "div", "span", "p"];

/// Default link target directory, relative to the page holding the list.
pub const DEFAULT_HREF_PREFIX: &str = "translated/";

/// One link of the generated list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
    pub file_name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    pub extension: String,
    /// Stripped from the stem when a page has no title
    pub output_suffix: String,
    pub title_marker: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            title_marker: DEFAULT_TITLE_MARKER.to_string(),
        }
    }
}

impl From<&Config> for IndexOptions {
    fn from(config: &Config) -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            output_suffix: config.output_suffix.clone(),
            title_marker: config.title_marker.clone(),
        }
    }
}

/// Text of the first title element in `document`.
///
/// An element qualifies when its tag is one of `h1`-`h3`, `div`, `span`, `p`
/// and its `class` contains `marker`. Capture stops at the next end tag of any
/// kind; blank text is skipped. Character references are returned as written.
pub fn extract_title(document: &str, marker: &str) -> Option<String> {
    let mut capturing = false;

    for token in tokenize(document) {
        match &token {
            Token::StartTag { name, .. }
                if !capturing
                    && TITLE_ELEMENTS.iter().any(|t| name.eq_ignore_ascii_case(t))
                    && token.attribute("class").is_some_and(|c| c.contains(marker)) =>
            {
                capturing = true;
            }
            Token::EndTag { .. } => capturing = false,
            Token::Text(text) if capturing => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Title to use for a page that has none.
fn fallback_title(file_name: &Path, suffix: &str) -> String {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix(suffix) {
        Some(base) if !suffix.is_empty() && !base.is_empty() => base.to_string(),
        _ => stem,
    }
}

/// Collect one [`LinkEntry`] per page in `dir`, sorted by file name.
///
/// Unreadable pages are logged and listed under their fallback title.
pub async fn build_link_list(dir: &Path, options: &IndexOptions) -> PipelineResult<Vec<LinkEntry>> {
    let pages = list_documents(dir, &options.extension).await?;
    log_info(format!("Extracting titles from {} page(s) in {}", pages.len(), dir.display()));

    let mut entries = Vec::with_capacity(pages.len());
    for page in pages {
        let file_name = page
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let title = match tokio::fs::read_to_string(&page).await {
            Ok(document) => extract_title(&document, &options.title_marker),
            Err(e) => {
                log_error_indent(format!("{}: {}", file_name, e), 1);
                None
            }
        }
        .unwrap_or_else(|| fallback_title(&page, &options.output_suffix));

        log_success_indent(format!("{} -> {}", file_name, title), 1);
        entries.push(LinkEntry { file_name, title });
    }

    Ok(entries)
}

/// Render entries as `<li>` items linking to `{href_prefix}{file_name}`.
pub fn render_link_list(entries: &[LinkEntry], href_prefix: &str) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "                    <li style=\"margin-bottom: 10px;\">\n\
                 \x20                       <a href=\"{}{}\">{}</a>\n\
                 \x20                   </li>",
                href_prefix, entry.file_name, entry.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MARKER: &str = DEFAULT_TITLE_MARKER;

    #[test]
    fn test_extract_title_from_marked_heading() {
        let doc = r#"<html><body><h1 class="c-x l-page__header-title">  ページ名  </h1></body></html>"#;
        assert_eq!(extract_title(doc, MARKER).as_deref(), Some("ページ名"));
    }

    #[test]
    fn test_extract_title_ignores_other_elements() {
        let doc = r#"<section class="l-page__header-title">no</section>
                     <h2 class="other">no</h2>
                     <SPAN CLASS="l-page__header-title">yes</SPAN>"#;
        assert_eq!(extract_title(doc, MARKER).as_deref(), Some("yes"));
    }

    #[test]
    fn test_extract_title_skips_blank_text_and_nested_start_tags() {
        let doc = "<div class=\"l-page__header-title\">\n   <strong>Title</strong></div>";
        assert_eq!(extract_title(doc, MARKER).as_deref(), Some("Title"));
    }

    #[test]
    fn test_extract_title_capture_ends_at_any_end_tag() {
        let doc = "<p class=\"l-page__header-title\"><b> </b>after</p>";
        assert_eq!(extract_title(doc, MARKER), None);

        let doc = "<p class=\"l-page__header-title\"></p><h3 class=\"l-page__header-title\">second</h3>";
        assert_eq!(extract_title(doc, MARKER).as_deref(), Some("second"));
    }

    #[test]
    fn test_extract_title_missing() {
        assert_eq!(extract_title("<h1>Plain</h1>", MARKER), None);
        assert_eq!(extract_title("<h1 class>Plain</h1>", MARKER), None);
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title(Path::new("a/page_translate.html"), "_translate"), "page");
        assert_eq!(fallback_title(Path::new("page.html"), "_translate"), "page");
        assert_eq!(fallback_title(Path::new("_translate.html"), "_translate"), "_translate");
        assert_eq!(fallback_title(Path::new("page.html"), ""), "page");
    }

    #[test]
    fn test_render_link_list() {
        let entries = vec![
            LinkEntry { file_name: "a.html".into(), title: "A".into() },
            LinkEntry { file_name: "b.html".into(), title: "B".into() },
        ];
        let html = render_link_list(&entries, DEFAULT_HREF_PREFIX);
        let expected = "                    <li style=\"margin-bottom: 10px;\">\n\
                        \x20                       <a href=\"translated/a.html\">A</a>\n\
                        \x20                   </li>\n\
                        \x20                   <li style=\"margin-bottom: 10px;\">\n\
                        \x20                       <a href=\"translated/b.html\">B</a>\n\
                        \x20                   </li>";
        assert_eq!(html, expected);
        assert_eq!(render_link_list(&[], DEFAULT_HREF_PREFIX), "");
    }

    #[tokio::test]
    async fn test_build_link_list() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("b_translate.html"),
            "<h1 class=\"l-page__header-title\">Bee</h1>",
        )
        .unwrap();
        fs::write(dir.path().join("a_translate.html"), "<h1>untitled</h1>").unwrap();
        fs::write(dir.path().join("c_translate.html"), [0xff, 0xfe]).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let entries = build_link_list(dir.path(), &IndexOptions::default()).await.unwrap();
        assert_eq!(
            entries,
            vec![
                LinkEntry { file_name: "a_translate.html".into(), title: "a".into() },
                LinkEntry { file_name: "b_translate.html".into(), title: "Bee".into() },
                LinkEntry { file_name: "c_translate.html".into(), title: "c".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_build_link_list_missing_dir() {
        let dir = tempdir().unwrap();
        let result = build_link_list(&dir.path().join("missing"), &IndexOptions::default()).await;
        assert!(result.is_err());
    }
}
