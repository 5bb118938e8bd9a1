//! Batch and single-file translation drivers.
//!
//! These wrap the pure [`transform`](super::rewriter::transform) with file
//! I/O, the asset-path rewrite and progress logging.
//!
//! # Example
//!
//! ```rust,ignore
//! use moji::{load_mapping, translate_directory, BatchOptions, MappingColumns};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loaded = load_mapping("taiouhyou.csv", &MappingColumns::default())?;
//!     let options = BatchOptions::new("original", "translated");
//!     let report = translate_directory(&options, Arc::new(loaded.mapping)).await?;
//!
//!     println!("{} translated, {} failed", report.success_count(), report.failure_count());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::assets::{rewrite_asset_paths, DEFAULT_ASSET_PREFIX};
use super::rewriter::{transform_with_stats, TransformStats};
use crate::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_EXTENSION, DEFAULT_OUTPUT_SUFFIX};
use crate::error::{DocumentError, DocumentResult, PipelineError, PipelineResult};
use crate::logs::{log_error_indent, log_info, log_success, log_success_indent, log_warning};
use crate::models::Mapping;

/// Per-document options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Appended to the input stem to name the output file
    pub output_suffix: String,
    /// Prefix for `{stem}_files/` references; `None` leaves them alone
    pub asset_prefix: Option<String>,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            asset_prefix: Some(DEFAULT_ASSET_PREFIX.to_string()),
        }
    }
}

/// Options for a directory run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of the documents to pick up (without the dot, case-insensitive)
    pub extension: String,
    /// Documents in flight at once
    pub concurrency: usize,
    pub translate: TranslateOptions,
}

impl BatchOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            translate: TranslateOptions::default(),
        }
    }

    /// Options for a directory run with the settings of `config`.
    pub fn from_config(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: &Config,
    ) -> Self {
        Self {
            concurrency: config.concurrency,
            translate: TranslateOptions {
                output_suffix: config.output_suffix.clone(),
                asset_prefix: Some(config.asset_prefix.clone()),
            },
            ..Self::new(input_dir, output_dir)
        }
    }
}

/// A document that was translated and written
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: TransformStats,
    /// Whether any `{stem}_files/` reference was rewritten
    pub assets_rewritten: bool,
}

/// A document that could not be translated
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Outcome of a directory run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub succeeded: Vec<FileOutcome>,
    pub failed: Vec<FileFailure>,
    success_count: usize,
    failure_count: usize,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    /// True when every document was translated
    pub fn is_complete(&self) -> bool {
        self.failure_count == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.success_count(),
            self.failure_count()
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Name of the translated file: `{stem}{suffix}.{ext}`.
pub fn output_file_name(input: &Path, suffix: &str) -> Option<String> {
    let stem = input.file_stem()?.to_string_lossy();
    Some(match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    })
}

/// Transform one document in memory and rewrite its asset references.
///
/// `stem` is the input file name without extension.
pub fn translate_document(
    document: &str,
    stem: &str,
    mapping: &Mapping,
    options: &TranslateOptions,
) -> (String, TransformStats, bool) {
    let (translated, stats) = transform_with_stats(document, mapping);
    match options.asset_prefix.as_deref() {
        Some(prefix) => {
            let rewritten = rewrite_asset_paths(&translated, stem, prefix).into_owned();
            let changed = rewritten != translated;
            (rewritten, stats, changed)
        }
        None => (translated, stats, false),
    }
}

/// Translate a single file into `output_dir`.
pub async fn translate_file(
    input: &Path,
    output_dir: &Path,
    mapping: &Mapping,
    options: &TranslateOptions,
) -> DocumentResult<FileOutcome> {
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| DocumentError::reading(input, e))?;
    let document = String::from_utf8(bytes).map_err(|e| {
        DocumentError::reading(
            input,
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.utf8_error()),
        )
    })?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (translated, stats, assets_rewritten) =
        translate_document(&document, &stem, mapping, options);

    let file_name = output_file_name(input, &options.output_suffix).ok_or_else(|| {
        DocumentError::reading(
            input,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let output = output_dir.join(file_name);

    tokio::fs::write(&output, translated)
        .await
        .map_err(|e| DocumentError::writing(&output, e))?;

    Ok(FileOutcome {
        input: input.to_path_buf(),
        output,
        stats,
        assets_rewritten,
    })
}

/// Translate a single file next to itself (`page.html` -> `page_translate.html`).
pub async fn translate_file_in_place(
    input: &Path,
    mapping: &Mapping,
    options: &TranslateOptions,
) -> DocumentResult<FileOutcome> {
    let dir = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    translate_file(input, &dir, mapping, options).await
}

/// Files directly inside `dir` with the given extension, sorted by name.
pub async fn list_documents(dir: &Path, extension: &str) -> PipelineResult<Vec<PathBuf>> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(PipelineError::InputDirNotFound(dir.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PipelineError::InputDirNotFound(dir.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut documents = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches_ext = path
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension));
        if matches_ext && tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

/// Translate every matching document of `options.input_dir` into `options.output_dir`.
///
/// A failing document is logged and recorded in the report; the rest of the
/// batch still runs. Only directory-level problems are returned as errors.
pub async fn translate_directory(
    options: &BatchOptions,
    mapping: Arc<Mapping>,
) -> PipelineResult<BatchReport> {
    let started_at = Utc::now();

    let documents = list_documents(&options.input_dir, &options.extension).await?;
    if documents.is_empty() {
        return Err(PipelineError::NoDocuments {
            dir: options.input_dir.clone(),
            extension: options.extension.clone(),
        });
    }

    tokio::fs::create_dir_all(&options.output_dir).await?;

    log_info(format!(
        "Translating {} document(s) from {} into {}",
        documents.len(),
        options.input_dir.display(),
        options.output_dir.display()
    ));

    let mut results = stream::iter(documents.into_iter().enumerate())
        .map(|(index, path)| {
            let mapping = Arc::clone(&mapping);
            async move {
                let result =
                    translate_file(&path, &options.output_dir, &mapping, &options.translate).await;
                (index, path, result)
            }
        })
        .buffer_unordered(options.concurrency.max(1));

    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    while let Some((index, path, result)) = results.next().await {
        let name = display_name(&path);
        match result {
            Ok(outcome) => {
                log_success_indent(
                    format!(
                        "{} -> {} ({} characters replaced)",
                        name,
                        display_name(&outcome.output),
                        outcome.stats.replaced_chars
                    ),
                    1,
                );
                succeeded.push((index, outcome));
            }
            Err(err) => {
                log_error_indent(format!("{}: {}", name, err), 1);
                failed.push((
                    index,
                    FileFailure {
                        input: path,
                        error: err.to_string(),
                    },
                ));
            }
        }
    }

    // Report in input order regardless of completion order.
    succeeded.sort_by_key(|(index, _)| *index);
    failed.sort_by_key(|(index, _)| *index);

    let report = BatchReport {
        input_dir: options.input_dir.clone(),
        output_dir: options.output_dir.clone(),
        started_at,
        finished_at: Utc::now(),
        success_count: succeeded.len(),
        failure_count: failed.len(),
        succeeded: succeeded.into_iter().map(|(_, o)| o).collect(),
        failed: failed.into_iter().map(|(_, f)| f).collect(),
    };

    if report.is_complete() {
        log_success(format!("Done: {}", report.summary()));
    } else {
        log_warning(format!("Done: {}", report.summary()));
    }

    Ok(report)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn mapping() -> Arc<Mapping> {
        Arc::new([("あ", "ア"), ("A", "B")].into_iter().collect())
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            output_file_name(Path::new("in/page.html"), "_translate").as_deref(),
            Some("page_translate.html")
        );
        assert_eq!(
            output_file_name(Path::new("README"), "_t").as_deref(),
            Some("README_t")
        );
        assert_eq!(output_file_name(Path::new("/"), "_t"), None);
    }

    #[test]
    fn test_translate_document_rewrites_assets_after_transform() {
        let doc = r#"<img src="A_files/A.png">A"#;
        let (out, stats, rewritten) =
            translate_document(doc, "A", &mapping(), &TranslateOptions::default());
        assert_eq!(out, r#"<img src="../files/A_files/A.png">B"#);
        assert_eq!(stats.replaced_chars, 1);
        assert!(rewritten);

        let options = TranslateOptions {
            asset_prefix: None,
            ..TranslateOptions::default()
        };
        let (out, _, rewritten) = translate_document(doc, "A", &mapping(), &options);
        assert_eq!(out, r#"<img src="A_files/A.png">B"#);
        assert!(!rewritten);
    }

    #[test]
    fn test_default_options() {
        let opts = BatchOptions::new("original", "translated");
        assert_eq!(opts.extension, "html");
        assert_eq!(opts.concurrency, 4);
        assert_eq!(opts.translate.output_suffix, "_translate");
        assert_eq!(opts.translate.asset_prefix.as_deref(), Some("../files/"));
    }

    #[tokio::test]
    async fn test_translate_directory_continues_after_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("original");
        let output = dir.path().join("translated");
        fs::create_dir(&input).unwrap();

        fs::write(
            input.join("b.html"),
            "<p>あ</p><img src=\"b_files/x.png\"><script>あ</script>",
        )
        .unwrap();
        fs::write(input.join("a.HTML"), "<p>A</p>").unwrap();
        fs::write(input.join("bad.html"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(input.join("notes.txt"), "あ").unwrap();

        let options = BatchOptions::new(&input, &output);
        let report = translate_directory(&options, mapping()).await.unwrap();

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert!(!report.is_complete());
        assert!(report.failed[0].input.ends_with("bad.html"));
        assert!(report.failed[0].error.contains("bad.html"));

        // Sorted by input path
        assert!(report.succeeded[0].input.ends_with("a.HTML"));
        assert!(report.succeeded[1].input.ends_with("b.html"));

        assert_eq!(
            fs::read_to_string(output.join("a_translate.HTML")).unwrap(),
            "<p>B</p>"
        );
        assert_eq!(
            fs::read_to_string(output.join("b_translate.html")).unwrap(),
            "<p>ア</p><img src=\"../files/b_files/x.png\"><script>あ</script>"
        );
        assert!(!output.join("notes_translate.txt").exists());

        let json = report.to_json().unwrap();
        assert!(json.contains("\"succeeded\""));
        assert!(json.contains("\"replacedChars\""));
        assert!(json.contains("\"failureCount\": 1"));
    }

    #[tokio::test]
    async fn test_missing_input_dir() {
        let dir = tempdir().unwrap();
        let options = BatchOptions::new(dir.path().join("nope"), dir.path().join("out"));
        let err = translate_directory(&options, mapping()).await.unwrap_err();
        assert!(matches!(err, PipelineError::InputDirNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_input_dir() {
        let dir = tempdir().unwrap();
        let options = BatchOptions::new(dir.path(), dir.path().join("out"));
        let err = translate_directory(&options, mapping()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoDocuments { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_translate_file_in_place_and_missing_input() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(&page, "<title>A</title>").unwrap();

        let options = TranslateOptions {
            asset_prefix: None,
            ..TranslateOptions::default()
        };
        let outcome = translate_file_in_place(&page, &mapping(), &options).await.unwrap();
        assert_eq!(outcome.output, dir.path().join("page_translate.html"));
        assert_eq!(fs::read_to_string(&outcome.output).unwrap(), "<title>B</title>");

        let err = translate_file_in_place(&dir.path().join("gone.html"), &mapping(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.html");
        fs::write(&page, "A").unwrap();

        let missing_out = dir.path().join("no/such/dir");
        let err = translate_file(&page, &missing_out, &mapping(), &TranslateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::DocumentWriteError { .. }));
    }
}
