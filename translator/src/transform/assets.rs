//! Sibling asset-folder rewrite.
//!
//! Pages saved from a browser reference their assets as `{stem}_files/...`.
//! Translated pages live one directory down from a shared `files/` folder, so
//! each reference becomes `../files/{stem}_files/...`. This is a literal
//! string replacement over the whole output, applied after the transformer.

use std::borrow::Cow;

/// Prefix inserted in front of `{stem}_files/` by default.
pub const DEFAULT_ASSET_PREFIX: &str = "../files/";

/// Rewrite every `{stem}_files/` in `content` to `{prefix}{stem}_files/`.
pub fn rewrite_asset_paths<'a>(content: &'a str, stem: &str, prefix: &str) -> Cow<'a, str> {
    if stem.is_empty() || prefix.is_empty() {
        return Cow::Borrowed(content);
    }
    let folder = format!("{}_files/", stem);
    if !content.contains(&folder) {
        return Cow::Borrowed(content);
    }
    Cow::Owned(content.replace(&folder, &format!("{}{}", prefix, folder)))
}
