//! Per-character substitution.

use std::borrow::Cow;

use crate::models::Mapping;

/// Replace every character of `text` that is a key of `mapping` with its value.
///
/// Characters without an entry are copied as they are. Returns the input
/// borrowed when nothing matched.
pub fn substitute<'t>(text: &'t str, mapping: &Mapping) -> Cow<'t, str> {
    let Some((first, _)) = text
        .char_indices()
        .find(|&(_, c)| mapping.get_char(c).is_some())
    else {
        return Cow::Borrowed(text);
    };

    let mut out = String::with_capacity(text.len() + text.len() / 4);
    out.push_str(&text[..first]);
    substitute_into(&text[first..], mapping, &mut out);
    Cow::Owned(out)
}

/// Append the substituted form of `text` to `out`.
///
/// Returns the number of characters that were replaced.
pub fn substitute_into(text: &str, mapping: &Mapping, out: &mut String) -> usize {
    let mut replaced = 0;
    for c in text.chars() {
        match mapping.get_char(c) {
            Some(target) => {
                out.push_str(target);
                replaced += 1;
            }
            None => out.push(c),
        }
    }
    replaced
}
