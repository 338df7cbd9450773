//! URL slugification and field-name utilities.
//!
//! Converts field values to URL-safe path segments and field names to
//! identifier-safe keys.

use std::borrow::Cow;

/// Field names starting with this prefix are kept verbatim and never show
/// up in query surfaces (`$uid`, `$loaded`, ...).
pub const RESERVED_PREFIX: char = '$';

// ============================================================================
// Slugification
// ============================================================================

/// Convert text to a lowercase ASCII slug.
///
/// Diacritics and non-Latin scripts are folded to ASCII first, then every
/// run of non-alphanumeric characters collapses to a single `-` and the
/// result is trimmed of leading/trailing hyphens.
///
/// | Input              | Output           |
/// |--------------------|------------------|
/// | `Lorem Ipsum`      | `lorem-ipsum`    |
/// | `Crème Brûlée!`    | `creme-brulee`   |
/// | `  --a__b--  `     | `a-b`            |
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Percent-encode text verbatim for use as a single path segment.
pub fn encode_raw(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

// ============================================================================
// Field Names
// ============================================================================

/// Whether a field name uses the reserved prefix.
#[inline]
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Sanitize a field name to an identifier-safe key.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, and a leading digit gets a
/// `_` prefix. Reserved names pass through untouched.
pub fn sanitize_field_name(name: &str) -> Cow<'_, str> {
    if is_reserved(name) {
        return Cow::Borrowed(name);
    }

    let is_safe = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let leading_digit = name.starts_with(|c: char| c.is_ascii_digit());

    if !name.is_empty() && !leading_digit && name.chars().all(is_safe) {
        return Cow::Borrowed(name);
    }

    let mut key = String::with_capacity(name.len() + 1);
    if leading_digit || name.is_empty() {
        key.push('_');
    }
    key.extend(name.chars().map(|c| if is_safe(c) { c } else { '_' }));
    Cow::Owned(key)
}
