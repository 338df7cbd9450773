//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [assets] Section Defaults
// ============================================================================

pub mod assets {
    use std::path::PathBuf;

    pub fn context() -> Option<PathBuf> {
        None
    }

    /// Extensions treated as asset references when found in field values.
    pub fn extensions() -> Vec<String> {
        [
            "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "tif", "tiff",
            "pdf", "mp3", "mp4", "webm", "ogg", "wav", "zip", "txt", "csv", "json", "yaml",
            "yml", "toml", "md", "woff", "woff2", "ttf",
        ]
        .into_iter()
        .map(Into::into)
        .collect()
    }
}

// ============================================================================
// [permalinks] Section Defaults
// ============================================================================

pub mod permalinks {
    pub fn date_field() -> String {
        "date".into()
    }
}

// ============================================================================
// [collections.*] Section Defaults
// ============================================================================

pub mod collection {
    use std::collections::BTreeMap;

    pub fn route() -> Option<String> {
        None
    }

    pub fn sort_by() -> String {
        "date".into()
    }

    pub fn date_field() -> Option<String> {
        None
    }

    pub fn refs() -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}
