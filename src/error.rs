//! Store error types.
//!
//! | Error                | Raised by                          | Recoverable |
//! |----------------------|------------------------------------|-------------|
//! | `DuplicateKey`       | add / update changing `id`         | yes         |
//! | `NotFound`           | update (remove is a silent no-op)  | yes         |
//! | `MissingTransformer` | add / update with a `mimeType`     | no          |
//! | `Transform`          | a registered parser failed         | no          |
//! | `InvalidRoute`       | collection creation / path compute | no          |
//!
//! Recoverable errors are the "log and skip" class: a loader can drop the
//! offending record and keep going (see `CollectionMut::try_add_node`).

use crate::store::route::RouteError;
use thiserror::Error;

/// Errors that can occur while mutating or querying the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate id `{id}` in collection `{type_name}`")]
    DuplicateKey { type_name: String, id: String },

    #[error("no node `{key}` in collection `{type_name}`")]
    NotFound { type_name: String, key: String },

    #[error("no transformer registered for mime type `{mime_type}` (collection `{type_name}`)")]
    MissingTransformer { type_name: String, mime_type: String },

    #[error("transformer for `{mime_type}` failed")]
    Transform {
        mime_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid route `{template}` for collection `{type_name}`")]
    InvalidRoute {
        type_name: String,
        template: String,
        #[source]
        source: RouteError,
    },

    #[error("unknown collection `{0}`")]
    UnknownCollection(String),

    #[error("collection `{0}` already exists")]
    CollectionExists(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl StoreError {
    /// Whether a loader may log this error and continue with the next record.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_recoverable_classification() {
        let dup = StoreError::DuplicateKey {
            type_name: "Post".into(),
            id: "1".into(),
        };
        let missing = StoreError::NotFound {
            type_name: "Post".into(),
            key: "1".into(),
        };
        let transformer = StoreError::MissingTransformer {
            type_name: "Post".into(),
            mime_type: "text/markdown".into(),
        };

        assert!(dup.is_recoverable());
        assert!(missing.is_recoverable());
        assert!(!transformer.is_recoverable());
        assert!(!StoreError::UnknownCollection("Post".into()).is_recoverable());
    }

    #[test]
    fn test_display_names_offenders() {
        let err = StoreError::MissingTransformer {
            type_name: "Post".into(),
            mime_type: "text/markdown".into(),
        };
        let display = err.to_string();
        assert!(display.contains("text/markdown"));
        assert!(display.contains("Post"));
    }

    #[test]
    fn test_invalid_route_keeps_source() {
        let err = StoreError::InvalidRoute {
            type_name: "Post".into(),
            template: "/:tags+".into(),
            source: RouteError::EmptyRepeat("tags".into()),
        };
        assert!(err.to_string().contains("/:tags+"));
        assert!(err.source().is_some_and(|s| s.to_string().contains("tags")));
    }
}
