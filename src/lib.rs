//! sitegraph - the in-memory content graph of a static site generator.
//!
//! Holds every structured record discovered from data sources as typed
//! [`Node`]s in per-type [`Collection`]s, indexes references between them
//! so any node can find what points to it, computes URL paths from route
//! templates, and answers filtered, sorted and paginated queries.
//!
//! # Example
//!
//! ```ignore
//! let mut store = Store::new();
//! store.add_collection("Author", CollectionOptions::default())?
//!     .add_node(NodeInput::new().id("2").field("name", "Ada"))?;
//!
//! let mut books = store.add_collection(
//!     "Book",
//!     CollectionOptions::default().with_route("/books/:slug"),
//! )?;
//! books.add_node(
//!     NodeInput::new()
//!         .id("1")
//!         .field("title", "Analytical Engines")
//!         .field("author", create_reference("Author", "2")),
//! )?;
//!
//! let result = store.query_backlinks("Author", "2", &Query::new());
//! assert_eq!(result.items[0].path.as_deref(), Some("/books/analytical-engines"));
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod query;
pub mod store;
pub mod utils;

pub use config::{CONFIG_FILE_NAME, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use query::{Direction, Filter, PageInfo, PageSpec, Predicate, Query, QueryResult, Sort, evaluate};
pub use store::{
    Collection, CollectionMut, CollectionOptions, Node, NodeEvent, NodeInput, Reference,
    RemoveTarget, SharedStore, Store, Transformer, create_reference,
};
