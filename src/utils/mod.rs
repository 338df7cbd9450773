//! Utility modules shared by the store and the query engine.

pub mod date;
pub mod slug;
pub mod url;
