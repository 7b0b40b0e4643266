//! Manifest parsing, querying and in-place editing.

pub mod accessor;
pub mod document;
pub mod layout;
pub mod query;

pub use accessor::{DocumentAccessor, Edit, FileAccessor, MemoryAccessor};
pub use document::ManifestDocument;
pub use query::{DEFAULT_QUERY, FieldPath, Segment, scalar_text};
