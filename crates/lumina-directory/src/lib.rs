//! # lumina-directory
//!
//! The record directory engine. A [`Directory`] owns one collection
//! (artists or venues) and enforces the rules every caller shares:
//!
//! - reads merge the primary store with legacy sources and drop duplicates
//! - only the owner may change or delete a listing
//! - submissions are validated under a [`ValidationPolicy`]

pub mod dedup;
pub mod engine;
pub mod error;
pub mod map;
pub mod search;
pub mod validation;
pub mod view;

pub use dedup::{logical_key, unique_by_logical_id, LogicalKey};
pub use engine::{
    resolve_venues, Confirmation, Directory, QueryMode, Removal, SubmitWarning, Submission,
};
pub use error::{DirectoryError, FieldIssue, Problem, Result, ValidationError};
pub use map::{center, map_markers, CapacityBand, MapFilter, Marker};
pub use search::{facets, search, Facets, SearchFilter};
pub use validation::{decode_draft, decode_patch, ValidationPolicy};
pub use view::{next_view, redact_for, OwnerView};
