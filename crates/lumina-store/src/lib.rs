//! # lumina-store
//!
//! Persistence for directory records.
//!
//! Two backends implement [`RecordStore`]:
//! - [`LocalStore`] keeps each collection as a JSON array in `<key>.json`.
//! - [`TableStore`] keeps one SQLite table per collection, schema versioned
//!   through `PRAGMA user_version`.
//!
//! Whatever shape older builds wrote, records come back in canonical form via
//! [`normalize`].

pub mod database;
pub mod error;
pub mod local;
pub mod migrations;
pub mod normalize;
pub mod records;
pub mod snapshot;
pub mod store;
pub mod table;

pub use database::Database;
pub use error::{Result, StoreError};
pub use local::LocalStore;
pub use normalize::{decode_record, normalize, unreadable_numbers};
pub use snapshot::{export_snapshot, import_snapshot, ImportStats, Snapshot};
pub use store::RecordStore;
pub use table::TableStore;
