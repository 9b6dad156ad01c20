//! Storage for the admin panel's JSON "databases".
//!
//! Each logical database is one JSON file holding an object of records.
//! `record_store` owns load/save/record operations; `backups` owns the
//! timestamped copy naming and discovery.

pub mod backups;
pub mod record_store;

pub use backups::BackupEntry;
pub use record_store::{DatabaseSummary, Document, RecordStore, SearchResults};
