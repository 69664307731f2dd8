//! Persistence: per-book JSON record files and the SQLite preference database.

mod prefs;
mod records;

pub use prefs::Prefs;
pub use records::{Appended, Loaded, RecordStore, StoreError};
