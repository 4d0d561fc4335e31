//! Command implementations.

pub mod extract;
pub mod import;
pub mod parse;
pub mod records;
pub mod summary;

pub use self::extract::execute_extract;
pub use self::import::execute_import;
pub use self::parse::execute_parse;
pub use self::records::execute_records;
pub use self::summary::execute_summary;

use acmreg_store::SqliteStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Store shared between the source provider and record store roles.
pub type SharedStore = Arc<Mutex<SqliteStore>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, SqliteStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}
