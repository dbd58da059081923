mod database;
mod entry_store;

pub use database::Database;
pub use entry_store::EntryStore;
pub(crate) use entry_store::is_storable;
