//! In-memory document store standing in for a real database connection.

use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::Module;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Error returned by [`DatabaseModule`] operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DatabaseError {
    /// The table was never created.
    #[error("no such table: {0}")]
    NoSuchTable(String),
}

/// Tables of JSON documents keyed by numeric id.
#[derive(Debug, Default)]
pub struct DatabaseModule {
    tables: RwLock<HashMap<String, BTreeMap<u64, Value>>>,
}

impl DatabaseModule {
    /// Creates a table. Existing tables are kept.
    pub fn create_table(&self, name: &str) {
        self.tables.write().entry(name.to_owned()).or_default();
    }

    /// Inserts or replaces a document.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoSuchTable`] if the table does not exist.
    pub fn upsert(&self, table: &str, id: u64, document: Value) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| DatabaseError::NoSuchTable(table.to_owned()))?;
        rows.insert(id, document);
        Ok(())
    }

    /// Returns a copy of a document.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoSuchTable`] if the table does not exist.
    pub fn find(&self, table: &str, id: u64) -> Result<Option<Value>, DatabaseError> {
        let tables = self.tables.read();
        let rows = tables
            .get(table)
            .ok_or_else(|| DatabaseError::NoSuchTable(table.to_owned()))?;
        Ok(rows.get(&id).cloned())
    }

    /// Replaces a document with the result of `f`, under the table lock.
    ///
    /// `f` receives the current document, if any. Nothing is written when it
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NoSuchTable`] if the table does not exist, or
    /// the error of `f`.
    pub fn update<F, E>(&self, table: &str, id: u64, f: F) -> Result<Value, E>
    where
        F: FnOnce(Option<&Value>) -> Result<Value, E>,
        E: From<DatabaseError>,
    {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| DatabaseError::NoSuchTable(table.to_owned()))?;

        let document = f(rows.get(&id))?;
        rows.insert(id, document.clone());
        Ok(document)
    }

    /// Number of documents in a table, zero if it does not exist.
    #[must_use]
    pub fn count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, BTreeMap::len)
    }
}

impl Module for DatabaseModule {
    fn on_initialize(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        tracing::info!("database connection opened");
        Ok(())
    }

    fn on_disable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        let tables = core::mem::take(&mut *self.tables.write());
        tracing::info!(tables = tables.len(), "database connection closed");
        Ok(())
    }
}
