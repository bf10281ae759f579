//! User accounts stored in the database.

use crate::database::{DatabaseError, DatabaseModule};
use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::{Module, ModuleId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

const TABLE: &str = "users";

/// A chat user known to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform user id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Number of commands the user ran.
    pub commands_used: u64,
}

/// Error returned by [`UsersModule`] operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// The module was used before it was initialized.
    #[error("users module is not initialized")]
    NotInitialized,

    /// The storage layer failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A stored document is not a valid user.
    #[error("corrupt user record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// User repository backed by [`DatabaseModule`].
#[derive(Debug, Default)]
pub struct UsersModule {
    database: OnceLock<Arc<DatabaseModule>>,
}

impl UsersModule {
    fn database(&self) -> Result<&DatabaseModule, UserError> {
        self.database
            .get()
            .map(Arc::as_ref)
            .ok_or(UserError::NotInitialized)
    }

    /// Returns the user, creating it on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`UserError`] if the record cannot be stored or read.
    pub fn get_or_create(&self, id: u64, name: &str) -> Result<User, UserError> {
        if let Some(user) = self.find(id)? {
            return Ok(user);
        }

        let user = User {
            id,
            name: name.to_owned(),
            commands_used: 0,
        };
        self.save(&user)?;
        tracing::debug!(user = id, "created user");
        Ok(user)
    }

    /// Looks up a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError`] if the record cannot be read.
    pub fn find(&self, id: u64) -> Result<Option<User>, UserError> {
        self.database()?
            .find(TABLE, id)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(UserError::from)
    }

    /// Stores a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError`] if the record cannot be stored.
    pub fn save(&self, user: &User) -> Result<(), UserError> {
        let document = serde_json::to_value(user)?;
        self.database()?.upsert(TABLE, user.id, document)?;
        Ok(())
    }

    /// Counts one more command for the user, creating it on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`UserError`] if the record cannot be read or stored.
    pub fn record_command(&self, id: u64, name: &str) -> Result<User, UserError> {
        let document = self.database()?.update(TABLE, id, |current| {
            let mut user = match current {
                Some(document) => User::deserialize(document)?,
                None => User {
                    id,
                    name: name.to_owned(),
                    commands_used: 0,
                },
            };
            user.commands_used += 1;
            Ok::<_, UserError>(serde_json::to_value(&user)?)
        })?;
        Ok(serde_json::from_value(document)?)
    }

    /// Number of known users.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotInitialized`] before startup.
    pub fn count(&self) -> Result<usize, UserError> {
        Ok(self.database()?.count(TABLE))
    }
}

impl Module for UsersModule {
    fn dependencies(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<DatabaseModule>()]
    }

    fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        let database = ctx.get_module_or_err::<DatabaseModule>()?;
        database.create_table(TABLE);

        if self.database.set(database).is_err() {
            return Err(ModuleError::failed("users module initialized twice"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_before_initialize() {
        let users = UsersModule::default();
        assert!(matches!(users.count(), Err(UserError::NotInitialized)));
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let users = UsersModule::default();
        let database = Arc::new(DatabaseModule::default());
        database.create_table(TABLE);
        users.database.set(database).unwrap();

        let first = users.get_or_create(1, "ada").unwrap();
        let second = users.get_or_create(1, "someone else").unwrap();

        assert_eq!(first, second);
        assert_eq!(users.count().unwrap(), 1);
    }

    #[test]
    fn concurrent_commands_are_all_counted() {
        let users = Arc::new(UsersModule::default());
        let database = Arc::new(DatabaseModule::default());
        database.create_table(TABLE);
        users.database.set(database).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let users = Arc::clone(&users);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        users.record_command(1, "ada").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        assert_eq!(users.find(1).unwrap().unwrap().commands_used, 200);
    }
}
