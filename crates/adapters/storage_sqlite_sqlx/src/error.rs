//! Storage-specific error type wrapping sqlx errors.

use modhub_domain::error::ModHubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The record kept disappearing between insert and refresh.
    #[error("registration {module_id}@{home_id} changed concurrently")]
    Contended { module_id: String, home_id: String },
}

impl From<StorageError> for ModHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
