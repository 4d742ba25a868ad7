//! `SQLite` implementation of [`ModuleRegistrationStore`].

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use modhub_app::ports::{ModuleRegistrationStore, Upserted};
use modhub_domain::error::ModHubError;
use modhub_domain::module::{ModuleRegistration, ModuleStatus};
use modhub_domain::time::Timestamp;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`ModuleRegistration`].
struct Wrapper(ModuleRegistration);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<ModuleRegistration> {
        value.map(|w| w.0)
    }

    fn many(values: Vec<Self>) -> Vec<ModuleRegistration> {
        values.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let registered_at: String = row.try_get("registered_at")?;
        let last_heartbeat: String = row.try_get("last_heartbeat")?;

        let status = status
            .parse::<ModuleStatus>()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(ModuleRegistration {
            module_id: row.try_get("module_id")?,
            home_id: row.try_get("home_id")?,
            module_type: row.try_get("module_type")?,
            base_url: row.try_get("base_url")?,
            status,
            registered_at: parse_timestamp(&registered_at)?,
            last_heartbeat: parse_timestamp(&last_heartbeat)?,
            description: row.try_get("description")?,
        }))
    }
}

fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

// Fixed-width UTC text so that SQL string comparison follows time order.
fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

const INSERT_IF_ABSENT: &str = r"
    INSERT INTO module_registrations
        (module_id, home_id, module_type, base_url, status, registered_at, last_heartbeat, description)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (module_id, home_id) DO NOTHING
    RETURNING module_id, home_id, module_type, base_url, status, registered_at, last_heartbeat, description
";

const REFRESH: &str = r"
    UPDATE module_registrations
    SET base_url = ?, description = ?, status = 'ACTIVE', last_heartbeat = MAX(?, registered_at)
    WHERE module_id = ? AND home_id = ?
    RETURNING module_id, home_id, module_type, base_url, status, registered_at, last_heartbeat, description
";

const TOUCH_HEARTBEAT: &str = r"
    UPDATE module_registrations
    SET status = 'ACTIVE', last_heartbeat = MAX(?, registered_at)
    WHERE module_id = ? AND home_id = ?
    RETURNING module_id, home_id, module_type, base_url, status, registered_at, last_heartbeat, description
";

const SELECT_BY_KEY: &str = "SELECT * FROM module_registrations WHERE module_id = ? AND home_id = ?";
const SELECT_BY_MODULE_ID: &str = "SELECT * FROM module_registrations WHERE module_id = ? ORDER BY id";
const SELECT_BY_HOME: &str = "SELECT * FROM module_registrations WHERE home_id = ? ORDER BY id";
const SELECT_BY_TYPE: &str = "SELECT * FROM module_registrations WHERE module_type = ? ORDER BY id";
const SELECT_ALL: &str = "SELECT * FROM module_registrations ORDER BY id";
const DELETE_BY_KEY: &str = "DELETE FROM module_registrations WHERE module_id = ? AND home_id = ?";

/// `SQLite`-backed module registration store.
pub struct SqliteModuleRepository {
    pool: SqlitePool,
}

impl SqliteModuleRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert_if_absent(
    pool: &SqlitePool,
    reg: &ModuleRegistration,
) -> Result<Option<ModuleRegistration>, StorageError> {
    let row: Option<Wrapper> = sqlx::query_as(INSERT_IF_ABSENT)
        .bind(&reg.module_id)
        .bind(&reg.home_id)
        .bind(&reg.module_type)
        .bind(&reg.base_url)
        .bind(reg.status.as_str())
        .bind(format_timestamp(reg.registered_at))
        .bind(format_timestamp(reg.last_heartbeat))
        .bind(reg.description.as_deref())
        .fetch_optional(pool)
        .await?;
    Ok(Wrapper::maybe(row))
}

async fn refresh(
    pool: &SqlitePool,
    reg: &ModuleRegistration,
) -> Result<Option<ModuleRegistration>, StorageError> {
    let row: Option<Wrapper> = sqlx::query_as(REFRESH)
        .bind(&reg.base_url)
        .bind(reg.description.as_deref())
        .bind(format_timestamp(reg.last_heartbeat))
        .bind(&reg.module_id)
        .bind(&reg.home_id)
        .fetch_optional(pool)
        .await?;
    Ok(Wrapper::maybe(row))
}

async fn select_many(
    pool: &SqlitePool,
    sql: &'static str,
    key: String,
) -> Result<Vec<ModuleRegistration>, ModHubError> {
    let rows: Vec<Wrapper> = sqlx::query_as(sql)
        .bind(key)
        .fetch_all(pool)
        .await
        .map_err(StorageError::from)?;
    Ok(Wrapper::many(rows))
}

impl ModuleRegistrationStore for SqliteModuleRepository {
    fn upsert(
        &self,
        registration: ModuleRegistration,
    ) -> impl Future<Output = Result<Upserted, ModHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            // A concurrent delete can land between the two statements; one
            // extra insert attempt settles it.
            for _ in 0..2 {
                if let Some(created) = insert_if_absent(&pool, &registration).await? {
                    return Ok(Upserted::Created(created));
                }
                if let Some(updated) = refresh(&pool, &registration).await? {
                    return Ok(Upserted::Updated(updated));
                }
            }
            Err(StorageError::Contended {
                module_id: registration.module_id,
                home_id: registration.home_id,
            }
            .into())
        }
    }

    fn touch_heartbeat(
        &self,
        module_id: &str,
        home_id: &str,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send {
        let pool = self.pool.clone();
        let module_id = module_id.to_owned();
        let home_id = home_id.to_owned();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(TOUCH_HEARTBEAT)
                .bind(format_timestamp(at))
                .bind(module_id)
                .bind(home_id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<Option<ModuleRegistration>, ModHubError>> + Send {
        let pool = self.pool.clone();
        let module_id = module_id.to_owned();
        let home_id = home_id.to_owned();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_KEY)
                .bind(module_id)
                .bind(home_id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_module_id(
        &self,
        module_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let pool = self.pool.clone();
        let module_id = module_id.to_owned();
        async move { select_many(&pool, SELECT_BY_MODULE_ID, module_id).await }
    }

    fn find_by_home(
        &self,
        home_id: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let pool = self.pool.clone();
        let home_id = home_id.to_owned();
        async move { select_many(&pool, SELECT_BY_HOME, home_id).await }
    }

    fn find_by_type(
        &self,
        module_type: &str,
    ) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let pool = self.pool.clone();
        let module_type = module_type.to_owned();
        async move { select_many(&pool, SELECT_BY_TYPE, module_type).await }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<ModuleRegistration>, ModHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::many(rows))
        }
    }

    fn delete(
        &self,
        module_id: &str,
        home_id: &str,
    ) -> impl Future<Output = Result<bool, ModHubError>> + Send {
        let pool = self.pool.clone();
        let module_id = module_id.to_owned();
        let home_id = home_id.to_owned();
        async move {
            let result = sqlx::query(DELETE_BY_KEY)
                .bind(module_id)
                .bind(home_id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::TimeDelta;

    async fn setup() -> SqliteModuleRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteModuleRepository::new(db.pool().clone())
    }

    fn registration(module_id: &str, home_id: &str, at: Timestamp) -> ModuleRegistration {
        ModuleRegistration::builder()
            .module_id(module_id)
            .home_id(home_id)
            .module_type("TEMPERATURE")
            .base_url("http://10.0.0.5:8081")
            .description("Temperature sensor module")
            .registered_at(at)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_registration_when_key_is_new() {
        let repo = setup().await;
        let reg = registration("temp-1", "home-A", modhub_domain::time::now());

        let result = repo.upsert(reg.clone()).await.unwrap();

        assert_eq!(result, Upserted::Created(reg.clone()));
        let fetched = repo.find("temp-1", "home-A").await.unwrap().unwrap();
        assert_eq!(fetched, reg);
    }

    #[tokio::test]
    async fn should_refresh_in_place_when_key_exists() {
        let repo = setup().await;
        let t0 = modhub_domain::time::now();
        let original = registration("m1", "h1", t0);
        repo.upsert(original.clone()).await.unwrap();

        let mut update = registration("m1", "h1", t0 + TimeDelta::minutes(2));
        update.base_url = "http://10.0.0.9:8081".to_string();
        update.module_type = "OTHER".to_string();
        update.description = None;
        let result = repo.upsert(update.clone()).await.unwrap();

        let Upserted::Updated(stored) = result else {
            panic!("expected an update, got {result:?}");
        };
        assert_eq!(stored.base_url, "http://10.0.0.9:8081");
        assert_eq!(stored.module_type, "TEMPERATURE");
        assert_eq!(stored.registered_at, t0);
        assert_eq!(stored.last_heartbeat, update.last_heartbeat);
        assert!(stored.description.is_none());
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_touch_heartbeat_and_reactivate_when_present() {
        let repo = setup().await;
        let t0 = modhub_domain::time::now();
        let mut reg = registration("m1", "h1", t0);
        reg.status = ModuleStatus::Inactive;
        repo.upsert(reg).await.unwrap();

        let later = t0 + TimeDelta::seconds(30);
        let touched = repo.touch_heartbeat("m1", "h1", later).await.unwrap().unwrap();

        assert_eq!(touched.last_heartbeat, later);
        assert_eq!(touched.status, ModuleStatus::Active);
    }

    #[tokio::test]
    async fn should_not_move_heartbeat_before_registration() {
        let repo = setup().await;
        let t0 = modhub_domain::time::now();
        repo.upsert(registration("m1", "h1", t0)).await.unwrap();

        let touched = repo
            .touch_heartbeat("m1", "h1", t0 - TimeDelta::hours(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(touched.last_heartbeat, t0);
    }

    #[tokio::test]
    async fn should_return_none_and_create_nothing_when_touching_absent_key() {
        let repo = setup().await;
        let touched = repo
            .touch_heartbeat("ghost", "h1", modhub_domain::time::now())
            .await
            .unwrap();
        assert!(touched.is_none());
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_list_in_scan_order_by_module_home_and_type() {
        let repo = setup().await;
        let now = modhub_domain::time::now();
        repo.upsert(registration("m1", "h2", now)).await.unwrap();
        repo.upsert(registration("m1", "h1", now)).await.unwrap();
        let mut lamp = registration("m2", "h1", now);
        lamp.module_type = "LAMP".to_string();
        repo.upsert(lamp).await.unwrap();

        let by_module = repo.find_by_module_id("m1").await.unwrap();
        let homes: Vec<&str> = by_module.iter().map(|r| r.home_id.as_str()).collect();
        assert_eq!(homes, vec!["h2", "h1"]);
        assert_eq!(repo.find_by_home("h1").await.unwrap().len(), 2);
        assert_eq!(repo.find_by_type("LAMP").await.unwrap().len(), 1);
        assert_eq!(repo.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_delete_only_the_addressed_key() {
        let repo = setup().await;
        let now = modhub_domain::time::now();
        repo.upsert(registration("m1", "h1", now)).await.unwrap();
        repo.upsert(registration("m1", "h2", now)).await.unwrap();

        assert!(repo.delete("m1", "h1").await.unwrap());
        assert!(!repo.delete("m1", "h1").await.unwrap());

        let remaining = repo.get_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].home_id, "h2");
    }

    #[tokio::test]
    async fn should_keep_one_record_under_concurrent_upserts() {
        let repo = std::sync::Arc::new(setup().await);
        let now = modhub_domain::time::now();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = std::sync::Arc::clone(&repo);
                let mut reg = registration("m1", "h1", now);
                reg.base_url = format!("http://10.0.0.{i}:8081");
                tokio::spawn(async move { repo.upsert(reg).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }
}
