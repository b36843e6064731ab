pub mod test_helpers {
    use std::sync::Mutex;

    use chrono::{DateTime, Utc};
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;
    use tower_sessions_sqlx_store::SqliteStore;

    use crate::config::session::{SessionConfig, SessionLayer};
    use crate::models::RewardJob;
    use crate::services::RewardSink;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing.
    /// Needed when a test requires several concurrent connections.
    pub async fn create_test_db_file(
        max_connections: u32,
    ) -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        use argon2::{
            password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
            Argon2,
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
            })?
            .to_string();

        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Sets the admin profile flag.
    pub async fn make_admin(pool: &SqlitePool, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Insert an offline workshop, optionally with an active QR token.
    pub async fn create_test_workshop(
        pool: &SqlitePool,
        created_by: i64,
        title: &str,
        scheduled_at: DateTime<Utc>,
        qr_token: Option<&str>,
        capacity: Option<i64>,
    ) -> Result<i64, sqlx::Error> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO workshops
                (title, scheduled_at, location_mode, venue, capacity, qr_token,
                 created_by, created_at, updated_at)
            VALUES (?, ?, 'offline', 'Room 1', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(scheduled_at)
        .bind(capacity)
        .bind(qr_token)
        .bind(created_by)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Session layer backed by the test database, with development cookie settings.
    pub async fn create_test_session_layer(pool: &SqlitePool) -> Result<SessionLayer, sqlx::Error> {
        let store = SqliteStore::new(pool.clone())
            .with_table_name("sessions_test")
            .map_err(|e| sqlx::Error::Configuration(e.into()))?;
        store.migrate().await?;

        let config = SessionConfig {
            secure: false,
            same_site: tower_sessions::cookie::SameSite::Lax,
            expiry: time::Duration::hours(1),
            name: "attendance_test".to_string(),
        };
        Ok(config.create_layer(store))
    }

    /// Reward sink that remembers every job it receives.
    #[derive(Default)]
    pub struct RecordingRewardSink {
        pub jobs: Mutex<Vec<RewardJob>>,
    }

    impl RecordingRewardSink {
        pub fn recorded(&self) -> Vec<RewardJob> {
            self.jobs.lock().map(|jobs| jobs.clone()).unwrap_or_default()
        }
    }

    impl RewardSink for RecordingRewardSink {
        fn on_attendance_recorded(&self, user_id: i64, workshop_id: i64, workshop_title: &str) {
            if let Ok(mut jobs) = self.jobs.lock() {
                jobs.push(RewardJob {
                    user_id,
                    workshop_id,
                    workshop_title: workshop_title.to_string(),
                    amount: 0,
                });
            }
        }
    }
}
