use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::auth::repo_types::User;

impl User {
    /// Find a user by (already normalised) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Insert a new user. A taken email surfaces as a unique violation.
    pub async fn create(
        db: &SqlitePool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn test_db() -> SqlitePool {
        let pool = db::connect_in_memory().await.expect("in-memory db");
        db::migrate(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn create_then_find() {
        let pool = test_db().await;
        let created = User::create(&pool, "Ada", "ada@example.com", "hash")
            .await
            .expect("insert");
        assert!(created.id > 0);

        let by_email = User::find_by_email(&pool, "ada@example.com")
            .await
            .unwrap()
            .expect("found by email");
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.name, "Ada");

        let by_id = User::find_by_id(&pool, created.id).await.unwrap().expect("found by id");
        assert_eq!(by_id.email, "ada@example.com");

        assert!(User::find_by_id(&pool, created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_unique_violation() {
        let pool = test_db().await;
        User::create(&pool, "Ada", "ada@example.com", "h1").await.unwrap();
        let err = User::create(&pool, "Other", "ada@example.com", "h2")
            .await
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: 1,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "secret-hash".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("ada@example.com"));
    }
}
