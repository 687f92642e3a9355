use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::user::User;
use crate::repositories::stock_repository::escape_like;
use crate::utils::errors::{map_constraint_error, AppError};

// Fields of a user to insert
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: i16,
    pub location: Option<i16>,
}

// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub role: Option<i16>,
    /// `Some(None)` clears the location
    pub location: Option<Option<i16>>,
    pub is_active: Option<bool>,
}

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, role, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.name)
        .bind(user.role)
        .bind(user.location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Email is already registered"))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn count(&self, search: Option<&str>) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_search(&mut builder, search);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn list(&self, search: Option<&str>, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_search(&mut builder, search);
        builder
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok(users)
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let Some(current) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, role = $5, location = $6,
                is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.email.unwrap_or(current.email))
        .bind(changes.password_hash.unwrap_or(current.password_hash))
        .bind(changes.name.unwrap_or(current.name))
        .bind(changes.role.unwrap_or(current.role))
        .bind(changes.location.unwrap_or(current.location))
        .bind(changes.is_active.unwrap_or(current.is_active))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Email is already registered"))
    }

    /// Returns false when no such user exists
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "User has recorded stock movements and cannot be deleted"))?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" WHERE (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
