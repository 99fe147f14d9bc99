use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppError,
    infrastructure::{Role, SessionClaims},
    utils::{check_length, is_valid_email},
};

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// 校验通过的注册信息
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: RegisteredUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSetupResponse {
    pub has_users: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn validation_error(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors.join(", ")))
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        check_length(
            &self.username,
            1,
            50,
            "Username is required",
            "Username must be at most 50 characters",
            &mut errors,
        );
        if self.password.is_empty() {
            errors.push("Password is required".to_string());
        }
        validation_error(errors)
    }
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let mut errors = Vec::new();
        check_length(
            &self.username,
            3,
            50,
            "Username must be at least 3 characters",
            "Username must be at most 50 characters",
            &mut errors,
        );
        if !is_valid_email(&self.email) {
            errors.push("Invalid email address".to_string());
        }
        check_length(
            &self.password,
            6,
            100,
            "Password must be at least 6 characters",
            "Password must be at most 100 characters",
            &mut errors,
        );

        let role = match self.role.as_deref() {
            None => Role::default(),
            Some(role) => role.parse().unwrap_or_else(|_| {
                errors.push("Role must be one of admin, staff, viewer".to_string());
                Role::default()
            }),
        };

        validation_error(errors)?;

        Ok(NewUser {
            username: self.username,
            email: self.email,
            password: self.password,
            role,
        })
    }
}

impl User {
    pub fn role(&self) -> Result<Role, AppError> {
        self.role
            .parse()
            .map_err(|e: String| AppError::Internal(format!("user {}: {}", self.id, e)))
    }

    pub fn claims(&self) -> Result<SessionClaims, AppError> {
        Ok(SessionClaims {
            user_id: self.id.to_string(),
            username: self.username.clone(),
            role: self.role()?,
        })
    }

    pub fn summary(&self) -> Result<UserSummary, AppError> {
        Ok(UserSummary {
            id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role()?,
        })
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, is_active, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists_with(
        pool: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(pool)
        .await
    }

    pub async fn create(
        pool: &PgPool,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        tracing::debug!("Creating user: {}", new_user.username);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, role, is_active, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}
