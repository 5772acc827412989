// src/services/user.rs

use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::{
        enums::UserRole,
        user::{LoginRequest, LoginResponse, RegistrationRequest, RegistrationResponse, User},
    },
    services::mail::{Mailer, verification_mail},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

const SELECT_USER: &str = r#"
    SELECT
        id, name, username, password, email, role, full_name, gender, birth_year,
        phone_number, email_verified, email_verification_token,
        email_verification_token_expiry, created_at
    FROM users
"#;

pub(crate) async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE username = ?"))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Creates an unverified STUDENT or TEACHER account and mails its
/// verification link.
pub async fn register(
    pool: &SqlitePool,
    config: &Config,
    mailer: &dyn Mailer,
    role: UserRole,
    req: RegistrationRequest,
) -> Result<RegistrationResponse, AppError> {
    let username_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind(&req.username)
        .fetch_optional(pool)
        .await?;
    if username_taken.is_some() {
        tracing::warn!("{} is already being used!", req.username);
        return Err(AppError::Conflict(format!(
            "Username '{}' already exists",
            req.username
        )));
    }

    let email_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        tracing::warn!("{} is already being used!", req.email);
        return Err(AppError::Conflict(format!(
            "Email '{}' already exists",
            req.email
        )));
    }

    let password = hash_password(&req.password)?;
    let token = Uuid::new_v4().to_string();
    let now = Utc::now();
    let expiry = now + Duration::hours(config.verification_token_ttl_hours);

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (
            name, username, password, email, role, full_name, gender, birth_year,
            phone_number, email_verified, email_verification_token,
            email_verification_token_expiry, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&req.name)
    .bind(&req.username)
    .bind(&password)
    .bind(&req.email)
    .bind(role.as_str())
    .bind(&req.full_name)
    .bind(req.gender.map(|g| g.as_str()))
    .bind(req.birth_year)
    .bind(&req.phone_number)
    .bind(&token)
    .bind(expiry)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Username '{}' already exists", req.username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    // A failed verification mail rolls the account back.
    if let Err(e) = mailer
        .send(verification_mail(&req.email, &config.app_base_url, &token))
        .await
    {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        return Err(e);
    }

    tracing::info!("{} registered as {}", req.username, role);
    Ok(RegistrationResponse {
        message: format!("{} registered successfully.", req.username),
    })
}

pub async fn verify_email(pool: &SqlitePool, token: &str) -> Result<(), AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "{SELECT_USER} WHERE email_verification_token = ?"
    ))
    .bind(token)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::BadRequest("Invalid verification token".to_string()))?;

    if user.email_verified {
        return Err(AppError::BadRequest("Email already verified".to_string()));
    }

    let expired = user
        .email_verification_token_expiry
        .is_none_or(|expiry| expiry < Utc::now());
    if expired {
        return Err(AppError::BadRequest(
            "Verification token has expired".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE users
        SET email_verified = 1, email_verification_token = NULL,
            email_verification_token_expiry = NULL
        WHERE id = ?
        "#,
    )
    .bind(user.id)
    .execute(pool)
    .await?;

    tracing::info!("Email verified for {}", user.username);
    Ok(())
}

pub async fn login(
    pool: &SqlitePool,
    config: &Config,
    req: &LoginRequest,
) -> Result<LoginResponse, AppError> {
    let user = find_by_username(pool, &req.username)
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&req.password, &user.password)? {
        return Err(AppError::AuthError(
            "Invalid username or password".to_string(),
        ));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(LoginResponse {
        token,
        username: user.username,
        name: user.name,
        email: user.email,
        full_name: user.full_name,
        gender: user.gender.0,
        birth_year: user.birth_year,
        phone_number: user.phone_number,
        user_role: user.role,
        email_verified: user.email_verified,
    })
}

/// Creates the configured ADMIN account on first start.
pub async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    if find_by_username(pool, username).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", username);
    let hashed_password = hash_password(password)?;

    sqlx::query(
        r#"
        INSERT INTO users (name, username, password, email, role, full_name, email_verified, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(username)
    .bind(username)
    .bind(hashed_password)
    .bind(format!("{username}@localhost"))
    .bind(UserRole::Admin.as_str())
    .bind("Administrator")
    .bind(Utc::now())
    .execute(pool)
    .await?;

    tracing::info!("Admin user created successfully.");
    Ok(())
}
