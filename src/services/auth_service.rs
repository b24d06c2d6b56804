use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};

use crate::db::entities::{profile, user};
use crate::db::services::user_service;
use crate::web::auth::Claims;
use crate::web::error::AppError;

/// Creates a user together with its profile in one transaction. Used by the
/// startup bootstrap and by tests; interactive registration is out of scope.
pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    is_superuser: bool,
) -> Result<user::Model, AppError> {
    if username.is_empty() || password.len() < 8 {
        return Err(AppError::InvalidInput(
            "username must be non-empty and the password at least 8 characters".to_string(),
        ));
    }

    let password_hash =
        hash(password, DEFAULT_COST).map_err(|err| AppError::Password(err.to_string()))?;

    let now = Utc::now();
    let txn = db.begin().await?;

    let user_model = user::ActiveModel {
        username: Set(username.to_owned()),
        password_hash: Set(password_hash),
        is_superuser: Set(is_superuser),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    profile::ActiveModel {
        user_id: Set(user_model.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(user_model)
}

/// Verifies the submitted credentials. `Ok(None)` means the username or
/// password did not match; both cases deliberately look the same to the
/// caller. Credentials never reach the logs.
pub async fn login(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<user::Model>, AppError> {
    if username.is_empty() || password.is_empty() {
        return Ok(None);
    }

    let user = match user_service::find_by_username(db, username).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let valid = verify(password, &user.password_hash)
        .map_err(|err| AppError::Password(err.to_string()))?;

    Ok(valid.then_some(user))
}

/// Mints the session token carried in the cookie. 24 hour validity.
pub fn mint_session_token(user: &user::Model, secret: &str) -> Result<String, AppError> {
    let expiration = (Utc::now() + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        admin: user.is_superuser,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|err| AppError::Session(err.to_string()))
}
