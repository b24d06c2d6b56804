//! First-run provisioning. Account creation is otherwise outside this
//! application, so an empty installation seeds one superuser from the
//! environment to make the admin surface reachable.

use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::db::services::user_service;
use crate::services::auth_service;
use crate::web::error::AppError;

pub async fn ensure_admin_user(
    db: &DatabaseConnection,
    config: &ServerConfig,
) -> Result<(), AppError> {
    if user_service::count(db).await? > 0 {
        return Ok(());
    }

    match (
        config.bootstrap_admin_username.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) {
        (Some(username), Some(password)) => {
            auth_service::create_user(db, username, password, true).await?;
            info!(username, "created bootstrap superuser");
        }
        _ => {
            warn!(
                "no users exist and BOOTSTRAP_ADMIN_USERNAME/BOOTSTRAP_ADMIN_PASSWORD \
                 are not set; nobody will be able to log in"
            );
        }
    }

    Ok(())
}
