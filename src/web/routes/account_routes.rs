use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Router};
use axum_extra::extract::Form;
use serde::Deserialize;
use tera::Context;

use crate::db::services::{profile_service, tag_service};
use crate::web::auth::{AuthenticatedUser, Viewer};
use crate::web::{error::AppError, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/account", get(account_page).post(update_subscriptions))
}

#[derive(Deserialize)]
pub struct SubscriptionForm {
    #[serde(default)]
    tags: Vec<i32>,
}

/// Superusers get the tag administration list; members get the subscription
/// form pre-populated with their current follow set.
async fn account_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
) -> Result<Html<String>, AppError> {
    let user = viewer.require_member()?;
    if user.is_superuser {
        render_tag_admin(&state, user, None).await
    } else {
        render_subscriptions(&state, user).await
    }
}

async fn update_subscriptions(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Form(form): Form<SubscriptionForm>,
) -> Result<Html<String>, AppError> {
    let user = viewer.require_member()?;
    if user.is_superuser {
        // The admin account view has no form; a stray POST just re-renders it.
        return render_tag_admin(&state, user, None).await;
    }

    let profile = profile_service::find_by_user_id(&state.db, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    profile_service::set_followed_tags(&state.db, profile.id, &form.tags).await?;

    render_subscriptions(&state, user).await
}

pub async fn render_tag_admin(
    state: &AppState,
    user: &AuthenticatedUser,
    warning: Option<&str>,
) -> Result<Html<String>, AppError> {
    let tag_list = tag_service::list_active(&state.db).await?;
    let mut context = Context::new();
    context.insert("tag_list", &tag_list);
    context.insert("username", &user.username);
    context.insert("is_admin", &true);
    if let Some(message) = warning {
        context.insert("warning", message);
    }
    state.render("list_tags.html", &context)
}

async fn render_subscriptions(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Html<String>, AppError> {
    let tag_list = tag_service::list_active(&state.db).await?;
    let profile = profile_service::find_by_user_id(&state.db, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    let followed = profile_service::followed_active_tag_ids(&state.db, profile.id).await?;

    let mut context = Context::new();
    context.insert("tag_list", &tag_list);
    context.insert("followed_ids", &followed);
    context.insert("username", &user.username);
    context.insert("is_admin", &false);
    state.render("my_account.html", &context)
}
