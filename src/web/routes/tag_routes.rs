use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use sea_orm::SqlErr;
use serde::Deserialize;
use tera::Context;

use super::account_routes::render_tag_admin;
use crate::db::entities::tag;
use crate::db::services::{tag_service, DeactivateError};
use crate::web::auth::Viewer;
use crate::web::{error::AppError, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tag/add", get(add_tag_page).post(add_tag_submit))
        .route("/tag/{tag_id}/edit", get(edit_tag_page).post(edit_tag_submit))
        .route("/tag/{tag_id}/delete", post(delete_tag))
}

#[derive(Deserialize)]
struct TagForm {
    name: String,
}

const NAME_MAX_LEN: usize = 64;

fn validate_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Tag name is required.".to_string());
    }
    if name.len() > NAME_MAX_LEN {
        return Err(format!("Tag name must be at most {NAME_MAX_LEN} characters."));
    }
    Ok(name.to_string())
}

fn render_tag_form(
    state: &AppState,
    action: &str,
    name_value: &str,
    errors: &[String],
) -> Result<Html<String>, AppError> {
    let mut context = Context::new();
    context.insert("action", action);
    context.insert("name_value", name_value);
    context.insert("errors", errors);
    state.render("tag_form.html", &context)
}

// --- Handlers ---

async fn add_tag_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
) -> Result<Html<String>, AppError> {
    viewer.require_admin()?;
    render_tag_form(&state, "/tag/add", "", &[])
}

async fn add_tag_submit(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Form(form): Form<TagForm>,
) -> Result<Response, AppError> {
    viewer.require_admin()?;

    let name = match validate_name(&form.name) {
        Ok(name) => name,
        Err(message) => {
            return Ok(render_tag_form(&state, "/tag/add", &form.name, &[message])?
                .into_response());
        }
    };

    match tag_service::create(&state.db, &name).await {
        Ok(_) => Ok(Redirect::to("/account").into_response()),
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Ok(render_tag_form(
                &state,
                "/tag/add",
                &name,
                &["A tag with this name already exists.".to_string()],
            )?
            .into_response()),
            _ => Err(err.into()),
        },
    }
}

async fn edit_tag_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(tag_id): Path<i32>,
) -> Result<Html<String>, AppError> {
    viewer.require_admin()?;
    let tag = find_tag(&state, tag_id).await?;
    render_tag_form(&state, &format!("/tag/{}/edit", tag.id), &tag.name, &[])
}

async fn edit_tag_submit(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(tag_id): Path<i32>,
    Form(form): Form<TagForm>,
) -> Result<Response, AppError> {
    viewer.require_admin()?;
    let tag = find_tag(&state, tag_id).await?;
    let action = format!("/tag/{}/edit", tag.id);

    let name = match validate_name(&form.name) {
        Ok(name) => name,
        Err(message) => {
            return Ok(render_tag_form(&state, &action, &form.name, &[message])?.into_response());
        }
    };

    match tag_service::rename(&state.db, tag, &name).await {
        Ok(_) => Ok(Redirect::to("/account").into_response()),
        Err(err) => match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Ok(render_tag_form(
                &state,
                &action,
                &name,
                &["A tag with this name already exists.".to_string()],
            )?
            .into_response()),
            _ => Err(err.into()),
        },
    }
}

/// Idempotent soft-delete. A storage-layer refusal is not an error to the
/// admin: the account view comes back with a warning and the tag untouched.
async fn delete_tag(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(tag_id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let user = viewer.require_admin()?.clone();
    let tag = find_tag(&state, tag_id).await?;

    match tag_service::deactivate(&state.db, tag).await {
        Ok(()) => render_tag_admin(&state, &user, None).await,
        Err(DeactivateError::StillReferenced) => {
            render_tag_admin(
                &state,
                &user,
                Some("There are values that are still referenced."),
            )
            .await
        }
        Err(DeactivateError::Db(err)) => Err(err.into()),
    }
}

async fn find_tag(state: &AppState, tag_id: i32) -> Result<tag::Model, AppError> {
    tag_service::find_by_id(&state.db, tag_id)
        .await?
        .ok_or(AppError::NotFound)
}
