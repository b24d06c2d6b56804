use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tera::Context;

use crate::db::entities::event;
use crate::db::services::{event_service, profile_service, tag_service, DeactivateError};
use crate::web::auth::{AuthenticatedUser, Viewer};
use crate::web::uploads::{self, EventForm};
use crate::web::{error::AppError, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{event_id}", get(event_detail))
        .route("/event/add", get(add_event_page).post(add_event_submit))
        .route(
            "/event/{event_id}/edit",
            get(edit_event_page).post(edit_event_submit),
        )
        .route("/event/{event_id}/delete", post(delete_event))
}

#[derive(Deserialize)]
struct ListQuery {
    tag: Option<String>,
}

/// An event with its derived image file name, paired per row rather than
/// carried in a parallel list.
#[derive(Serialize)]
struct EventRow {
    event: event::Model,
    image_name: String,
}

// --- Listing and detail ---

async fn list_events(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let user = viewer.require_member()?.clone();
    render_event_list(&state, &user, query.tag.as_deref(), None).await
}

pub async fn render_event_list(
    state: &AppState,
    user: &AuthenticatedUser,
    tag_filter: Option<&str>,
    warning: Option<&str>,
) -> Result<Html<String>, AppError> {
    let events = if user.is_superuser {
        event_service::visible_to_admin(&state.db, tag_filter).await?
    } else {
        let profile = profile_service::find_by_user_id(&state.db, user.id)
            .await?
            .ok_or(AppError::NotFound)?;
        event_service::visible_to_member(&state.db, profile.id, Utc::now(), tag_filter).await?
    };

    let rows = events
        .into_iter()
        .map(|event| {
            let image_name = uploads::display_name(&event.image)
                .map_err(|err| AppError::Media(err.to_string()))?
                .to_owned();
            Ok(EventRow { event, image_name })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let tag_list = tag_service::list_active(&state.db).await?;
    let mut context = Context::new();
    context.insert("tag_list", &tag_list);
    context.insert("events", &rows);
    context.insert("username", &user.username);
    context.insert("is_admin", &user.is_superuser);
    if let Some(name) = tag_filter {
        context.insert("active_filter", name);
    }
    if let Some(message) = warning {
        context.insert("warning", message);
    }
    state.render("list.html", &context)
}

async fn event_detail(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(event_id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let user = viewer.require_member()?;
    let event = find_event(&state, event_id).await?;

    let image_name = uploads::display_name(&event.image)
        .map_err(|err| AppError::Media(err.to_string()))?
        .to_owned();
    let image_url = format!("/{}", event.image);
    let tag_list = tag_service::list_active(&state.db).await?;

    let mut context = Context::new();
    context.insert("tag_list", &tag_list);
    context.insert("event", &event);
    context.insert("image_name", &image_name);
    context.insert("image_url", &image_url);
    context.insert("username", &user.username);
    context.insert("is_admin", &user.is_superuser);
    state.render("detail.html", &context)
}

// --- Admin: add / edit / delete ---

async fn add_event_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
) -> Result<Html<String>, AppError> {
    viewer.require_admin()?;
    render_event_form(&state, "/event/add", &EventForm::default(), &[]).await
}

async fn add_event_submit(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    multipart: Multipart,
) -> Result<Response, AppError> {
    viewer.require_admin()?;
    let form = uploads::read_event_form(multipart).await?;

    let validated = match uploads::validate_event_form(&form, true) {
        Ok(validated) => validated,
        Err(errors) => {
            return Ok(render_event_form(&state, "/event/add", &form, &errors)
                .await?
                .into_response());
        }
    };

    // validate_event_form guarantees the image on the add path
    let image = form
        .image
        .as_ref()
        .ok_or_else(|| AppError::Media("missing upload after validation".to_string()))?;
    let stored = uploads::store_image(&state.config.media_root, image).await?;

    event_service::create(
        &state.db,
        event_service::EventInput {
            title: validated.title,
            description: validated.description,
            date: validated.date,
            tag_ids: validated.tag_ids,
        },
        stored,
    )
    .await?;

    Ok(Redirect::to("/events").into_response())
}

async fn edit_event_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(event_id): Path<i32>,
) -> Result<Html<String>, AppError> {
    viewer.require_admin()?;
    let event = find_event(&state, event_id).await?;
    let tag_ids = event_service::tag_ids_for_event(&state.db, event.id).await?;

    let form = EventForm {
        title: event.title.clone(),
        description: event.description.clone(),
        date: event.date.format("%Y-%m-%dT%H:%M").to_string(),
        tag_ids,
        image: None,
    };
    render_event_form(&state, &format!("/event/{}/edit", event.id), &form, &[]).await
}

async fn edit_event_submit(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(event_id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    viewer.require_admin()?;
    let event = find_event(&state, event_id).await?;
    let action = format!("/event/{}/edit", event.id);

    let form = uploads::read_event_form(multipart).await?;
    let validated = match uploads::validate_event_form(&form, false) {
        Ok(validated) => validated,
        Err(errors) => {
            return Ok(render_event_form(&state, &action, &form, &errors)
                .await?
                .into_response());
        }
    };

    let stored = match form.image.as_ref() {
        Some(image) => Some(uploads::store_image(&state.config.media_root, image).await?),
        None => None,
    };

    event_service::update(
        &state.db,
        event,
        event_service::EventInput {
            title: validated.title,
            description: validated.description,
            date: validated.date,
            tag_ids: validated.tag_ids,
        },
        stored,
    )
    .await?;

    Ok(Redirect::to("/events").into_response())
}

/// Mirrors the tag delete contract, returning the event listing instead of
/// the account view.
async fn delete_event(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(event_id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let user = viewer.require_admin()?.clone();
    let event = find_event(&state, event_id).await?;

    match event_service::deactivate(&state.db, event).await {
        Ok(()) => render_event_list(&state, &user, None, None).await,
        Err(DeactivateError::StillReferenced) => {
            render_event_list(
                &state,
                &user,
                None,
                Some("There are values that are still referenced."),
            )
            .await
        }
        Err(DeactivateError::Db(err)) => Err(err.into()),
    }
}

async fn render_event_form(
    state: &AppState,
    action: &str,
    form: &EventForm,
    errors: &[String],
) -> Result<Html<String>, AppError> {
    let tag_list = tag_service::list_active(&state.db).await?;
    let mut context = Context::new();
    context.insert("action", action);
    context.insert("tag_list", &tag_list);
    context.insert("title_value", &form.title);
    context.insert("description_value", &form.description);
    context.insert("date_value", &form.date);
    context.insert("selected_ids", &form.tag_ids);
    context.insert("errors", errors);
    state.render("event_form.html", &context)
}

async fn find_event(state: &AppState, event_id: i32) -> Result<event::Model, AppError> {
    event_service::find_by_id(&state.db, event_id)
        .await?
        .ok_or(AppError::NotFound)
}
