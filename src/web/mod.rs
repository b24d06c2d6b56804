use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tera::{Context, Tera};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::db::services::tag_service;
use crate::services::auth_service;

pub mod auth;
pub mod error;
pub mod routes;
pub mod uploads;

use auth::{AuthenticatedUser, Viewer, SESSION_COOKIE};
use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub templates: Tera,
}

impl AppState {
    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.templates.render(template, context)?))
    }
}

pub fn create_router(state: AppState) -> Router {
    let media_service = ServeDir::new(&state.config.media_root);
    let state = Arc::new(state);

    Router::new()
        .route("/", get(index_page).post(login_submit))
        .route("/logout", get(logout))
        .route("/health", get(health_check))
        .merge(routes::account_routes::router())
        .merge(routes::tag_routes::router())
        .merge(routes::event_routes::router())
        .nest_service("/media", media_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// --- Index / login / logout ---

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn index_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
) -> Result<Html<String>, AppError> {
    match viewer.user() {
        None => render_login(&state, None),
        Some(user) => render_index(&state, user).await,
    }
}

fn render_login(state: &AppState, error: Option<&str>) -> Result<Html<String>, AppError> {
    let mut context = Context::new();
    if let Some(message) = error {
        context.insert("error", message);
    }
    state.render("login.html", &context)
}

async fn render_index(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Html<String>, AppError> {
    let tag_list = tag_service::list_active(&state.db).await?;
    let mut context = Context::new();
    context.insert("tag_list", &tag_list);
    context.insert("username", &user.username);
    context.insert("is_admin", &user.is_superuser);
    state.render("index.html", &context)
}

/// On success the session cookie is set and the index page is rendered in
/// the same response. A failed login re-renders the login page with an
/// inline error, which is also what an anonymous first visit looks like.
async fn login_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match auth_service::login(&state.db, &form.username, &form.password).await? {
        Some(user) => {
            let token = auth_service::mint_session_token(&user, &state.config.session_secret)?;
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();

            info!(username = %user.username, "login succeeded");
            let authenticated = AuthenticatedUser {
                id: user.id,
                username: user.username,
                is_superuser: user.is_superuser,
            };
            let page = render_index(&state, &authenticated).await?;
            Ok((jar.add(cookie), page).into_response())
        }
        None => {
            info!("login failed");
            Ok(render_login(&state, Some("Wrong username or password."))?.into_response())
        }
    }
}

async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/"))
}

async fn health_check() -> &'static str {
    "OK"
}
