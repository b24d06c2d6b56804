//! Integration tests: a real server on a random port, a temp-dir SQLite
//! database, and reqwest with a cookie store driving the rendered pages.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tempfile::TempDir;

use crate::config::ServerConfig;
use crate::db::entities::{event, event_tag, tag};
use crate::db::services::{
    classify_deactivate_err, event_service, profile_service, tag_service, DeactivateError,
};
use crate::services::auth_service;
use crate::web::AppState;
use crate::{db, templates, web};

struct TestFixture {
    client: Client,
    base_url: String,
    db: DatabaseConnection,
    media_root: std::path::PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = db::connect(&database_url).await.expect("failed to connect");
        db::ensure_schema(&db).await.expect("failed to create schema");

        let media_root = temp_dir.path().join("media");
        let config = ServerConfig {
            database_url,
            bind_addr: "127.0.0.1:0".to_string(),
            session_secret: "test-session-secret".to_string(),
            media_root: media_root.clone(),
            bootstrap_admin_username: None,
            bootstrap_admin_password: None,
        };

        let state = AppState {
            db: db.clone(),
            config: Arc::new(config),
            templates: templates::build().expect("failed to build templates"),
        };
        let app = web::create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        TestFixture {
            client: new_client(),
            base_url: format!("http://{addr}"),
            db,
            media_root,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn seed_admin(&self) {
        auth_service::create_user(&self.db, "admin", "admin-password", true)
            .await
            .expect("failed to seed admin");
    }

    async fn seed_member(&self, username: &str) {
        auth_service::create_user(&self.db, username, "member-password", false)
            .await
            .expect("failed to seed member");
    }

    async fn seed_tag(&self, name: &str) -> tag::Model {
        tag_service::create(&self.db, name)
            .await
            .expect("failed to seed tag")
    }

    async fn seed_event(
        &self,
        title: &str,
        date: DateTime<Utc>,
        tag_ids: Vec<i32>,
    ) -> event::Model {
        event_service::create(
            &self.db,
            event_service::EventInput {
                title: title.to_string(),
                description: format!("{title} description"),
                date,
                tag_ids,
            },
            format!("media/events/seed/{}.jpg", title.replace(' ', "-")),
        )
        .await
        .expect("failed to seed event")
    }

    async fn login_with(&self, client: &Client, username: &str, password: &str) -> String {
        let resp = client
            .post(self.url("/"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("login request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.text().await.expect("login body")
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let client = self.client.clone();
        self.login_with(&client, username, password).await
    }

    async fn get_text(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
            .text()
            .await
            .expect("body")
    }

    async fn follow_tags(&self, username: &str, tag_ids: &[i32]) {
        let user = crate::db::services::user_service::find_by_username(&self.db, username)
            .await
            .expect("user lookup")
            .expect("user missing");
        let profile = profile_service::find_by_user_id(&self.db, user.id)
            .await
            .expect("profile lookup")
            .expect("profile missing");
        profile_service::set_followed_tags(&self.db, profile.id, tag_ids)
            .await
            .expect("failed to set follows");
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("failed to build client")
}

// --- Login / logout / index ---

#[tokio::test]
async fn health_check_responds() {
    let fixture = TestFixture::new().await;
    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn anonymous_index_shows_login_page() {
    let fixture = TestFixture::new().await;
    let resp = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("<h1>Log in</h1>"));
    assert!(!body.contains("Categories"));
}

#[tokio::test]
async fn successful_login_lists_active_tags() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.seed_tag("Yoga").await;
    fixture.seed_tag("Climbing").await;

    let body = fixture.login("admin", "admin-password").await;
    assert!(body.contains("Categories"));
    assert!(body.contains("Yoga"));
    assert!(body.contains("Climbing"));

    // The session cookie sticks for follow-up requests.
    let resp = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert!(resp.text().await.unwrap().contains("Categories"));
}

#[tokio::test]
async fn failed_login_shows_error_on_login_page() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;

    let body = fixture.login("admin", "wrong-password").await;
    assert!(body.contains("Wrong username or password."));
    assert!(body.contains("<h1>Log in</h1>"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.login("admin", "admin-password").await;

    let resp = fixture
        .client
        .get(fixture.url("/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/");

    let resp = fixture
        .client
        .get(fixture.url("/events"))
        .send()
        .await
        .unwrap();
    // Redirected back to the login page.
    assert_eq!(resp.url().path(), "/");
    assert!(resp.text().await.unwrap().contains("<h1>Log in</h1>"));
}

#[tokio::test]
async fn anonymous_event_listing_redirects_to_login() {
    let fixture = TestFixture::new().await;
    let resp = fixture
        .client
        .get(fixture.url("/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/");
    assert!(resp.text().await.unwrap().contains("<h1>Log in</h1>"));
}

// --- Tag administration ---

#[tokio::test]
async fn tag_add_requires_superuser() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("casual").await;
    fixture.login("casual", "member-password").await;

    let resp = fixture
        .client
        .post(fixture.url("/tag/add"))
        .form(&[("name", "Yoga")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let count = tag::Entity::find().all(&fixture.db).await.unwrap().len();
    assert_eq!(count, 0, "no tag may be created by a non-superuser");
}

#[tokio::test]
async fn admin_adds_a_tag_and_lands_on_account_view() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.login("admin", "admin-password").await;

    let resp = fixture
        .client
        .post(fixture.url("/tag/add"))
        .form(&[("name", "Yoga")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/account");

    let created = tag::Entity::find()
        .filter(tag::Column::Name.eq("Yoga"))
        .one(&fixture.db)
        .await
        .unwrap();
    assert!(created.is_some_and(|tag| tag.is_active));
}

#[tokio::test]
async fn tag_form_redisplays_on_validation_failure() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.login("admin", "admin-password").await;

    let resp = fixture
        .client
        .post(fixture.url("/tag/add"))
        .form(&[("name", "   ")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/tag/add");
    assert!(resp.text().await.unwrap().contains("Tag name is required."));

    assert!(tag::Entity::find()
        .one(&fixture.db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_tag_name_redisplays_with_error() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.seed_tag("Yoga").await;
    fixture.login("admin", "admin-password").await;

    let resp = fixture
        .client
        .post(fixture.url("/tag/add"))
        .form(&[("name", "Yoga")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains("A tag with this name already exists."));
}

#[tokio::test]
async fn editing_a_missing_tag_is_not_found() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.login("admin", "admin-password").await;

    let resp = fixture
        .client
        .get(fixture.url("/tag/9999/edit"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_renames_a_tag() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    let seeded = fixture.seed_tag("Yogga").await;
    fixture.login("admin", "admin-password").await;

    let resp = fixture
        .client
        .post(fixture.url(&format!("/tag/{}/edit", seeded.id)))
        .form(&[("name", "Yoga")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/account");

    let renamed = tag_service::find_by_id(&fixture.db, seeded.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "Yoga");
}

#[tokio::test]
async fn tag_soft_delete_is_idempotent() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    let seeded = fixture.seed_tag("Yoga").await;
    fixture.login("admin", "admin-password").await;

    for _ in 0..2 {
        let resp = fixture
            .client
            .post(fixture.url(&format!("/tag/{}/delete", seeded.id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.text().await.unwrap().contains("Tag administration"));
    }

    let stored = tag_service::find_by_id(&fixture.db, seeded.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active);
}

#[tokio::test]
async fn inactive_tags_leave_listings_and_choices() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.seed_member("casual").await;
    fixture.seed_tag("Yoga").await;
    let retired = fixture.seed_tag("Retired").await;
    tag_service::deactivate(&fixture.db, retired).await.unwrap();

    let body = fixture.login("admin", "admin-password").await;
    assert!(body.contains("Yoga"));
    assert!(!body.contains("Retired"));

    let member = new_client();
    fixture
        .login_with(&member, "casual", "member-password")
        .await;
    let body = member
        .get(fixture.url("/account"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Yoga"));
    assert!(!body.contains("Retired"));
}

// --- Subscriptions ---

#[tokio::test]
async fn member_updates_followed_tags() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("casual").await;
    let yoga = fixture.seed_tag("Yoga").await;
    let climbing = fixture.seed_tag("Climbing").await;
    fixture.login("casual", "member-password").await;

    let resp = fixture
        .client
        .post(fixture.url("/account"))
        .form(&[("tags", yoga.id.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("My account"));

    let user = crate::db::services::user_service::find_by_username(&fixture.db, "casual")
        .await
        .unwrap()
        .unwrap();
    let profile = profile_service::find_by_user_id(&fixture.db, user.id)
        .await
        .unwrap()
        .unwrap();
    let followed = profile_service::followed_active_tag_ids(&fixture.db, profile.id)
        .await
        .unwrap();
    assert_eq!(followed, vec![yoga.id]);
    assert!(!followed.contains(&climbing.id));
}

#[tokio::test]
async fn inactive_tag_ids_are_not_subscribable() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("casual").await;
    let yoga = fixture.seed_tag("Yoga").await;
    let retired = fixture.seed_tag("Retired").await;
    let retired_id = retired.id;
    tag_service::deactivate(&fixture.db, retired).await.unwrap();
    fixture.login("casual", "member-password").await;

    fixture
        .client
        .post(fixture.url("/account"))
        .form(&[
            ("tags", yoga.id.to_string()),
            ("tags", retired_id.to_string()),
        ])
        .send()
        .await
        .unwrap();

    let user = crate::db::services::user_service::find_by_username(&fixture.db, "casual")
        .await
        .unwrap()
        .unwrap();
    let profile = profile_service::find_by_user_id(&fixture.db, user.id)
        .await
        .unwrap()
        .unwrap();
    let followed = profile_service::followed_active_tag_ids(&fixture.db, profile.id)
        .await
        .unwrap();
    assert_eq!(followed, vec![yoga.id]);
}

// --- Event visibility ---

#[tokio::test]
async fn member_sees_only_followed_future_active_events() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.seed_member("casual").await;
    let yoga = fixture.seed_tag("Yoga").await;
    let climbing = fixture.seed_tag("Climbing").await;
    fixture.follow_tags("casual", &[yoga.id]).await;

    let future = Utc::now() + Duration::days(7);
    let past = Utc::now() - Duration::days(7);
    fixture
        .seed_event("Sunrise yoga", future, vec![yoga.id])
        .await;
    fixture.seed_event("Bygone yoga", past, vec![yoga.id]).await;
    fixture
        .seed_event("Wall climbing", future, vec![climbing.id])
        .await;
    let retired = fixture
        .seed_event("Cancelled yoga", future, vec![yoga.id])
        .await;
    event_service::deactivate(&fixture.db, retired)
        .await
        .unwrap();

    fixture.login("casual", "member-password").await;
    let body = fixture.get_text("/events").await;
    assert!(body.contains("Sunrise yoga"));
    assert!(!body.contains("Bygone yoga"));
    assert!(!body.contains("Wall climbing"));
    assert!(!body.contains("Cancelled yoga"));

    let admin = new_client();
    fixture
        .login_with(&admin, "admin", "admin-password")
        .await;
    let body = admin
        .get(fixture.url("/events"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    // The superuser sees every active event, dates and follows aside.
    assert!(body.contains("Sunrise yoga"));
    assert!(body.contains("Bygone yoga"));
    assert!(body.contains("Wall climbing"));
    assert!(!body.contains("Cancelled yoga"));
}

#[tokio::test]
async fn tag_filter_narrows_the_member_listing() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("casual").await;
    let yoga = fixture.seed_tag("Yoga").await;
    let climbing = fixture.seed_tag("Climbing").await;
    fixture.follow_tags("casual", &[yoga.id, climbing.id]).await;

    let future = Utc::now() + Duration::days(7);
    fixture
        .seed_event("Sunrise yoga", future, vec![yoga.id])
        .await;
    fixture
        .seed_event("Wall climbing", future, vec![climbing.id])
        .await;

    fixture.login("casual", "member-password").await;
    let body = fixture.get_text("/events?tag=Yoga").await;
    assert!(body.contains("Sunrise yoga"));
    assert!(!body.contains("Wall climbing"));

    let body = fixture.get_text("/events?tag=Swimming").await;
    assert!(body.contains("No events to show."));
}

#[tokio::test]
async fn event_detail_renders_and_missing_event_is_not_found() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    let yoga = fixture.seed_tag("Yoga").await;
    let future = Utc::now() + Duration::days(3);
    let seeded = fixture
        .seed_event("Sunrise yoga", future, vec![yoga.id])
        .await;

    fixture.login("admin", "admin-password").await;
    let resp = fixture
        .client
        .get(fixture.url(&format!("/events/{}", seeded.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Sunrise yoga"));
    assert!(body.contains("Sunrise-yoga.jpg"));

    let resp = fixture
        .client
        .get(fixture.url("/events/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- Event administration ---

#[tokio::test]
async fn event_add_requires_superuser() {
    let fixture = TestFixture::new().await;
    fixture.seed_member("casual").await;
    fixture.login("casual", "member-password").await;

    let form = reqwest::multipart::Form::new().text("title", "Sneaky event");
    let resp = fixture
        .client
        .post(fixture.url("/event/add"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(event::Entity::find()
        .one(&fixture.db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn admin_creates_an_event_with_an_image_upload() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    let yoga = fixture.seed_tag("Yoga").await;
    fixture.login("admin", "admin-password").await;

    let image = reqwest::multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("team photo.jpg")
        .mime_str("image/jpeg")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("title", "Sunrise yoga")
        .text("description", "Mats provided.")
        .text("date", "2027-06-01T07:30")
        .text("tags", yoga.id.to_string())
        .part("image", image);

    let resp = fixture
        .client
        .post(fixture.url("/event/add"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/events");
    assert!(resp.text().await.unwrap().contains("team photo.jpg"));

    let stored = event::Entity::find()
        .filter(event::Column::Title.eq("Sunrise yoga"))
        .one(&fixture.db)
        .await
        .unwrap()
        .expect("event was not created");
    assert!(stored.image.starts_with("media/events/"));
    assert!(stored.image.ends_with("/team photo.jpg"));

    // The bytes really landed under the media root.
    let relative = stored.image.strip_prefix("media/").unwrap();
    let on_disk = fixture.media_root.join(relative);
    assert_eq!(tokio::fs::read(&on_disk).await.unwrap().len(), 4);
}

#[tokio::test]
async fn event_form_redisplays_on_validation_failure() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    fixture.seed_tag("Yoga").await;
    fixture.login("admin", "admin-password").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "")
        .text("date", "garbage");
    let resp = fixture
        .client
        .post(fixture.url("/event/add"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.url().path(), "/event/add");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Title is required."));
    assert!(body.contains("A valid date is required."));
    assert!(body.contains("Pick at least one tag."));
    assert!(body.contains("An image is required."));
}

#[tokio::test]
async fn admin_edits_an_event_keeping_the_stored_image() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    let yoga = fixture.seed_tag("Yoga").await;
    let future = Utc::now() + Duration::days(3);
    let seeded = fixture
        .seed_event("Sunrise yoga", future, vec![yoga.id])
        .await;
    fixture.login("admin", "admin-password").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "Sunset yoga")
        .text("description", "Now in the evening.")
        .text("date", "2027-06-01T19:30")
        .text("tags", yoga.id.to_string());
    let resp = fixture
        .client
        .post(fixture.url(&format!("/event/{}/edit", seeded.id)))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/events");

    let stored = event_service::find_by_id(&fixture.db, seeded.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Sunset yoga");
    assert_eq!(stored.image, seeded.image, "image unchanged without upload");
}

#[tokio::test]
async fn event_soft_delete_is_idempotent() {
    let fixture = TestFixture::new().await;
    fixture.seed_admin().await;
    let yoga = fixture.seed_tag("Yoga").await;
    let future = Utc::now() + Duration::days(3);
    let seeded = fixture
        .seed_event("Sunrise yoga", future, vec![yoga.id])
        .await;
    fixture.login("admin", "admin-password").await;

    for _ in 0..2 {
        let resp = fixture
            .client
            .post(fixture.url(&format!("/event/{}/delete", seeded.id)))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let stored = event_service::find_by_id(&fixture.db, seeded.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active);
}

#[test]
fn tag_admin_view_shows_the_reference_warning() {
    let tera = templates::build().unwrap();
    let mut context = tera::Context::new();
    context.insert("tag_list", &Vec::<tag::Model>::new());
    context.insert("username", "admin");
    context.insert("is_admin", &true);
    context.insert("warning", "There are values that are still referenced.");
    let html = tera.render("list_tags.html", &context).unwrap();
    assert!(html.contains("There are values that are still referenced."));
    assert!(html.contains("Tag administration"));
}

// --- Constraint classification ---

#[tokio::test]
async fn foreign_key_rejections_map_to_still_referenced() {
    let fixture = TestFixture::new().await;

    // A join row pointing at records that do not exist trips the engine's
    // referential check, which is the same error class a refused
    // soft-delete surfaces.
    let err = event_tag::Entity::insert(event_tag::ActiveModel {
        event_id: Set(4242),
        tag_id: Set(4242),
    })
    .exec_without_returning(&fixture.db)
    .await
    .expect_err("insert must violate the foreign key");

    assert!(matches!(
        classify_deactivate_err(err),
        DeactivateError::StillReferenced
    ));
}
