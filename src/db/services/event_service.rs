use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use super::{classify_deactivate_err, profile_service, DeactivateError};
use crate::db::entities::{event, event_tag, tag};

/// Field set for a create or update, already validated by the form layer.
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub tag_ids: Vec<i32>,
}

/// Everything active, optionally narrowed to events carrying the named tag.
/// The superuser view ignores dates and follow sets; the name filter here
/// also matches deactivated tags, so an admin can still find events filed
/// under a retired category.
pub async fn visible_to_admin(
    db: &DatabaseConnection,
    tag_filter: Option<&str>,
) -> Result<Vec<event::Model>, DbErr> {
    let mut query = event::Entity::find()
        .filter(event::Column::IsActive.eq(true))
        .order_by_asc(event::Column::Id);

    if let Some(name) = tag_filter {
        let tagged = event_ids_with_tag_name(db, name, false).await?;
        query = query.filter(event::Column::Id.is_in(tagged));
    }

    query.all(db).await
}

/// The member-visible set: active events dated now or later that carry at
/// least one active tag the profile follows. A tag-name filter narrows this
/// set further; it never widens it past the follow check.
pub async fn visible_to_member(
    db: &DatabaseConnection,
    profile_id: i32,
    now: DateTime<Utc>,
    tag_filter: Option<&str>,
) -> Result<Vec<event::Model>, DbErr> {
    let followed = profile_service::followed_active_tag_ids(db, profile_id).await?;
    if followed.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = event::Entity::find()
        .join(JoinType::InnerJoin, event::Relation::EventTags.def())
        .filter(event_tag::Column::TagId.is_in(followed))
        .filter(event::Column::IsActive.eq(true))
        .filter(event::Column::Date.gte(now))
        .distinct()
        .order_by_asc(event::Column::Id);

    if let Some(name) = tag_filter {
        let tagged = event_ids_with_tag_name(db, name, true).await?;
        query = query.filter(event::Column::Id.is_in(tagged));
    }

    query.all(db).await
}

async fn event_ids_with_tag_name(
    db: &DatabaseConnection,
    name: &str,
    only_active_tags: bool,
) -> Result<Vec<i32>, DbErr> {
    let mut query = event_tag::Entity::find()
        .join(JoinType::InnerJoin, event_tag::Relation::Tag.def())
        .filter(tag::Column::Name.eq(name));
    if only_active_tags {
        query = query.filter(tag::Column::IsActive.eq(true));
    }
    let rows = query.all(db).await?;
    Ok(rows.into_iter().map(|row| row.event_id).collect())
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<event::Model>, DbErr> {
    event::Entity::find_by_id(id).one(db).await
}

/// Filters a submitted id set down to active tags, so a hand-crafted
/// request cannot attach retired or nonexistent tags.
async fn selectable_tag_ids(db: &DatabaseConnection, ids: &[i32]) -> Result<Vec<i32>, DbErr> {
    let tags = tag::Entity::find()
        .filter(tag::Column::Id.is_in(ids.to_vec()))
        .filter(tag::Column::IsActive.eq(true))
        .all(db)
        .await?;
    Ok(tags.into_iter().map(|tag| tag.id).collect())
}

pub async fn create(
    db: &DatabaseConnection,
    input: EventInput,
    image: String,
) -> Result<event::Model, DbErr> {
    let tag_ids = selectable_tag_ids(db, &input.tag_ids).await?;
    let now = Utc::now();
    let txn = db.begin().await?;

    let model = event::ActiveModel {
        title: Set(input.title),
        description: Set(input.description),
        date: Set(input.date),
        image: Set(image),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for tag_id in tag_ids {
        event_tag::Entity::insert(event_tag::ActiveModel {
            event_id: Set(model.id),
            tag_id: Set(tag_id),
        })
        .exec_without_returning(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(model)
}

/// Rewrites the event fields and replaces its tag associations. `image` is
/// `None` when no new file was uploaded, keeping the stored one.
pub async fn update(
    db: &DatabaseConnection,
    existing: event::Model,
    input: EventInput,
    image: Option<String>,
) -> Result<event::Model, DbErr> {
    let tag_ids = selectable_tag_ids(db, &input.tag_ids).await?;
    let txn = db.begin().await?;
    let event_id = existing.id;

    let mut active: event::ActiveModel = existing.into();
    active.title = Set(input.title);
    active.description = Set(input.description);
    active.date = Set(input.date);
    if let Some(image) = image {
        active.image = Set(image);
    }
    active.updated_at = Set(Utc::now());
    let model = active.update(&txn).await?;

    event_tag::Entity::delete_many()
        .filter(event_tag::Column::EventId.eq(event_id))
        .exec(&txn)
        .await?;
    for tag_id in tag_ids {
        event_tag::Entity::insert(event_tag::ActiveModel {
            event_id: Set(event_id),
            tag_id: Set(tag_id),
        })
        .exec_without_returning(&txn)
        .await?;
    }

    txn.commit().await?;
    Ok(model)
}

/// Same contract as `tag_service::deactivate`: idempotent, and a storage
/// rejection surfaces as `StillReferenced` with the row left untouched.
pub async fn deactivate(
    db: &DatabaseConnection,
    event: event::Model,
) -> Result<(), DeactivateError> {
    if !event.is_active {
        return Ok(());
    }
    let mut active: event::ActiveModel = event.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(classify_deactivate_err)?;
    Ok(())
}

/// Ids of the tags currently attached to an event, for form pre-population.
pub async fn tag_ids_for_event(db: &DatabaseConnection, event_id: i32) -> Result<Vec<i32>, DbErr> {
    let rows = event_tag::Entity::find()
        .filter(event_tag::Column::EventId.eq(event_id))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.tag_id).collect())
}
