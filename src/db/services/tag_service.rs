use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::{classify_deactivate_err, DeactivateError};
use crate::db::entities::tag;

/// All active tags, in insertion order. Inactive tags never show up here,
/// which is what keeps them out of navigation and subscription choices.
pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::IsActive.eq(true))
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find_by_id(id).one(db).await
}

pub async fn create(db: &DatabaseConnection, name: &str) -> Result<tag::Model, DbErr> {
    let now = Utc::now();
    tag::ActiveModel {
        name: Set(name.to_owned()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn rename(
    db: &DatabaseConnection,
    tag: tag::Model,
    name: &str,
) -> Result<tag::Model, DbErr> {
    let mut active: tag::ActiveModel = tag.into();
    active.name = Set(name.to_owned());
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

/// Idempotent soft-delete: an already-inactive tag stays inactive and
/// reports success. A referential rejection from the storage layer maps to
/// `DeactivateError::StillReferenced` and leaves `is_active` unchanged.
pub async fn deactivate(db: &DatabaseConnection, tag: tag::Model) -> Result<(), DeactivateError> {
    if !tag.is_active {
        return Ok(());
    }
    let mut active: tag::ActiveModel = tag.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(classify_deactivate_err)?;
    Ok(())
}
