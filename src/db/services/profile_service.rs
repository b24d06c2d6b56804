use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};

use crate::db::entities::{profile, profile_tag, tag};

pub async fn find_by_user_id(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<profile::Model>, DbErr> {
    profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Ids of the tags this profile follows that are still active. Follows of
/// deactivated tags are kept in storage but never reported here.
pub async fn followed_active_tag_ids(
    db: &DatabaseConnection,
    profile_id: i32,
) -> Result<Vec<i32>, DbErr> {
    let rows = profile_tag::Entity::find()
        .join(JoinType::InnerJoin, profile_tag::Relation::Tag.def())
        .filter(profile_tag::Column::ProfileId.eq(profile_id))
        .filter(tag::Column::IsActive.eq(true))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.tag_id).collect())
}

/// Replaces the follow set with the submitted one. Ids that do not belong to
/// an active tag are dropped, so inactive tags cannot be subscribed to even
/// by a hand-crafted request.
pub async fn set_followed_tags(
    db: &DatabaseConnection,
    profile_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    let selectable: Vec<i32> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
        .filter(tag::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|tag| tag.id)
        .collect();

    let txn = db.begin().await?;

    profile_tag::Entity::delete_many()
        .filter(profile_tag::Column::ProfileId.eq(profile_id))
        .exec(&txn)
        .await?;

    for tag_id in selectable {
        profile_tag::Entity::insert(profile_tag::ActiveModel {
            profile_id: Set(profile_id),
            tag_id: Set(tag_id),
        })
        .exec_without_returning(&txn)
        .await?;
    }

    txn.commit().await
}
