use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A schedulable item with a date, an uploaded image and one or more tags.
/// `image` holds the stored path relative to the web root, e.g.
/// `media/events/<token>/photo.jpg`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub date: ChronoDateTimeUtc,
    pub image: String,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_tag::Entity")]
    EventTags,
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::event_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::event_tag::Relation::Event.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
