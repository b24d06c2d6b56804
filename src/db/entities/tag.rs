use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named category events are classified under. Never physically removed:
/// deactivation flips `is_active` and hides the tag from listings and
/// subscription choices while existing references survive.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::event_tag::Entity")]
    EventTags,

    #[sea_orm(has_many = "super::profile_tag::Entity")]
    ProfileTags,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        super::event_tag::Relation::Event.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::event_tag::Relation::Tag.def().rev())
    }
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        super::profile_tag::Relation::Profile.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::profile_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
