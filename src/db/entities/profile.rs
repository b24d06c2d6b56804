use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One-to-one extension of a user account carrying the followed-tag set
/// (through the `profile_tags` join).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::profile_tag::Entity")]
    ProfileTags,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::profile_tag::Relation::Tag.def()
    }
    fn via() -> Option<RelationDef> {
        Some(super::profile_tag::Relation::Profile.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
