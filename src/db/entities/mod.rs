//! SeaORM entities mapping to the database tables.

pub mod event;
pub mod event_tag;
pub mod profile;
pub mod profile_tag;
pub mod tag;
pub mod user;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::profile::Entity as Profile;
    pub use super::profile::Model as ProfileModel;
    pub use super::profile::ActiveModel as ProfileActiveModel;
    pub use super::profile::Column as ProfileColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::event::Entity as Event;
    pub use super::event::Model as EventModel;
    pub use super::event::ActiveModel as EventActiveModel;
    pub use super::event::Column as EventColumn;

    pub use super::event_tag::Entity as EventTag;
    pub use super::event_tag::Model as EventTagModel;
    pub use super::event_tag::ActiveModel as EventTagActiveModel;
    pub use super::event_tag::Column as EventTagColumn;

    pub use super::profile_tag::Entity as ProfileTag;
    pub use super::profile_tag::Model as ProfileTagModel;
    pub use super::profile_tag::ActiveModel as ProfileTagActiveModel;
    pub use super::profile_tag::Column as ProfileTagColumn;
}
