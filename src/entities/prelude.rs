pub use super::platforms::Entity as Platforms;
pub use super::shows::Entity as Shows;
pub use super::shows_to_users::Entity as ShowsToUsers;
pub use super::users::Entity as Users;
