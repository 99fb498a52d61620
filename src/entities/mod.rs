pub mod prelude;

pub mod platforms;
pub mod shows;
pub mod shows_to_users;
pub mod users;

pub use shows_to_users::WatchStatus;
