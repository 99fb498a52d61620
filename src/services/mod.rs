pub mod admin_service;
pub mod admin_service_impl;
pub use admin_service::{AdminError, AdminService};
pub use admin_service_impl::SeaOrmAdminService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::{Argon2AuthService, hash_password};

pub mod show_service;
pub mod show_service_impl;
pub use show_service::{CreateShow, ShowDetail, ShowError, ShowService};
pub use show_service_impl::SeaOrmShowService;

pub mod watch_service;
pub mod watch_service_impl;
pub use watch_service::{SeasonSnapshot, WatchError, WatchService};
pub use watch_service_impl::SeaOrmWatchService;
