mod hash_password;
mod init;
mod list;
mod serve;

pub use hash_password::cmd_hash_password;
pub use init::cmd_init;
pub use list::cmd_list_dashboard;
pub use serve::cmd_serve;
