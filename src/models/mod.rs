pub mod admin;
pub mod auth;
pub mod complaint;
pub mod notification;
pub mod town;
pub mod user;

pub use admin::*;
pub use auth::*;
pub use complaint::*;
pub use notification::*;
pub use town::*;
pub use user::*;
