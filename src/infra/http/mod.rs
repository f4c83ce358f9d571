pub mod admin;
pub mod error;
pub mod middleware;
pub mod models;
pub mod public;

pub use admin::{AdminState, build_admin_router};
pub use public::{HttpState, build_public_router};
