mod auth_service;
mod session_factory;

pub use auth_service::*;
pub use session_factory::*;
