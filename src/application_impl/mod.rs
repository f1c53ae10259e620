mod auth_service_fake;
mod auth_service_impl;
mod password_hasher;
mod session_factory_jwt;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use password_hasher::*;
pub use session_factory_jwt::*;
