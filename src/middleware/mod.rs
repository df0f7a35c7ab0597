pub mod auth;

pub use auth::{principal_middleware, RequestContext};
