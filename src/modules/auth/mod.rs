pub mod dto;
pub mod service;

pub use service::{bearer_token, AuthError, JwtValidator, TokenValidator};
