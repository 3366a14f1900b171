// SPDX-License-Identifier: MIT

pub mod auth;
pub mod security;

pub use auth::{require_user, AuthUser};
pub use security::add_security_headers;
