//! Authentication module

pub mod auth_headers;
