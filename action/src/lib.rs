//! pages-await Library
//!
//! Follows a Cloudflare Pages deployment from the CI job that triggered it.

pub mod actions;
pub mod app;
pub mod authn;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod github;
pub mod http;
pub mod logs;
pub mod models;
pub mod notify;
pub mod utils;
pub mod workers;
