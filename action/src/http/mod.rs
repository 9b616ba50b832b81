//! Cloudflare HTTP module

pub mod client;
pub mod deployments;
