//! API data models

pub mod api;
pub mod deployment;
pub mod github;
