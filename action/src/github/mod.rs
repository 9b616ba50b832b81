//! GitHub deployment mirror module

pub mod mirror;
