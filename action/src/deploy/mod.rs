//! Deployment lifecycle module

pub mod reconciler;
