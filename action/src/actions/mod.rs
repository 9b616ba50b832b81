//! GitHub Actions runner integration

pub mod commit;
pub mod context;
pub mod outputs;
