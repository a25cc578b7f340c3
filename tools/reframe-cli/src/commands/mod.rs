pub mod config;
pub mod info;
pub mod plan;
pub mod validate;
