pub mod builder;
pub mod config;
pub mod cover;
pub mod error;
pub mod manifest;
pub mod names;
pub mod platform;
pub mod protocol;
pub mod resolver;
pub mod session;
pub mod urls;
