pub mod apis;
pub mod arguments;
pub mod config;
pub mod errors;
pub mod logger;
pub mod media;
pub mod summary;
pub mod telegram;
pub mod treatments;
pub mod webserver;
