pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod storage;
