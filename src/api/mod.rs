pub mod bridge;
pub mod media_file_api;
pub mod simple;
