//! Application services layer.

pub mod error;
pub mod info;
pub mod repos;
pub mod songs;
