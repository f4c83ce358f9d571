//! Application services layer.

pub mod comments;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod posts;
pub mod relationships;
pub mod repos;
