pub mod admin;
pub mod auth;
pub mod category;
pub mod extractors;
pub mod media;
pub mod project;
pub mod video;
