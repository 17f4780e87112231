pub mod category;
pub mod dashboard;
pub mod memory;
pub mod project;
pub mod sqlx_repo;
pub mod token;
pub mod user;
pub mod video;
