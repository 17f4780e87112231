pub mod auth;
pub mod categories;
pub mod home;
pub mod json_error;
pub mod projects;
pub mod system;
pub mod uploads;
pub mod videos;
