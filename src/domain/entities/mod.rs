pub mod category;
pub mod dashboard;
pub mod media;
pub mod option_fields;
pub mod project;
pub mod response;
pub mod token;
pub mod user;
pub mod video;
