pub mod admin;
pub mod dev;
pub mod services;
