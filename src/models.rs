pub mod auth;
pub mod gym;
pub mod nav;
pub mod profile;
pub mod views;
