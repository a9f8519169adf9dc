pub mod admin;
pub mod auth;
pub mod gyms;
pub mod pages;
