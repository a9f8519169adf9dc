pub mod auth;
pub mod gym_service;
pub mod session;
