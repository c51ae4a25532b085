// src/services/mod.rs

pub mod authorizer;
pub mod credentials;
pub mod grading;
pub mod questions;
pub mod sessions;
pub mod users;
