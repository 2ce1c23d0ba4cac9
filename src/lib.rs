#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Token-based sessions (registration, login, refresh, logout), the per-request"]
#![doc = "identity gate, and owner-scoped task storage, all served over actix-web."]
#![doc = "The binary (`main.rs`) only loads configuration and wires these pieces together."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::config::Config;
pub use crate::error::AppError;
