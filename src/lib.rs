// src/lib.rs

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod share;
pub mod state;
pub mod telegram;
pub mod telemetry;
pub mod utils;

pub use routes::create_router;
