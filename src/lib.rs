pub mod auth;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;
pub mod users;
pub mod validators;
