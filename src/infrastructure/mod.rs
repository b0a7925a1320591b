//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod http_client;
pub mod logging;
pub mod services;
pub mod tools;
pub mod vector;
