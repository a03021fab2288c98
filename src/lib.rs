// Library exports for Veranda
// This allows integration tests and external code to use Veranda modules

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod follow;
pub mod pagination;
pub mod routes;
pub mod state;
