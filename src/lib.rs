pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;
