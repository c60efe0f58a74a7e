//! Task, product and image management service.
//!
//! A REST API over MongoDB with bearer-token authentication, per-user task
//! lists, a public product catalogue and image uploads kept either in S3 or
//! on local disk. [`client`] holds the typed data layer the browser UI is
//! built on.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;
pub mod storage;
