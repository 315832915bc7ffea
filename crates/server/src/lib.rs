//! Client registry server library.
//!
//! The JSON API, the server-rendered UI and the `PostgreSQL` store, exposed
//! as a library so the binary, the CLI and the tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
