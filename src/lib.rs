//! The `taskpulse` library crate.
//!
//! Core of a collaborative task manager: JWT-authenticated users create
//! tasks, assign them to each other, and receive realtime notifications of
//! every task mutation over a websocket. Mutations to tasks are recorded in
//! an append-only audit log.
//!
//! The main binary (`main.rs`) wires these modules into an actix-web server.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod services;
