//! Business rules over the stores. Handlers stay thin: they validate request
//! shapes, call in here, and dispatch whatever events come back.

pub mod auth;
pub mod tasks;
