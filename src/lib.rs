//! API case batch runner library.
//!
//! Turns a selection of API test cases into pre-created reports and
//! dispatches them to the execution engine, either one at a time through a
//! durable execution queue or in concurrently processed chunks.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
