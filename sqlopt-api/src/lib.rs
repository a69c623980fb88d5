//! # SQL Optimizer API Server Library
//!
//! This library provides the HTTP surface of the SQL optimizer: accounts and
//! sessions, the optimizer itself, saved history, and the admin pages.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
