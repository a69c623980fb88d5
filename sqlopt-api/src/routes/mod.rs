/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout)
/// - `home`: Dashboard and quota status
/// - `optimizer`: Formatting, analysis and download
/// - `nl`: Natural-language questions to SQL
/// - `history`: Saved analyses and favorites
/// - `analytics`: Admin usage dashboard
/// - `users`: Admin user management

pub mod analytics;
pub mod auth;
pub mod health;
pub mod history;
pub mod home;
pub mod nl;
pub mod optimizer;
pub mod users;
