/// Middleware modules for the API server
///
/// - `security`: Security response headers
///
/// Session and admin checks are `from_fn` layers in [`crate::app`].

pub mod security;
