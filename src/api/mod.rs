//! API Module
//!
//! HTTP handlers and routing for the cache front-end.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair in every tier
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key from every tier
//! - `DELETE /clear` - Clear every tier
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
