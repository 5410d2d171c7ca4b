// src/web/mod.rs
pub mod context;
pub mod mw_auth;
pub mod routes;
pub mod user_handlers;
