// src/state.rs
use crate::{config::Config, services::user_service::UserLookup};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Partilhado por todos os pedidos; só leituras.
    pub users: Arc<dyn UserLookup>,
    pub session_cookie: Arc<str>,
    pub signin_path: Arc<str>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserLookup>, config: &Config) -> Self {
        Self {
            users,
            session_cookie: Arc::from(config.session_cookie.as_str()),
            signin_path: Arc::from(config.signin_path.as_str()),
        }
    }
}
