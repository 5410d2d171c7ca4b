// src/web/routes.rs
use crate::{
    config::ConfigError,
    error::AppResult,
    state::AppState,
    web::{
        mw_auth::{AccessGuardLayer, ResolveMiss, SessionResolverLayer},
        user_handlers,
    },
};
use axum::{http::HeaderValue, routing::get, Router};

pub fn create_router(app_state: AppState) -> AppResult<Router> {
    let signin_path = HeaderValue::from_str(&app_state.signin_path)
        .map_err(|_| ConfigError::Invalid("SIGNIN_PATH"))?;

    // --- Rotas Públicas ---
    // O utilizador é opcional aqui.
    let public_routes = Router::new().route("/", get(user_handlers::home));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/dashboard", get(user_handlers::dashboard))
        .route("/api/me", get(user_handlers::me))
        .route_layer(AccessGuardLayer::redirect_to(signin_path));

    // O resolver envolve tudo, para o guard já encontrar o contexto preenchido.
    let resolver = SessionResolverLayer::new(app_state.users.clone())
        .with_cookie_name(app_state.session_cookie.clone())
        .on_miss(log_session_miss);

    Ok(Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(resolver)
        .with_state(app_state))
}

fn log_session_miss(miss: &ResolveMiss) {
    match miss {
        ResolveMiss::Lookup(e) if e.is_outage() => {
            tracing::warn!("Falha ao resolver sessão, pedido segue sem utilizador: {}", e);
        }
        _ => tracing::debug!("Pedido sem utilizador: {}", miss),
    }
}
