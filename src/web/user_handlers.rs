// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::User,
    state::AppState,
    templates::{DashboardPage, HomePage},
    web::context::CurrentUser,
};
use askama::Template;
use axum::{extract::State, response::Html, Json};

// GET / (pública; mostra o utilizador se houver sessão)
pub async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Html<String>> {
    let page = HomePage {
        user_name: user.map(|u| u.name.clone()),
        signin_path: state.signin_path.to_string(),
    };
    Ok(Html(page.render()?))
}

// GET /dashboard (atrás do AccessGuard)
pub async fn dashboard(CurrentUser(user): CurrentUser) -> AppResult<Html<String>> {
    // O guard já garantiu o utilizador; se faltar, a rota foi montada sem ele.
    let user = user.ok_or(AppError::Unauthorized)?;
    tracing::debug!("GET /dashboard: Acesso para {}", user.id);

    let page = DashboardPage {
        user_id: user.id,
        user_name: user.name.clone(),
        email: user.email.clone(),
    };
    Ok(Html(page.render()?))
}

// GET /api/me
pub async fn me(CurrentUser(user): CurrentUser) -> AppResult<Json<User>> {
    let user = user.ok_or(AppError::Unauthorized)?;
    Ok(Json(User::clone(&user)))
}
