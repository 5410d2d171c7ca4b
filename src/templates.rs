// src/templates.rs
use askama::Template;

// Página pública; o utilizador é opcional.
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub user_name: Option<String>,
    pub signin_path: String,
}

// Só é renderizada atrás do AccessGuard.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
}
