// src/models/user.rs
use serde::Serialize;
use sqlx::FromRow;

// Utilizador resolvido a partir de uma sessão ativa.
// O gate de autenticação só olha para a presença do valor; os restantes campos
// servem os handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}
