// src/services/user_service.rs
use crate::models::user::User;
use chrono::Utc;
use futures_util::future::BoxFuture;
use sqlx::SqlitePool;
use thiserror::Error;

/// Tamanho máximo aceite para um token de sessão.
pub const MAX_TOKEN_LEN: usize = 256;

/// Falhas possíveis ao resolver um token de sessão.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("sessão não encontrada ou expirada")]
    NotFound,

    #[error("token de sessão malformado")]
    InvalidToken,

    #[error("Erro na base de dados: {0}")]
    Database(#[from] sqlx::Error),
}

impl LookupError {
    /// `true` para falhas que não são um simples "não há sessão".
    pub fn is_outage(&self) -> bool {
        matches!(self, LookupError::Database(_))
    }
}

/// Capacidade de resolver um utilizador a partir do token de sessão.
///
/// Tem de suportar chamadas concorrentes só de leitura; o middleware partilha
/// uma única instância entre todos os pedidos.
pub trait UserLookup: Send + Sync {
    fn by_token<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<User, LookupError>>;
}

// Rejeita tokens que nunca poderiam ter sido emitidos, sem ir à DB.
pub fn validate_token(token: &str) -> Result<(), LookupError> {
    if token.is_empty()
        || token.len() > MAX_TOKEN_LEN
        || !token.bytes().all(|b| b.is_ascii_graphic())
    {
        return Err(LookupError::InvalidToken);
    }
    Ok(())
}

/// Implementação sobre SQLite: `sessions` (escrita por outro componente)
/// junta com `users`, e só sessões ainda não expiradas contam.
#[derive(Debug, Clone)]
pub struct SqliteUserService {
    db_pool: SqlitePool,
}

impl SqliteUserService {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    async fn find_user_by_token(&self, token: &str) -> Result<User, LookupError> {
        validate_token(token)?;

        // Comparado via julianday(): quem escreve a sessão pode usar
        // "YYYY-MM-DD HH:MM:SS" ou RFC 3339, e como texto não ordenam igual.
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = ?1
              AND julianday(s.expires_at) > julianday(?2)
            LIMIT 1
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.db_pool)
        .await?;

        match user {
            Some(user) => {
                tracing::trace!("Token de sessão resolvido para o utilizador {}", user.id);
                Ok(user)
            }
            None => Err(LookupError::NotFound),
        }
    }
}

impl UserLookup for SqliteUserService {
    fn by_token<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<User, LookupError>> {
        Box::pin(self.find_user_by_token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    // Uma única ligação: cada ligação `:memory:` teria a sua própria base de dados.
    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (id, name, email) VALUES (42, 'Ana', 'ana@example.com')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    async fn insert_session(pool: &SqlitePool, token: &str, expires_in: Duration) {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, 42, ?2)")
            .bind(token)
            .bind(Utc::now().naive_utc() + expires_in)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resolves_active_session() {
        let pool = memory_pool().await;
        insert_session(&pool, "abc123", Duration::hours(1)).await;

        let user = SqliteUserService::new(pool).by_token("abc123").await.unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.name, "Ana");
    }

    #[tokio::test]
    async fn expired_session_is_not_found() {
        let pool = memory_pool().await;
        insert_session(&pool, "expired-token", -Duration::minutes(5)).await;

        let err = SqliteUserService::new(pool)
            .by_token("expired-token")
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::NotFound));
        assert!(!err.is_outage());
    }

    #[tokio::test]
    async fn rfc3339_expiry_is_honoured() {
        let pool = memory_pool().await;
        for (token, expires_at) in [
            ("stale", Utc::now() - Duration::minutes(1)),
            ("fresh", Utc::now() + Duration::minutes(1)),
        ] {
            // DateTime<Utc> é gravado no formato RFC 3339 ("...T...+00:00").
            sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, 42, ?2)")
                .bind(token)
                .bind(expires_at)
                .execute(&pool)
                .await
                .unwrap();
        }
        let svc = SqliteUserService::new(pool);

        assert!(matches!(svc.by_token("stale").await, Err(LookupError::NotFound)));
        assert_eq!(svc.by_token("fresh").await.unwrap().id, 42);
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let pool = memory_pool().await;

        let err = SqliteUserService::new(pool).by_token("nope").await.unwrap_err();

        assert!(matches!(err, LookupError::NotFound));
    }

    #[tokio::test]
    async fn malformed_token_skips_database() {
        let pool = memory_pool().await;
        pool.close().await;

        // Com o pool fechado, só a validação pode responder sem erro de DB.
        let svc = SqliteUserService::new(pool);
        assert!(matches!(svc.by_token("").await, Err(LookupError::InvalidToken)));
        assert!(matches!(svc.by_token("a b").await, Err(LookupError::InvalidToken)));

        let long = "x".repeat(MAX_TOKEN_LEN + 1);
        assert!(matches!(svc.by_token(&long).await, Err(LookupError::InvalidToken)));
    }

    #[tokio::test]
    async fn closed_pool_is_an_outage() {
        let pool = memory_pool().await;
        pool.close().await;

        let err = SqliteUserService::new(pool).by_token("abc123").await.unwrap_err();

        assert!(err.is_outage());
    }
}
