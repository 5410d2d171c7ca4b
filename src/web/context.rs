// src/web/context.rs
use crate::models::user::User;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Request},
};
use std::{convert::Infallible, sync::Arc};

/// Contexto imutável de um pedido, guardado nas extensões.
///
/// Contém no máximo um [`User`], e só se este tiver sido resolvido a partir de
/// uma sessão válida. "Sem cookie", "sessão desconhecida" e "erro no lookup"
/// produzem todos o mesmo contexto vazio.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user: Option<Arc<User>>,
}

impl RequestContext {
    /// Devolve um novo contexto com o utilizador; `self` fica inalterado.
    pub fn with_user(&self, user: User) -> Self {
        Self {
            user: Some(Arc::new(user)),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_deref()
    }

    pub fn shared_user(&self) -> Option<Arc<User>> {
        self.user.clone()
    }

    /// Contexto associado ao pedido, ou um contexto vazio.
    pub fn of<B>(request: &Request<B>) -> Self {
        request
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn attach<B>(self, request: &mut Request<B>) {
        request.extensions_mut().insert(self);
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Utilizador atual, se existir. Nunca rejeita o pedido.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<Arc<User>>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state).await?;
        Ok(CurrentUser(ctx.shared_user()))
    }
}
