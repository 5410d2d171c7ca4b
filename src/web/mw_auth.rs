// src/web/mw_auth.rs
//! Autenticação por cookie de sessão, em duas etapas.
//!
//! [`SessionResolverLayer`] tenta sempre resolver o utilizador e nunca bloqueia
//! o pedido. [`AccessGuardLayer`] é aplicado só às rotas protegidas e redireciona
//! para a página de login quando não há utilizador no contexto. O guard tem de
//! correr *depois* do resolver, caso contrário rejeita tudo.

use crate::{
    models::user::User,
    services::user_service::{LookupError, UserLookup},
    web::context::RequestContext,
};
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use std::{
    fmt,
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use tower::{Layer, Service};
use tower_cookies::cookie::Cookie;

pub const SESSION_COOKIE: &str = "session";
pub const SIGNIN_PATH: &str = "/signin";

/// Porque é que um pedido seguiu sem utilizador.
#[derive(Error, Debug)]
pub enum ResolveMiss {
    #[error("pedido sem cookie de sessão")]
    NoSessionCookie,

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Callback chamado em cada falha de resolução. O resolver não faz log sozinho.
pub type MissHook = Arc<dyn Fn(&ResolveMiss) + Send + Sync>;

/// Lê o token do primeiro cookie com o nome dado, em todos os headers `Cookie`.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        // Bytes não ASCII noutro cookie não podem esconder o da sessão.
        .flat_map(|value| Cookie::split_parse(String::from_utf8_lossy(value.as_bytes())))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value_trimmed().to_owned())
}

// --- SessionResolver ---

/// Layer que produz o middleware [`SessionResolver`].
#[derive(Clone)]
pub struct SessionResolverLayer {
    users: Arc<dyn UserLookup>,
    cookie_name: Arc<str>,
    on_miss: Option<MissHook>,
}

impl SessionResolverLayer {
    pub fn new(users: Arc<dyn UserLookup>) -> Self {
        Self {
            users,
            cookie_name: Arc::from(SESSION_COOKIE),
            on_miss: None,
        }
    }

    pub fn with_cookie_name(mut self, cookie_name: impl Into<Arc<str>>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn on_miss<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ResolveMiss) + Send + Sync + 'static,
    {
        self.on_miss = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for SessionResolverLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionResolverLayer")
            .field("cookie_name", &self.cookie_name)
            .field("on_miss", &self.on_miss.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for SessionResolverLayer {
    type Service = SessionResolver<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionResolver {
            layer: self.clone(),
            inner,
        }
    }
}

/// Resolve o utilizador do cookie de sessão e junta-o ao [`RequestContext`].
///
/// Qualquer falha (sem cookie, sessão desconhecida, erro no lookup) deixa o
/// pedido passar exatamente como chegou.
#[derive(Clone, Debug)]
pub struct SessionResolver<S> {
    layer: SessionResolverLayer,
    inner: S,
}

impl<S> Service<Request> for SessionResolver<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        // O clone ainda não está pronto; fica o que foi verificado em poll_ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let layer = self.layer.clone();

        Box::pin(async move {
            let ctx = RequestContext::of(&request);

            // Já resolvido mais acima na cadeia: nada a fazer.
            if ctx.user().is_some() {
                return inner.call(request).await;
            }

            match resolve_user(&layer, request.headers()).await {
                Ok(user) => {
                    tracing::trace!("Utilizador {} associado ao pedido", user.id);
                    ctx.with_user(user).attach(&mut request);
                }
                Err(miss) => {
                    if let Some(hook) = &layer.on_miss {
                        hook(&miss);
                    }
                }
            }

            inner.call(request).await
        })
    }
}

async fn resolve_user(layer: &SessionResolverLayer, headers: &HeaderMap) -> Result<User, ResolveMiss> {
    let token = session_token(headers, &layer.cookie_name).ok_or(ResolveMiss::NoSessionCookie)?;
    Ok(layer.users.by_token(&token).await?)
}

// --- AccessGuard ---

/// Layer que produz o middleware [`AccessGuard`].
#[derive(Clone, Debug)]
pub struct AccessGuardLayer {
    signin_path: HeaderValue,
}

impl Default for AccessGuardLayer {
    fn default() -> Self {
        Self {
            signin_path: HeaderValue::from_static(SIGNIN_PATH),
        }
    }
}

impl AccessGuardLayer {
    pub fn redirect_to(signin_path: HeaderValue) -> Self {
        Self { signin_path }
    }
}

impl<S> Layer<S> for AccessGuardLayer {
    type Service = AccessGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessGuard {
            signin_path: self.signin_path.clone(),
            inner,
        }
    }
}

/// Exige um utilizador no contexto; sem ele responde `302 Found` para o login
/// e o serviço interno não é chamado.
#[derive(Clone, Debug)]
pub struct AccessGuard<S> {
    signin_path: HeaderValue,
    inner: S,
}

impl<S> AccessGuard<S> {
    fn redirect(&self) -> Response {
        (
            StatusCode::FOUND,
            [(header::LOCATION, self.signin_path.clone())],
        )
            .into_response()
    }
}

impl<S> Service<Request> for AccessGuard<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        if RequestContext::of(&request).user().is_none() {
            tracing::debug!("Acesso negado a {}: sem sessão, redirecionando", request.uri().path());
            let response = self.redirect();
            return Box::pin(async move { Ok(response) });
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}
