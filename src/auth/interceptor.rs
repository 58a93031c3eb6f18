//! Outbound authorization for backend calls.
//!
//! [`AuthorizeLayer`] wraps any `Service<reqwest::Request>`. Before dispatch
//! it attaches the stored token as a bearer credential. A 401 answer ends the
//! session once (token cleared, anonymous state published) and asks the
//! navigator for the login screen. Neither step can fail the call: the
//! caller always receives the backend's response.

use futures::future::BoxFuture;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use super::service::AuthService;
use crate::navigation::Navigator;

#[derive(Clone)]
pub struct AuthorizeLayer {
    auth: Arc<AuthService>,
    navigator: Option<Arc<dyn Navigator>>,
    login_route: Arc<str>,
}

impl AuthorizeLayer {
    pub fn new(auth: Arc<AuthService>, login_route: impl Into<String>) -> Self {
        Self {
            auth,
            navigator: None,
            login_route: Arc::from(login_route.into()),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }
}

impl<S> Layer<S> for AuthorizeLayer {
    type Service = Authorized<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authorized {
            inner,
            auth: self.auth.clone(),
            navigator: self.navigator.clone(),
            login_route: self.login_route.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Authorized<S> {
    inner: S,
    auth: Arc<AuthService>,
    navigator: Option<Arc<dyn Navigator>>,
    login_route: Arc<str>,
}

impl<S> Authorized<S> {
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }
}

impl<S> Service<reqwest::Request> for Authorized<S>
where
    S: Service<reqwest::Request, Response = reqwest::Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = reqwest::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: reqwest::Request) -> Self::Future {
        // The instance that was polled ready serves this call
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let auth = self.auth.clone();
        let navigator = self.navigator.clone();
        let login_route = self.login_route.clone();

        Box::pin(async move {
            attach_token(&auth, &mut request).await;
            let url = request.url().clone();

            let response = inner.call(request).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                tracing::warn!("{} answered 401, ending the session", url);
                end_session(&auth, navigator.as_deref(), &login_route).await;
            }
            Ok(response)
        })
    }
}

async fn attach_token(auth: &AuthService, request: &mut reqwest::Request) {
    let token = match auth.access_token().await {
        Ok(Some(token)) => token,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!("Sending {} without a token: {}", request.url(), e);
            return;
        }
    };

    match HeaderValue::from_str(&format!("Bearer {}", token.trim())) {
        Ok(mut value) => {
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Err(e) => tracing::warn!("Stored token is not a valid header value: {}", e),
    }
}

async fn end_session(auth: &AuthService, navigator: Option<&dyn Navigator>, login_route: &str) {
    if let Err(e) = auth.logout().await {
        tracing::warn!("Logout after 401 failed: {}", e);
    }

    if let Some(navigator) = navigator {
        if let Err(e) = navigator.navigate_to(login_route).await {
            tracing::warn!("Redirect to '{}' failed: {}", login_route, e);
        }
    }
}
