//! Middleware which enforces a [CORS][mdn] origin policy.
//!
//! # Example
//!
//! ```
//! use http::{header, Method, Request, Response, StatusCode};
//! use std::convert::Infallible;
//! use tower::{ServiceBuilder, ServiceExt};
//! use tower_cors_policy::cors::{CorsConfig, CorsLayer};
//!
//! async fn handle(_request: Request<String>) -> Result<Response<String>, Infallible> {
//!     Ok(Response::new("hello".to_owned()))
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cors = CorsLayer::new(
//!     CorsConfig::new()
//!         .allow_origin("https://app.example.com")
//!         .allow_methods(["GET", "POST"])
//!         .allow_credentials(true),
//! )?;
//!
//! let service = ServiceBuilder::new().layer(cors).service_fn(handle);
//!
//! // a preflight from an allowed origin is answered by the middleware
//! let request = Request::builder()
//!     .method(Method::OPTIONS)
//!     .header(header::ORIGIN, "https://app.example.com")
//!     .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
//!     .body(String::new())?;
//!
//! let response = service.clone().oneshot(request).await?;
//!
//! assert_eq!(response.status(), StatusCode::NO_CONTENT);
//! assert_eq!(
//!     response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
//!     "https://app.example.com",
//! );
//! assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
//!
//! // other origins reach the handler, but without CORS headers
//! let request = Request::builder()
//!     .header(header::ORIGIN, "https://evil.example.com")
//!     .body(String::new())?;
//!
//! let response = service.oneshot(request).await?;
//!
//! assert_eq!(response.body(), "hello");
//! assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
//! # Ok(())
//! # }
//! ```
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS

use futures_core::ready;
use http::{header::HeaderValue, Request, Response, StatusCode};
use pin_project_lite::pin_project;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tower_layer::Layer;
use tower_service::Service;

mod config;
mod error;
mod policy;


pub use self::{
    config::CorsConfig,
    error::ConfigError,
    policy::{Admission, CorsPolicy},
};

/// Layer that applies the [`Cors`] middleware.
///
/// The policy is shared between every service the layer produces, so cloning
/// the layer is cheap.
///
/// See the [module docs](crate::cors) for an example.
#[derive(Debug, Clone)]
pub struct CorsLayer {
    policy: Arc<CorsPolicy>,
}

impl CorsLayer {
    /// Build a `CorsLayer` from `config`.
    ///
    /// See [`CorsPolicy::new`] for when this fails.
    pub fn new(config: CorsConfig) -> Result<Self, ConfigError> {
        CorsPolicy::new(config).map(Self::from)
    }

    /// A permissive configuration suitable for most APIs.
    ///
    /// See [`CorsPolicy::permissive`] for more details.
    pub fn permissive() -> Self {
        Self::from(CorsPolicy::permissive())
    }

    /// The policy this layer applies.
    pub fn policy(&self) -> &CorsPolicy {
        &self.policy
    }
}

impl Default for CorsLayer {
    fn default() -> Self {
        Self::permissive()
    }
}

impl From<CorsPolicy> for CorsLayer {
    fn from(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl From<Arc<CorsPolicy>> for CorsLayer {
    fn from(policy: Arc<CorsPolicy>) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = Cors<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cors {
            inner,
            policy: self.policy.clone(),
        }
    }
}

/// Middleware which enforces a [CORS][mdn] origin policy.
///
/// See the [module docs](crate::cors) for an example.
///
/// [mdn]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Cors<S> {
    /// Create a new `Cors` applying `policy`.
    pub fn new(inner: S, policy: impl Into<Arc<CorsPolicy>>) -> Self {
        Self {
            inner,
            policy: policy.into(),
        }
    }

    /// A permissive configuration suitable for most APIs.
    ///
    /// See [`CorsPolicy::permissive`] for more details.
    pub fn permissive(inner: S) -> Self {
        Self::new(inner, CorsPolicy::permissive())
    }

    /// Returns a new [`Layer`] that wraps services with a [`Cors`] middleware.
    ///
    /// [`Layer`]: tower_layer::Layer
    pub fn layer(config: CorsConfig) -> Result<CorsLayer, ConfigError> {
        CorsLayer::new(config)
    }

    /// Gets a reference to the underlying service.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Gets a mutable reference to the underlying service.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consumes `self`, returning the underlying service.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// The policy this middleware applies.
    pub fn policy(&self) -> &CorsPolicy {
        &self.policy
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Cors<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let inner = match self.policy.evaluate(req.method(), req.headers()) {
            Admission::NotCors | Admission::Rejected => Kind::PassThrough {
                future: self.inner.call(req),
            },
            Admission::Preflight(allow_origin) => {
                let mut response = Response::new(ResBody::default());
                *response.status_mut() = StatusCode::NO_CONTENT;
                self.policy.apply(allow_origin, response.headers_mut());

                Kind::Preflight {
                    response: Some(response),
                }
            }
            Admission::Allowed(allow_origin) => Kind::CorsCall {
                future: self.inner.call(req),
                policy: self.policy.clone(),
                allow_origin: Some(allow_origin),
            },
        };

        ResponseFuture { inner }
    }
}

pin_project! {
    /// Response future for [`Cors`].
    pub struct ResponseFuture<F, B> {
        #[pin]
        inner: Kind<F, B>,
    }
}

pin_project! {
    #[project = KindProj]
    enum Kind<F, B> {
        PassThrough {
            #[pin]
            future: F,
        },
        CorsCall {
            #[pin]
            future: F,
            policy: Arc<CorsPolicy>,
            allow_origin: Option<HeaderValue>,
        },
        Preflight {
            response: Option<Response<B>>,
        },
    }
}

impl<F, B, E> Future for ResponseFuture<F, B>
where
    F: Future<Output = Result<Response<B>, E>>,
{
    type Output = Result<Response<B>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().inner.project() {
            KindProj::PassThrough { future } => future.poll(cx),
            KindProj::CorsCall {
                future,
                policy,
                allow_origin,
            } => {
                let mut response: Response<B> = ready!(future.poll(cx))?;

                if let Some(allow_origin) = allow_origin.take() {
                    policy.apply(allow_origin, response.headers_mut());
                }

                Poll::Ready(Ok(response))
            }
            KindProj::Preflight { response } => match response.take() {
                Some(response) => Poll::Ready(Ok(response)),
                None => panic!("`ResponseFuture` polled after completion"),
            },
        }
    }
}
