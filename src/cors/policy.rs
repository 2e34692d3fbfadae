use std::convert::TryFrom;

use bytes::{BufMut, BytesMut};
use http::{
    header::{self, HeaderName, HeaderValue},
    HeaderMap, Method,
};

use super::{ConfigError, CorsConfig};

#[allow(clippy::declare_interior_mutable_const)]
const WILDCARD: HeaderValue = HeaderValue::from_static("*");

const DEFAULT_MAX_AGE_SECS: u64 = 60 * 60 * 24;

/// A validated CORS policy.
///
/// All header values are computed once, when the policy is built. Applying the
/// policy to a request only clones those values, so one policy can be shared
/// by any number of concurrently handled requests.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_all_origins: bool,
    allow_origins: Box<[HeaderValue]>,
    allow_credentials: Option<HeaderValue>,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
    max_age: HeaderValue,
}

/// How a [`CorsPolicy`] treats one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The request has no (or an empty) `Origin` header.
    NotCors,
    /// The origin is not allowed. The request proceeds without CORS headers.
    Rejected,
    /// Preflight from an admitted origin. Answer with `204 No Content`.
    ///
    /// Holds the `Access-Control-Allow-Origin` value to send.
    Preflight(HeaderValue),
    /// Admitted origin on a regular request. Annotate the response.
    ///
    /// Holds the `Access-Control-Allow-Origin` value to send.
    Allowed(HeaderValue),
}

impl CorsPolicy {
    /// Validate `config` and precompute the response headers.
    ///
    /// Fails if `allow_all_origins` and `allow_credentials` are both set, or if
    /// any configured origin, method or header is not a legal HTTP token.
    /// Empty `allow_methods` falls back to `GET, POST, HEAD` and a zero max-age
    /// falls back to one day.
    pub fn new(config: CorsConfig) -> Result<Self, ConfigError> {
        if config.allow_all_origins && config.allow_credentials {
            return Err(ConfigError::wildcard_with_credentials());
        }

        let allow_origins = config
            .allow_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::invalid_origin(origin))
            })
            .collect::<Result<Box<[_]>, _>>()?;

        let allow_methods = if config.allow_methods.is_empty() {
            Some(HeaderValue::from_static("GET, POST, HEAD"))
        } else {
            let methods = config
                .allow_methods
                .iter()
                .map(|method| method_token(method))
                .collect::<Result<Vec<_>, _>>()?;
            separated_by_commas(methods.into_iter())
        };

        let allow_headers = {
            let headers = config
                .allow_headers
                .iter()
                .map(|name| header_token(name))
                .collect::<Result<Vec<_>, _>>()?;
            separated_by_commas(headers.into_iter())
        };

        let max_age_secs = if config.max_age_secs == 0 {
            DEFAULT_MAX_AGE_SECS
        } else {
            config.max_age_secs
        };

        let policy = Self {
            allow_all_origins: config.allow_all_origins,
            allow_origins,
            allow_credentials: config
                .allow_credentials
                .then(|| HeaderValue::from_static("true")),
            allow_methods,
            allow_headers,
            max_age: max_age_secs.into(),
        };

        tracing::debug!(
            allow_all_origins = policy.allow_all_origins,
            allowed_origins = policy.allow_origins.len(),
            allow_credentials = config.allow_credentials,
            max_age_secs,
            "built cors policy"
        );

        Ok(policy)
    }

    /// A permissive policy suitable for most APIs:
    ///
    /// - All origins allowed.
    /// - Credentials not allowed.
    /// - Methods `GET, POST, PUT, DELETE, PATCH, OPTIONS`.
    /// - Headers `Content-Type, Authorization`.
    /// - Max age set to one day.
    pub fn permissive() -> Self {
        Self {
            allow_all_origins: true,
            allow_origins: Box::new([]),
            allow_credentials: None,
            allow_methods: Some(HeaderValue::from_static(
                "GET, POST, PUT, DELETE, PATCH, OPTIONS",
            )),
            allow_headers: Some(HeaderValue::from_static("Content-Type, Authorization")),
            max_age: DEFAULT_MAX_AGE_SECS.into(),
        }
    }

    /// Decide how a request with the given method and headers is handled.
    pub fn evaluate(&self, method: &Method, headers: &HeaderMap) -> Admission {
        let origin = match headers.get(header::ORIGIN) {
            Some(origin) if !origin.is_empty() => origin,
            // This is not a CORS request if there is no Origin header
            _ => {
                tracing::trace!("no origin header, skipping cors");
                return Admission::NotCors;
            }
        };

        let allow_origin = if self.allow_all_origins {
            WILDCARD
        } else if self.allow_origins.contains(origin) {
            origin.clone()
        } else {
            tracing::trace!(?origin, "origin not allowed, skipping cors");
            return Admission::Rejected;
        };

        let requested_method = headers
            .get(header::ACCESS_CONTROL_REQUEST_METHOD)
            .filter(|value| !value.is_empty());

        if method == Method::OPTIONS && requested_method.is_some() {
            tracing::debug!(?origin, ?requested_method, "answering cors preflight");
            Admission::Preflight(allow_origin)
        } else {
            Admission::Allowed(allow_origin)
        }
    }

    /// Write the CORS response headers for an admitted origin.
    ///
    /// `allow_origin` is the value carried by [`Admission::Preflight`] or
    /// [`Admission::Allowed`]. Every header is inserted, replacing an existing
    /// value, except `Vary` which is appended so that variance declared by
    /// the inner service is kept.
    pub fn apply(&self, allow_origin: HeaderValue, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);

        if !self.allow_all_origins {
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }

        if let Some(allow_credentials) = &self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                allow_credentials.clone(),
            );
        }

        if let Some(allow_methods) = &self.allow_methods {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, allow_methods.clone());
        }

        if let Some(allow_headers) = &self.allow_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers.clone());
        }

        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }

    /// Whether every origin is admitted.
    pub fn allows_all_origins(&self) -> bool {
        self.allow_all_origins
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

impl TryFrom<CorsConfig> for CorsPolicy {
    type Error = ConfigError;

    fn try_from(config: CorsConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}

fn method_token(method: &str) -> Result<HeaderValue, ConfigError> {
    Method::from_bytes(method.as_bytes())
        .ok()
        .and_then(|_| HeaderValue::from_str(method).ok())
        .ok_or_else(|| ConfigError::invalid_method(method))
}

fn header_token(name: &str) -> Result<HeaderValue, ConfigError> {
    // validated as a header name but sent with the caller's spelling
    HeaderName::from_bytes(name.as_bytes())
        .ok()
        .and_then(|_| HeaderValue::from_str(name).ok())
        .ok_or_else(|| ConfigError::invalid_header(name))
}

fn separated_by_commas<I>(mut iter: I) -> Option<HeaderValue>
where
    I: Iterator<Item = HeaderValue>,
{
    let fst = iter.next()?;
    let mut result = BytesMut::from(fst.as_bytes());
    for val in iter {
        result.reserve(val.len() + 2);
        result.put_slice(b", ");
        result.extend_from_slice(val.as_bytes());
    }

    // valid values joined by `, ` are always a valid value
    HeaderValue::from_maybe_shared(result.freeze()).ok()
}
