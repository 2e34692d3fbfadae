use std::fmt;

/// Error returned when a [`CorsConfig`] cannot be turned into a policy.
///
/// All of these are detected once, when the policy is built. Handling a
/// request never fails.
///
/// [`CorsConfig`]: super::CorsConfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    WildcardWithCredentials,
    InvalidOrigin(String),
    InvalidMethod(String),
    InvalidHeader(String),
}

impl ConfigError {
    pub(super) fn wildcard_with_credentials() -> Self {
        Self {
            kind: Kind::WildcardWithCredentials,
        }
    }

    pub(super) fn invalid_origin(origin: &str) -> Self {
        Self {
            kind: Kind::InvalidOrigin(origin.to_owned()),
        }
    }

    pub(super) fn invalid_method(method: &str) -> Self {
        Self {
            kind: Kind::InvalidMethod(method.to_owned()),
        }
    }

    pub(super) fn invalid_header(header: &str) -> Self {
        Self {
            kind: Kind::InvalidHeader(header.to_owned()),
        }
    }

    /// Returns `true` if all origins and credentials were allowed together.
    ///
    /// A wildcard `Access-Control-Allow-Origin` may not be combined with
    /// `Access-Control-Allow-Credentials: true`, so such a config is rejected.
    pub fn is_wildcard_with_credentials(&self) -> bool {
        matches!(self.kind, Kind::WildcardWithCredentials)
    }

    /// Returns `true` if an allowed origin is not a legal header value.
    pub fn is_invalid_origin(&self) -> bool {
        matches!(self.kind, Kind::InvalidOrigin(_))
    }

    /// Returns `true` if an allowed method is not a valid HTTP method token.
    pub fn is_invalid_method(&self) -> bool {
        matches!(self.kind, Kind::InvalidMethod(_))
    }

    /// Returns `true` if an allowed header is not a valid header name.
    pub fn is_invalid_header(&self) -> bool {
        matches!(self.kind, Kind::InvalidHeader(_))
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::WildcardWithCredentials => f.write_str(
                "cors: allowing all origins conflicts with allowing credentials",
            ),
            Kind::InvalidOrigin(origin) => write!(f, "cors: invalid allowed origin {:?}", origin),
            Kind::InvalidMethod(method) => write!(f, "cors: invalid allowed method {:?}", method),
            Kind::InvalidHeader(header) => write!(f, "cors: invalid allowed header {:?}", header),
        }
    }
}

impl std::error::Error for ConfigError {}
