use std::time::Duration;

use super::{ConfigError, CorsPolicy};

/// Configuration for a [`CorsPolicy`].
///
/// Build one with the chaining methods and turn it into a policy with
/// [`CorsConfig::build`] (or [`CorsPolicy::new`]).
///
/// ```
/// use tower_cors_policy::cors::CorsConfig;
/// use std::time::Duration;
///
/// let policy = CorsConfig::new()
///     .allow_origin("https://app.example.com")
///     .allow_methods(["GET", "POST", "PUT"])
///     .allow_headers(["Content-Type", "Authorization"])
///     .allow_credentials(true)
///     .max_age(Duration::from_secs(600))
///     .build()
///     .unwrap();
/// # drop(policy);
/// ```
///
/// With the `serde` feature enabled the config can be deserialized, every
/// field being optional:
///
/// ```json
/// {
///     "allow_origins": ["https://app.example.com"],
///     "allow_credentials": true,
///     "max_age_secs": 600
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CorsConfig {
    /// Origins (`scheme://host[:port]`) admitted by exact, case-sensitive
    /// comparison. Ignored when `allow_all_origins` is set.
    pub allow_origins: Vec<String>,
    /// Admit every origin and answer with `Access-Control-Allow-Origin: *`.
    pub allow_all_origins: bool,
    /// Methods for `Access-Control-Allow-Methods`. Defaults to
    /// `GET, POST, HEAD` when empty.
    pub allow_methods: Vec<String>,
    /// Header names for `Access-Control-Allow-Headers`. The header is omitted
    /// when empty.
    pub allow_headers: Vec<String>,
    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
    /// Value of `Access-Control-Max-Age`. Defaults to one day when zero.
    pub max_age_secs: u64,
}

impl CorsConfig {
    /// Create an empty config. On its own it admits no origins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a single origin, in addition to any already configured.
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origins.push(origin.into());
        self
    }

    /// Admit each of the given origins, in addition to any already configured.
    pub fn allow_origins<I>(mut self, origins: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allow_origins
            .extend(origins.into_iter().map(Into::into));
        self
    }

    /// Admit every origin.
    ///
    /// Cannot be combined with [`allow_credentials`](Self::allow_credentials).
    pub fn allow_all_origins(mut self, allow_all_origins: bool) -> Self {
        self.allow_all_origins = allow_all_origins;
        self
    }

    /// Set the allowed methods, replacing any previous value.
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allow_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Set the allowed request headers, replacing any previous value.
    pub fn allow_headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allow_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Declare that credentialed requests are allowed.
    ///
    /// Cannot be combined with [`allow_all_origins`](Self::allow_all_origins).
    pub fn allow_credentials(mut self, allow_credentials: bool) -> Self {
        self.allow_credentials = allow_credentials;
        self
    }

    /// Set how long browsers may cache a preflight result.
    ///
    /// Sub-second precision is dropped.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age_secs = max_age.as_secs();
        self
    }

    /// Set how long browsers may cache a preflight result, in seconds.
    pub fn max_age_secs(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }

    /// Validate the config and build a [`CorsPolicy`] from it.
    pub fn build(self) -> Result<CorsPolicy, ConfigError> {
        CorsPolicy::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_origins_and_replaces_lists() {
        let config = CorsConfig::new()
            .allow_origin("https://a.example")
            .allow_origins(vec!["https://b.example", "https://c.example"])
            .allow_methods(["GET"])
            .allow_methods(["PUT", "DELETE"])
            .max_age(Duration::from_millis(90_500));

        assert_eq!(
            config.allow_origins,
            ["https://a.example", "https://b.example", "https://c.example"]
        );
        assert_eq!(config.allow_methods, ["PUT", "DELETE"]);
        assert_eq!(config.max_age_secs, 90);
        assert!(!config.allow_all_origins);
        assert!(!config.allow_credentials);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_with_missing_fields() {
        let config: CorsConfig = serde_json::from_str(
            r#"{ "allow_origins": ["https://a.example"], "allow_credentials": true }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            CorsConfig::new()
                .allow_origin("https://a.example")
                .allow_credentials(true)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_wildcard_with_credentials_fails_to_build() {
        let config: CorsConfig =
            serde_json::from_str(r#"{ "allow_all_origins": true, "allow_credentials": true }"#)
                .unwrap();

        assert!(config.build().unwrap_err().is_wildcard_with_credentials());
    }
}
