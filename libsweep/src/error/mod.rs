//! Error types for Sweep
//!
//! Every fallible operation in the library returns [`SweepError`]. Transient
//! maintenance responses are retried inside the transport and only surface
//! here once retries are exhausted, as [`SweepError::Unavailable`].

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Main error type for Sweep operations
#[derive(Error, Debug)]
pub enum SweepError {
    /// Network-related errors (connection, timeout, DNS)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Authentication errors (401, 403)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Resource not found errors (404, unknown namespace)
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Rate limiting errors (429)
    #[error("Rate limit: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Non-transient HTTP errors (other 4xx and 5xx)
    #[error("Server error (status: {status_code}): {message}")]
    Server { message: String, status_code: u16 },

    /// The API stayed in maintenance for every attempt
    #[error("Service unavailable (status: {status}) after {attempts} attempts: {url}")]
    Unavailable {
        status: u16,
        attempts: u32,
        url: String,
    },

    /// Unexpected response payloads
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed retention policy input (grace duration, pattern, status)
    #[error("Invalid {field} '{input}': {message}")]
    Policy {
        field: String,
        input: String,
        message: String,
    },

    /// Configuration errors (conflicting settings, invalid config file)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

impl SweepError {
    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    ///
    /// let err = SweepError::network("connection refused");
    /// assert!(matches!(err, SweepError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    ///
    /// let err = SweepError::not_found("namespace", "team-a");
    /// assert_eq!(err.to_string(), "namespace not found: team-a");
    /// ```
    pub fn not_found<S: Into<String>, N: Into<String>>(resource_type: S, name: N) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new server error.
    pub fn server<S: Into<String>>(message: S, status_code: u16) -> Self {
        Self::Server {
            message: message.into(),
            status_code,
        }
    }

    /// Creates the terminal error raised when retries are exhausted.
    pub fn unavailable<S: Into<String>>(status: u16, attempts: u32, url: S) -> Self {
        Self::Unavailable {
            status,
            attempts,
            url: url.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new policy error naming the offending input.
    ///
    /// # Examples
    ///
    /// ```
    /// use libsweep::error::SweepError;
    ///
    /// let err = SweepError::policy("grace duration", "3 days", "expected <N>hr<N>m<N>s");
    /// assert!(err.to_string().contains("'3 days'"));
    /// ```
    pub fn policy<F, I, M>(field: F, input: I, message: M) -> Self
    where
        F: Into<String>,
        I: Into<String>,
        M: Into<String>,
    {
        Self::Policy {
            field: field.into(),
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status_code, .. } => *status_code,
            Self::NotFound { .. } => Some(404),
            Self::RateLimit { .. } => Some(429),
            Self::Server { status_code, .. } => Some(*status_code),
            Self::Unavailable { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for errors raised before any network activity
    /// (bad policy input or configuration).
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Policy { .. } | Self::Config { .. })
    }
}

impl From<config::ConfigError> for SweepError {
    fn from(err: config::ConfigError) -> Self {
        SweepError::config_with_source("Failed to build configuration", None, err)
    }
}
