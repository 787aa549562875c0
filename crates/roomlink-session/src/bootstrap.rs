//! Bootstrap: trading an external identity for session keys.
//!
//! roomlink does not talk to any key service itself. It defines the
//! [`Bootstrap`] trait, a single async method returning the service's JSON
//! answer, and the [`BootstrapResponse`] model that classifies it. Wire an
//! HTTP client behind the trait in production; [`StaticBootstrap`] serves
//! a saved response for tests and demos.
//!
//! The service answers in one of three shapes:
//!
//! ```text
//! {"success": true, "version": .., "connection_key": .., "ports": [..], "ip": ..,
//!  "auth_key": .., "identification_keys": [..], "msg_keys": [..]}
//! {"success": false, "error": ".."}
//! {"success": true, "internal_error": true, "internal_error_step": 2}
//! ```

use roomlink_protocol::CipherKeys;
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Internal error step the service reports during maintenance.
const MAINTENANCE_STEP: i64 = 2;

/// Minimum identification keys needed for the login cipher.
const MIN_IDENTIFICATION_KEYS: usize = 4;

/// Fetches session keys for an identity/token pair.
///
/// # Example
///
/// ```rust
/// use roomlink_session::{Bootstrap, BootstrapResponse, SessionError};
///
/// /// Always refuses. Handy for exercising the failure path.
/// struct Closed;
///
/// impl Bootstrap for Closed {
///     async fn fetch_keys(
///         &self,
///         _id: &str,
///         _token: &str,
///     ) -> Result<BootstrapResponse, SessionError> {
///         Err(SessionError::Unavailable("offline".into()))
///     }
/// }
/// ```
pub trait Bootstrap: Send + Sync + 'static {
    /// Returns the raw service answer. Classification into keys or an
    /// error happens in [`BootstrapResponse::into_keys`].
    fn fetch_keys(
        &self,
        id: &str,
        token: &str,
    ) -> impl std::future::Future<Output = Result<BootstrapResponse, SessionError>> + Send;
}

/// The key service's JSON answer.
///
/// Numeric key material is read as `i64` because the service may print
/// 32-bit values signed; [`into_keys`](Self::into_keys) narrows them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub internal_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_error_step: Option<i64>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub connection_key: String,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub auth_key: i64,
    #[serde(default)]
    pub identification_keys: Vec<i64>,
    #[serde(default)]
    pub msg_keys: Vec<i64>,
}

impl BootstrapResponse {
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Classifies the answer.
    ///
    /// # Errors
    /// - [`SessionError::BootstrapRejected`] when `success` is false
    /// - [`SessionError::Maintenance`] for internal error step 2
    /// - [`SessionError::BootstrapInternal`] for any other internal error
    /// - [`SessionError::InvalidKeys`] when a success lacks ports or keys
    pub fn into_keys(self) -> Result<SessionKeys, SessionError> {
        if !self.success {
            return Err(SessionError::BootstrapRejected(
                self.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        if self.internal_error {
            return Err(match self.internal_error_step {
                Some(MAINTENANCE_STEP) => SessionError::Maintenance,
                step => SessionError::BootstrapInternal(step.unwrap_or_default()),
            });
        }
        if self.ports.is_empty() {
            return Err(SessionError::InvalidKeys("no ports".into()));
        }
        if self.identification_keys.len() < MIN_IDENTIFICATION_KEYS {
            return Err(SessionError::InvalidKeys(format!(
                "{} identification keys, need {MIN_IDENTIFICATION_KEYS}",
                self.identification_keys.len()
            )));
        }
        if self.msg_keys.is_empty() {
            return Err(SessionError::InvalidKeys("no message keys".into()));
        }

        Ok(SessionKeys {
            version: self.version as i16,
            connection_key: self.connection_key,
            auth_client: self.auth_key as u32,
            cipher: CipherKeys {
                identification: self.identification_keys.iter().map(|&k| k as u32).collect(),
                message: self.msg_keys.iter().map(|&k| k as u32).collect(),
            },
            ports: self.ports,
            host: self.ip,
        })
    }
}

/// Everything the client needs from bootstrap to connect and log in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionKeys {
    /// Game version sent in the handshake.
    pub version: i16,
    /// Connection key sent in the handshake.
    pub connection_key: String,
    /// Client half of the login token, xored with the server's half.
    pub auth_client: u32,
    pub cipher: CipherKeys,
    /// Gateway ports. The main connection and every room-server connection
    /// use the first one.
    pub ports: Vec<u16>,
    /// Gateway host.
    pub host: String,
}

impl SessionKeys {
    /// The port every connection dials. Present once keys were validated.
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }
}

/// Serves one pre-fetched response regardless of identity.
#[derive(Debug, Clone)]
pub struct StaticBootstrap {
    response: BootstrapResponse,
}

impl StaticBootstrap {
    pub fn new(response: BootstrapResponse) -> Self {
        Self { response }
    }

    /// Parses a saved service answer.
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        BootstrapResponse::from_json(text).map(Self::new)
    }
}

impl Bootstrap for StaticBootstrap {
    async fn fetch_keys(&self, id: &str, _token: &str) -> Result<BootstrapResponse, SessionError> {
        tracing::debug!(id, "serving static bootstrap response");
        Ok(self.response.clone())
    }
}
