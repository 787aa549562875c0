//! Client configuration.

use std::time::Duration;

use roomlink_heartbeat::HeartbeatConfig;
use roomlink_protocol::FrameConfig;

/// Client descriptor string sent with login.
pub const DEFAULT_CLIENT_DESCRIPTOR: &str = "app:/TransformiceAIR.swf/[[DYNAMIC]]/2/[[DYNAMIC]]/4";

/// What the client reports about its host after the version is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub language: String,
    pub os: String,
    pub flash_version: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            language: "en".into(),
            os: "Linux".into(),
            flash_version: "LNX 29,0,0,140".into(),
        }
    }
}

/// Configuration for a [`Client`](crate::Client).
///
/// Every field has a default that matches what the official desktop
/// client sends; override only what you need.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Keep-alive timing. Default: every 15 s, first beat immediate.
    pub heartbeat: HeartbeatConfig,
    /// Locale sent in the handshake. Default: `"en"`.
    pub locale: String,
    pub system_info: SystemInfo,
    /// Sent as the third login field.
    pub client_descriptor: String,
    /// Inbound framing limits for both connections.
    pub frame: FrameConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat: HeartbeatConfig::default(),
            locale: "en".into(),
            system_info: SystemInfo::default(),
            client_descriptor: DEFAULT_CLIENT_DESCRIPTOR.into(),
            frame: FrameConfig::default(),
        }
    }
}

/// Builder for [`Client`](crate::Client).
///
/// ```rust
/// use std::time::Duration;
/// use roomlink::Client;
///
/// let client = Client::builder()
///     .heartbeat_period(Duration::from_secs(10))
///     .locale("fr")
///     .build();
/// assert_eq!(client.config().locale, "fr");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heartbeat_period(mut self, period: Duration) -> Self {
        self.config.heartbeat.period = period;
        self
    }

    pub fn heartbeat(mut self, config: HeartbeatConfig) -> Self {
        self.config.heartbeat = config;
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = locale.into();
        self
    }

    pub fn system_info(mut self, info: SystemInfo) -> Self {
        self.config.system_info = info;
        self
    }

    pub fn client_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.config.client_descriptor = descriptor.into();
        self
    }

    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.config.frame.max_frame_size = bytes;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> crate::Client {
        crate::Client::new(self.config)
    }
}
