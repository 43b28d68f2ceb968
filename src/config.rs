//! Client configuration.
//!
//! Socket endpoint and handshake settings, plus the fallbacks used when
//! question payloads leave fields out.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use trivia_live::ClientConfig;
//!
//! let config = ClientConfig::new("wss://trivia.example.com/ws")?
//!     .with_heart_beat(5_000, 5_000)
//!     .with_ping_interval(Duration::from_secs(20))
//!     .with_event_capacity(128);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::game::QuestionDefaults;

// ============================================================================
// Constants
// ============================================================================

/// Protocol version offered in the handshake.
pub const DEFAULT_ACCEPT_VERSION: &str = "1.2";

/// Heartbeat negotiation offered in the handshake, in milliseconds.
pub const DEFAULT_HEART_BEAT: (u32, u32) = (10_000, 10_000);

/// Buffer size of each broadcast event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

// ============================================================================
// ClientConfig
// ============================================================================

/// Session layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Socket endpoint (`ws://` or `wss://`).
    pub ws_url: Url,

    /// Value of the `accept-version` handshake header.
    pub accept_version: String,

    /// Outgoing/incoming heartbeat intervals in milliseconds.
    pub heart_beat: (u32, u32),

    /// Period of keep-alive pings sent by the receive loop. `None` disables them.
    pub ping_interval: Option<Duration>,

    /// Buffer size of the broadcast event channels.
    pub event_capacity: usize,

    /// Fallbacks applied while resolving question payloads.
    pub question_defaults: QuestionDefaults,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientConfig {
    /// Creates a configuration for the given socket URL with default settings.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the URL does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    pub fn new(ws_url: &str) -> Result<Self> {
        let config = Self::from_url(Url::parse(ws_url)?);
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration from an already parsed URL.
    #[must_use]
    pub fn from_url(ws_url: Url) -> Self {
        Self {
            ws_url,
            accept_version: DEFAULT_ACCEPT_VERSION.to_string(),
            heart_beat: DEFAULT_HEART_BEAT,
            ping_interval: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            question_defaults: QuestionDefaults::default(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientConfig {
    /// Sets the `accept-version` handshake header.
    #[inline]
    #[must_use]
    pub fn with_accept_version(mut self, version: impl Into<String>) -> Self {
        self.accept_version = version.into();
        self
    }

    /// Sets the heartbeat negotiation in milliseconds.
    #[inline]
    #[must_use]
    pub fn with_heart_beat(mut self, outgoing_ms: u32, incoming_ms: u32) -> Self {
        self.heart_beat = (outgoing_ms, incoming_ms);
        self
    }

    /// Enables periodic keep-alive pings.
    #[inline]
    #[must_use]
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    /// Sets the broadcast channel capacity. Values below 1 are clamped to 1.
    #[inline]
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Sets the question resolution fallbacks.
    #[inline]
    #[must_use]
    pub fn with_question_defaults(mut self, defaults: QuestionDefaults) -> Self {
        self.question_defaults = defaults;
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ClientConfig {
    /// Returns the `heart-beat` header value, e.g. `10000,10000`.
    #[must_use]
    pub fn heart_beat_header(&self) -> String {
        format!("{},{}", self.heart_beat.0, self.heart_beat.1)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails.
    pub fn validate(&self) -> Result<()> {
        match self.ws_url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::config(format!(
                    "Socket URL scheme must be ws or wss, got {other}"
                )));
            }
        }

        if self.accept_version.trim().is_empty() {
            return Err(Error::config("accept-version must not be empty"));
        }

        if let Some(interval) = self.ping_interval
            && interval.is_zero()
        {
            return Err(Error::config("Ping interval must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
