//! Core types shared by the registry and the dispatcher.

use std::fmt;
use std::str::FromStr;

/// Handler invoked for intent verification (GET with `hub.mode=accepted`).
pub const RESOURCE_NAME_ON_INTENT_VERIFICATION: &str = "onIntentVerification";

/// Handler invoked for content notifications (POST).
pub const RESOURCE_NAME_ON_NOTIFICATION: &str = "onNotification";

/// Handler invoked when the hub denies a subscription (GET with `hub.mode=denied`).
pub const RESOURCE_NAME_ON_SUBSCRIPTION_DENIED: &str = "onSubscriptionDenied";

/// Configuration identifier for header based topic identification.
pub const TOPIC_ID_HEADER: &str = "TOPIC_ID_HEADER";

/// Configuration identifier for payload key based topic identification.
pub const TOPIC_ID_PAYLOAD_KEY: &str = "TOPIC_ID_PAYLOAD_KEY";

/// Configuration identifier for combined header and payload key identification.
pub const TOPIC_ID_HEADER_AND_PAYLOAD: &str = "TOPIC_ID_HEADER_AND_PAYLOAD";

/// Query parameter carrying the verification mode.
pub const HUB_MODE_PARAM: &str = "hub.mode";

/// Query parameter carrying the verification challenge.
pub const HUB_CHALLENGE_PARAM: &str = "hub.challenge";

/// How a service maps an inbound notification to one of its handlers.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default)]
pub enum TopicStrategy {
    /// Topic is read from a configured request header
    ByHeader,
    /// Topic is read from a top-level key of the JSON payload
    ByPayloadKey,
    /// Header selects a payload-key map, with header and payload fallbacks
    ByHeaderAndPayloadKey,
    /// Every notification goes to `onNotification`
    #[default]
    None,
}

impl TopicStrategy {
    /// Whether the strategy reads the configured topic header.
    pub fn requires_header(&self) -> bool {
        matches!(self, Self::ByHeader | Self::ByHeaderAndPayloadKey)
    }

    /// Whether the strategy needs the request body before it can resolve.
    pub fn requires_payload(&self) -> bool {
        matches!(self, Self::ByPayloadKey | Self::ByHeaderAndPayloadKey)
    }

    /// The configuration identifier for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByHeader => TOPIC_ID_HEADER,
            Self::ByPayloadKey => TOPIC_ID_PAYLOAD_KEY,
            Self::ByHeaderAndPayloadKey => TOPIC_ID_HEADER_AND_PAYLOAD,
            Self::None => "none",
        }
    }
}

impl fmt::Display for TopicStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(TOPIC_ID_HEADER) {
            Ok(Self::ByHeader)
        } else if s.eq_ignore_ascii_case(TOPIC_ID_PAYLOAD_KEY) {
            Ok(Self::ByPayloadKey)
        } else if s.eq_ignore_ascii_case(TOPIC_ID_HEADER_AND_PAYLOAD) {
            Ok(Self::ByHeaderAndPayloadKey)
        } else if s.is_empty() || s.eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else {
            Err(s.to_string())
        }
    }
}

/// Verification mode sent by the hub on GET requests.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HubMode {
    /// The hub accepted the subscription and asks for intent verification
    Accepted,
    /// The hub denied the subscription
    Denied,
}

impl HubMode {
    /// Parse a `hub.mode` value, ignoring ASCII case.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("accepted") {
            Some(Self::Accepted)
        } else if value.eq_ignore_ascii_case("denied") {
            Some(Self::Denied)
        } else {
            None
        }
    }

    /// The handler name this mode resolves to.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Accepted => RESOURCE_NAME_ON_INTENT_VERIFICATION,
            Self::Denied => RESOURCE_NAME_ON_SUBSCRIPTION_DENIED,
        }
    }
}
