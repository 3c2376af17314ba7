//! Error types for the SAML `IdP` module.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const STATUS_REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";
const STATUS_RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";

/// Protocol-level failure kinds that are reported back to the requester as a
/// SAML error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Saml2ErrorStatus {
    /// None of the requested authentication contexts can be satisfied.
    NoAuthnContext,
    /// Passive authentication was requested but the user would have to be prompted.
    PassiveAuthn,
    /// User authentication failed.
    AuthnFailed,
    /// User cancelled authentication.
    Cancel,
    /// The authentication request could not be processed.
    InvalidAuthnRequest,
}

impl Saml2ErrorStatus {
    /// Top-level SAML status code.
    #[must_use]
    pub const fn status_code(self) -> &'static str {
        match self {
            Self::NoAuthnContext | Self::InvalidAuthnRequest => STATUS_REQUESTER,
            Self::PassiveAuthn | Self::AuthnFailed | Self::Cancel => STATUS_RESPONDER,
        }
    }

    /// Subordinate SAML status code.
    #[must_use]
    pub const fn sub_status_code(self) -> &'static str {
        match self {
            Self::NoAuthnContext => "urn:oasis:names:tc:SAML:2.0:status:NoAuthnContext",
            Self::PassiveAuthn => "urn:oasis:names:tc:SAML:2.0:status:NoPassive",
            Self::AuthnFailed => "urn:oasis:names:tc:SAML:2.0:status:AuthnFailed",
            Self::Cancel => "http://id.elegnamnden.se/status/1.0/cancel",
            Self::InvalidAuthnRequest => "urn:oasis:names:tc:SAML:2.0:status:RequestUnsupported",
        }
    }

    /// Message code used when resolving a localized status message.
    #[must_use]
    pub const fn message_code(self) -> &'static str {
        match self {
            Self::NoAuthnContext => "idp.error.status.no-authn-context",
            Self::PassiveAuthn => "idp.error.status.passive",
            Self::AuthnFailed => "idp.error.status.authn-failed",
            Self::Cancel => "idp.error.status.cancel",
            Self::InvalidAuthnRequest => "idp.error.status.invalid-request",
        }
    }

    /// Message used when no localized text is available.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::NoAuthnContext => "None of the requested authentication contexts are supported",
            Self::PassiveAuthn => "Passive authentication not possible",
            Self::AuthnFailed => "User authentication failed",
            Self::Cancel => "User cancelled authentication",
            Self::InvalidAuthnRequest => "Invalid authentication request",
        }
    }
}

/// A protocol-level failure with an optional detail message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Saml2Status {
    pub status: Saml2ErrorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Saml2Status {
    #[must_use]
    pub fn new(status: Saml2ErrorStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(status: Saml2ErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    /// Detail message, falling back to the status default.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.status.default_message())
    }
}

impl From<Saml2ErrorStatus> for Saml2Status {
    fn from(status: Saml2ErrorStatus) -> Self {
        Self::new(status)
    }
}

impl fmt::Display for Saml2Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.status.sub_status_code())
    }
}

/// Failures that cannot be reported to the requester as a SAML response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrecoverableError {
    /// Session data required to continue the request is missing or inconsistent.
    InvalidSession,
    /// An internal error occurred.
    Internal,
}

impl UnrecoverableError {
    #[must_use]
    pub const fn message_code(self) -> &'static str {
        match self {
            Self::InvalidSession => "idp.error.unrecoverable.session",
            Self::Internal => "idp.error.unrecoverable.internal",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidSession => "Required session data could not be found",
            Self::Internal => "An internal error occurred",
        }
    }
}

impl fmt::Display for UnrecoverableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors that can occur when using the SAML `IdP` API.
#[derive(Debug, Error)]
pub enum SamlIdpError {
    /// Protocol-level failure to be returned as a SAML error response.
    #[error("saml status: {0}")]
    Status(Saml2Status),

    /// The request cannot continue and no SAML response can be sent.
    #[error("unrecoverable: {0}")]
    Unrecoverable(UnrecoverableError),

    /// A collaborator (authenticator plugin, session store) is not available.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SamlIdpError {
    #[must_use]
    pub fn status(status: Saml2ErrorStatus) -> Self {
        Self::Status(Saml2Status::new(status))
    }

    /// Returns the SAML status if this error can be sent to the requester.
    #[must_use]
    pub fn as_status(&self) -> Option<&Saml2Status> {
        match self {
            Self::Status(s) => Some(s),
            _ => None,
        }
    }
}

/// Errors reported by a [`crate::SessionStore`] backend.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Stored value could not be encoded or decoded.
    #[error("session value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store could not be reached.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
