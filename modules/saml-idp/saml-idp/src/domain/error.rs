//! Domain errors for the SAML `IdP` decision core.

use saml_idp_sdk::{
    Saml2ErrorStatus, Saml2Status, SamlIdpError, SessionStoreError, UnrecoverableError,
};

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("protocol error: {0}")]
    Protocol(Saml2Status),

    #[error("session state error: {0}")]
    State(#[from] StateError),

    #[error("session store error: {0}")]
    SessionStore(#[from] SessionStoreError),

    #[error("authenticator not available: {0}")]
    AuthenticatorUnavailable(String),

    #[error("unrecoverable: {0}")]
    Unrecoverable(UnrecoverableError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub(crate) fn protocol(status: Saml2ErrorStatus, message: impl Into<String>) -> Self {
        Self::Protocol(Saml2Status::with_message(status, message))
    }
}

/// Inconsistent redirect/resume state in a session.
///
/// Always fatal for the request at hand. The user-facing error never says
/// which of these occurred.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("no pending external authentication in session")]
    NoPendingAuthentication,

    #[error("no external authentication result in session")]
    NoResult,

    #[error("external authentication result present without a pending request")]
    ResultWithoutPendingToken,
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<SamlIdpError> for DomainError {
    fn from(e: SamlIdpError) -> Self {
        match e {
            SamlIdpError::Status(status) => Self::Protocol(status),
            SamlIdpError::Unrecoverable(u) => Self::Unrecoverable(u),
            SamlIdpError::ServiceUnavailable(msg) => Self::AuthenticatorUnavailable(msg),
            SamlIdpError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for SamlIdpError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Protocol(status) => Self::Status(status),
            DomainError::State(_) => Self::Unrecoverable(UnrecoverableError::InvalidSession),
            DomainError::Unrecoverable(u) => Self::Unrecoverable(u),
            DomainError::SessionStore(SessionStoreError::Unavailable(msg))
            | DomainError::AuthenticatorUnavailable(msg) => Self::ServiceUnavailable(msg),
            DomainError::SessionStore(e @ SessionStoreError::Serialization(_)) => {
                Self::Internal(e.to_string())
            }
            DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}
