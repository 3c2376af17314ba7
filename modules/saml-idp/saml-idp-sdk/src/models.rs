//! Domain models for the SAML `IdP` module.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::attributes::{
    AttributeConsumingService, AttributeRequirementSet, RequestedAttribute, UserAttribute,
};
use crate::error::{Saml2Status, SamlIdpError};

/// Snapshot of the requester's metadata, as supplied by the metadata collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMetadata {
    /// Requester entity ID.
    pub entity_id: String,
    /// Entity category URIs declared by the requester.
    #[serde(default)]
    pub entity_categories: Vec<String>,
    /// `AttributeConsumingService` entries in metadata order.
    #[serde(default)]
    pub attribute_consuming_services: Vec<AttributeConsumingService>,
}

impl PeerMetadata {
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Whether the requester declares `category`.
    #[must_use]
    pub fn declares(&self, category: &str) -> bool {
        self.entity_categories.iter().any(|c| c == category)
    }
}

/// A validated, normalized authentication request.
///
/// Built once per inbound request and never mutated afterwards. Collection
/// fields are owned copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnRequestContext {
    request_id: String,
    peer: PeerMetadata,
    requested_authn_contexts: Vec<String>,
    force_authn: bool,
    passive: bool,
    attribute_consuming_service_index: Option<u32>,
    oasis_requested_attributes: Option<Vec<RequestedAttribute>>,
    eidas_requested_attributes: Option<Vec<RequestedAttribute>>,
    principal_selection: Vec<UserAttribute>,
}

impl AuthnRequestContext {
    #[must_use]
    pub fn builder(request_id: impl Into<String>, peer: PeerMetadata) -> AuthnRequestContextBuilder {
        AuthnRequestContextBuilder {
            inner: Self {
                request_id: request_id.into(),
                peer,
                requested_authn_contexts: Vec::new(),
                force_authn: false,
                passive: false,
                attribute_consuming_service_index: None,
                oasis_requested_attributes: None,
                eidas_requested_attributes: None,
                principal_selection: Vec::new(),
            },
        }
    }

    /// ID of the SAML `AuthnRequest`, used for log correlation.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Requester entity ID.
    #[must_use]
    pub fn requester(&self) -> &str {
        &self.peer.entity_id
    }

    #[must_use]
    pub fn peer(&self) -> &PeerMetadata {
        &self.peer
    }

    /// Requested authentication context URIs, in request order.
    ///
    /// An empty list means the requester accepts any context.
    #[must_use]
    pub fn requested_authn_contexts(&self) -> &[String] {
        &self.requested_authn_contexts
    }

    #[must_use]
    pub fn force_authn(&self) -> bool {
        self.force_authn
    }

    #[must_use]
    pub fn passive(&self) -> bool {
        self.passive
    }

    /// `AttributeConsumingServiceIndex` carried on the request.
    #[must_use]
    pub fn attribute_consuming_service_index(&self) -> Option<u32> {
        self.attribute_consuming_service_index
    }

    /// Attributes listed in the OASIS `RequestedAttributes` extension, if present.
    #[must_use]
    pub fn oasis_requested_attributes(&self) -> Option<&[RequestedAttribute]> {
        self.oasis_requested_attributes.as_deref()
    }

    /// Attributes listed in the `eIDAS` `RequestedAttributes` extension, if present.
    #[must_use]
    pub fn eidas_requested_attributes(&self) -> Option<&[RequestedAttribute]> {
        self.eidas_requested_attributes.as_deref()
    }

    /// Attribute values identifying the principal the requester expects.
    #[must_use]
    pub fn principal_selection(&self) -> &[UserAttribute] {
        &self.principal_selection
    }

    /// Returns a copy of this context carrying `authn_contexts` as its
    /// requested contexts.
    #[must_use]
    pub fn with_authn_contexts(&self, authn_contexts: Vec<String>) -> Self {
        Self {
            requested_authn_contexts: authn_contexts,
            ..self.clone()
        }
    }
}

/// Builder for [`AuthnRequestContext`].
#[derive(Debug, Clone)]
pub struct AuthnRequestContextBuilder {
    inner: AuthnRequestContext,
}

impl AuthnRequestContextBuilder {
    #[must_use]
    pub fn requested_authn_contexts<I, S>(mut self, uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.requested_authn_contexts = uris.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn force_authn(mut self, force_authn: bool) -> Self {
        self.inner.force_authn = force_authn;
        self
    }

    #[must_use]
    pub fn passive(mut self, passive: bool) -> Self {
        self.inner.passive = passive;
        self
    }

    #[must_use]
    pub fn attribute_consuming_service_index(mut self, index: u32) -> Self {
        self.inner.attribute_consuming_service_index = Some(index);
        self
    }

    #[must_use]
    pub fn oasis_requested_attributes(mut self, attributes: Vec<RequestedAttribute>) -> Self {
        self.inner.oasis_requested_attributes = Some(attributes);
        self
    }

    #[must_use]
    pub fn eidas_requested_attributes(mut self, attributes: Vec<RequestedAttribute>) -> Self {
        self.inner.eidas_requested_attributes = Some(attributes);
        self
    }

    #[must_use]
    pub fn principal_selection(mut self, hints: Vec<UserAttribute>) -> Self {
        self.inner.principal_selection = hints;
        self
    }

    #[must_use]
    pub fn build(self) -> AuthnRequestContext {
        self.inner
    }
}

/// A completed user authentication.
///
/// Produced by an authenticator; when kept in the session it is the candidate
/// for SSO on later requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuthentication {
    #[serde(default)]
    pub subject_attributes: Vec<UserAttribute>,
    /// Authentication context URI the user was authenticated under.
    pub assurance_context_uri: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub authenticated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticating_authority: Option<String>,
    /// Whether this authentication may be reused for SSO.
    #[serde(default)]
    pub reusable: bool,
}

impl UserAuthentication {
    #[must_use]
    pub fn attribute(&self, id: &str) -> Option<&UserAttribute> {
        self.subject_attributes.iter().find(|a| a.id == id)
    }
}

/// Vote cast by a single SSO voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsoVote {
    Ok,
    Deny,
    DontKnow,
}

/// State persisted in the session while an external authenticator runs.
///
/// Deserialized tokens go through the same path validation as
/// [`PendingRedirectToken::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredPendingRedirectToken")]
pub struct PendingRedirectToken {
    context: AuthnRequestContext,
    authn_path: String,
    resume_path: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

#[derive(Deserialize)]
struct StoredPendingRedirectToken {
    context: AuthnRequestContext,
    authn_path: String,
    resume_path: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

impl TryFrom<StoredPendingRedirectToken> for PendingRedirectToken {
    type Error = SamlIdpError;

    fn try_from(stored: StoredPendingRedirectToken) -> Result<Self, Self::Error> {
        Self::new(
            stored.context,
            &stored.authn_path,
            &stored.resume_path,
            stored.created_at,
        )
    }
}

impl PendingRedirectToken {
    /// Creates a token after validating both paths.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if either path is empty, does not start with `/`, or
    /// names another origin (`//host`) after trimming.
    pub fn new(
        context: AuthnRequestContext,
        authn_path: &str,
        resume_path: &str,
        created_at: OffsetDateTime,
    ) -> Result<Self, SamlIdpError> {
        Ok(Self {
            context,
            authn_path: validate_path("authn", authn_path)?,
            resume_path: validate_path("resume", resume_path)?,
            created_at,
        })
    }

    /// The request being authenticated.
    #[must_use]
    pub fn context(&self) -> &AuthnRequestContext {
        &self.context
    }

    #[must_use]
    pub fn authn_path(&self) -> &str {
        &self.authn_path
    }

    #[must_use]
    pub fn resume_path(&self) -> &str {
        &self.resume_path
    }

    #[must_use]
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    #[must_use]
    pub fn into_context(self) -> AuthnRequestContext {
        self.context
    }
}

fn validate_path(kind: &str, path: &str) -> Result<String, SamlIdpError> {
    let trimmed = path.trim();
    // "//host" and "/\\host" are resolved by browsers as another origin
    if trimmed.starts_with('/') && !trimmed.starts_with("//") && !trimmed.starts_with("/\\") {
        Ok(trimmed.to_owned())
    } else {
        Err(SamlIdpError::Internal(format!(
            "{kind} path must be a local path starting with a single '/', got '{trimmed}'"
        )))
    }
}

/// Result committed by an external authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ExternalAuthnResult {
    Success(UserAuthentication),
    Failure(Saml2Status),
}

/// An external result re-attached to the request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumedAuthentication {
    pub context: AuthnRequestContext,
    pub result: ExternalAuthnResult,
}

/// Where to send the user agent for external authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectInstruction {
    /// `authn_path?resumeUrl=<encoded resume_path>`.
    pub location: String,
    pub authn_path: String,
    pub resume_path: String,
}

impl RedirectInstruction {
    #[must_use]
    pub fn for_token(token: &PendingRedirectToken) -> Self {
        Self {
            location: format!(
                "{}?resumeUrl={}",
                token.authn_path(),
                urlencoding::encode(token.resume_path())
            ),
            authn_path: token.authn_path().to_owned(),
            resume_path: token.resume_path().to_owned(),
        }
    }
}

/// Outcome of running the authentication pipeline for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthnOutcome {
    /// The user is authenticated; response building may proceed.
    Authenticated {
        /// The request being answered. After a resume this is the request
        /// that was suspended.
        request: AuthnRequestContext,
        authentication: UserAuthentication,
        requirements: AttributeRequirementSet,
        /// `true` when a prior authentication was reused.
        sso: bool,
    },
    /// Authentication continues at an external authenticator.
    Redirect(RedirectInstruction),
}
