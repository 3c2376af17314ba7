//! Domain layer for the SAML `IdP` decision core.

pub mod error;
pub mod local_client;
pub mod redirect;
pub mod requirements;
pub mod service;
pub mod sso;

pub use error::{DomainError, StateError};
pub use local_client::SamlIdpLocalClient;
pub use redirect::RedirectResumeCoordinator;
pub use requirements::{RequirementResolver, RequirementSource};
pub use service::Service;
pub use sso::{SsoArbiter, SsoDecision, SsoVoter};
