//! Business logic: identity orchestration, authorization policy, tokens,
//! and the reconciliation sweep.

mod identity_service;
mod policy;
mod reconciler;
mod token;

pub use identity_service::{IdentityCore, IdentityService};
pub use policy::AccessPolicy;
pub use reconciler::{ReconcileReport, Reconciler};
pub use token::{Claims, TokenManager, TokenResponse};

#[cfg(test)]
pub use identity_service::MockIdentityService;
