//! Request authorization core for the Inkpress CMS.
//!
//! This crate decides whether a request may proceed and how much of a payload
//! the requester may see. It is deliberately free of HTTP and database types:
//! session lookup and storage connection are reached through the
//! [`SessionResolver`] and [`StoreConnector`] traits, implemented by the `user`
//! and `database` crates.
//!
//! # Architecture Overview
//!
//! 1. **Request arrives** at an API controller
//! 2. **[`AuthorizationGate`]** resolves the session, refuses inactive
//!    accounts, checks role / permission / ids and connects the store
//! 3. The controller loads the targeted records and applies
//!    **[`OwnershipPolicy`]** (authorship and demo-data protection)
//! 4. The payload is shaped with **[`include_if_permitted`]** and
//!    **[`populate_if_permitted`]**
//!
//! # Modules
//!
//! - [`permissions`]: the static role → permission table and checks
//! - [`classifier`]: super-admin classification and account guards
//! - [`projection`]: permission-conditional payload shaping
//! - [`ownership`]: the owner-or-admin-or-superadmin rule for mutations
//! - [`identifier`]: syntactic id validation
//! - [`gate`]: the ordered, fail-fast authorization pipeline
//! - [`outcome`]: `Authorized | Denied` and the canonical denials

#![deny(rustdoc::broken_intra_doc_links)]

pub mod classifier;
pub mod error;
pub mod gate;
pub mod identifier;
pub mod outcome;
pub mod ownership;
pub mod permissions;
pub mod projection;
pub mod types;

pub use classifier::{is_super_admin, may_assign_role, may_modify_account};
pub use error::{AuthzError, Result};
pub use gate::{AuthorizationGate, GateOptions, GateStep, SessionPayload, SessionResolver, StoreConnector};
pub use identifier::{is_valid_id, IdSelector};
pub use outcome::{AuthOutcome, Denial};
pub use ownership::{MissingPolicy, OwnedResource, OwnershipBypass, OwnershipPolicy, OwnershipViolation};
pub use permissions::{
    has_permission, has_permission_by_name, permissions_for, role_grants, user_can, Permission,
};
pub use projection::{include_if_permitted, populate_if_permitted, Populate, PopulateSpec, QueryPlan};
pub use types::{Principal, Role, UserType};
