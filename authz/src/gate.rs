//! The authorization gate every protected operation passes through.
//!
//! # Authorization Flow
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. Resolve the session (403 "Session not Found")
//! 2. Extract the principal (401 "User not Authenticated")
//! 3. Refuse inactive accounts, unconditionally (401)
//! 4. Optional role check (403)
//! 5. Optional permission check (403 "Access Denied")
//! 6. Optional identifier validation (400)
//! 7. Optional storage connection
//!
//! Steps 3 to 6 are pure functions of `(options, principal)` listed in
//! [`PRINCIPAL_CHECKS`], so each can be tested on its own. Only steps 1 and 7
//! touch the outside world, and only their failures surface as `Err`.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::identifier::{check_ids, IdProblem, IdSelector};
use crate::outcome::{AuthOutcome, Denial};
use crate::permissions::{user_can, Permission};
use crate::types::{Principal, Role};

/// What the session resolver found for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPayload {
    /// The principal embedded in the session, if any
    pub user: Option<Principal>,
}

/// Looks up the session attached to a request.
///
/// `Ok(None)` means there is no session at all. Errors are infrastructure
/// failures and are propagated without retry.
#[async_trait]
pub trait SessionResolver<Req: ?Sized + Sync>: Send + Sync {
    async fn resolve(&self, request: &Req) -> Result<Option<SessionPayload>>;
}

/// Establishes (or reuses) the storage connection.
///
/// Implementations must be idempotent and must coalesce concurrent first
/// calls into a single connection attempt.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn ensure_connected(&self) -> Result<()>;
}

/// Options for one gate invocation. Everything is off by default except the
/// storage connection.
#[derive(Debug, Clone)]
pub struct GateOptions {
    pub check_role: bool,
    /// Allowed roles when `check_role` is set
    pub roles: Vec<Role>,
    /// Permission to require, if any
    pub permission: Option<Permission>,
    pub check_valid_id: bool,
    pub id_to_check: Option<IdSelector>,
    pub require_db: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            check_role: false,
            roles: vec![Role::Admin],
            permission: None,
            check_valid_id: false,
            id_to_check: None,
            require_db: true,
        }
    }
}

impl GateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the principal's role to be one of `roles`.
    pub fn require_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.check_role = true;
        self.roles = roles.into_iter().collect();
        self
    }

    /// Require the default role set (admin only).
    pub fn require_admin(mut self) -> Self {
        self.check_role = true;
        self
    }

    pub fn require_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn validate_id(mut self, ids: impl Into<IdSelector>) -> Self {
        self.check_valid_id = true;
        self.id_to_check = Some(ids.into());
        self
    }

    /// Validate an id that may not have been supplied at all.
    pub fn validate_optional_id(mut self, ids: Option<IdSelector>) -> Self {
        self.check_valid_id = true;
        self.id_to_check = ids;
        self
    }

    pub fn without_db(mut self) -> Self {
        self.require_db = false;
        self
    }
}

/// Named pipeline steps, used in logs and to address checks in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStep {
    ResolveSession,
    ExtractPrincipal,
    CheckActive,
    CheckRole,
    CheckPermission,
    ValidateIds,
    ConnectStore,
}

impl fmt::Display for GateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateStep::ResolveSession => "resolve_session",
            GateStep::ExtractPrincipal => "extract_principal",
            GateStep::CheckActive => "check_active",
            GateStep::CheckRole => "check_role",
            GateStep::CheckPermission => "check_permission",
            GateStep::ValidateIds => "validate_ids",
            GateStep::ConnectStore => "connect_store",
        };
        f.write_str(name)
    }
}

/// Result of a single principal check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Deny(Denial),
}

pub type PrincipalCheck = fn(&GateOptions, &Principal) -> StepOutcome;

/// The synchronous checks, in execution order.
pub const PRINCIPAL_CHECKS: [(GateStep, PrincipalCheck); 4] = [
    (GateStep::CheckActive, check_active),
    (GateStep::CheckRole, check_role),
    (GateStep::CheckPermission, check_permission),
    (GateStep::ValidateIds, validate_ids),
];

/// Runs regardless of options.
pub fn check_active(_options: &GateOptions, principal: &Principal) -> StepOutcome {
    if principal.is_active {
        StepOutcome::Continue
    } else {
        StepOutcome::Deny(Denial::account_inactive())
    }
}

pub fn check_role(options: &GateOptions, principal: &Principal) -> StepOutcome {
    if !options.check_role || options.roles.contains(&principal.role) {
        StepOutcome::Continue
    } else {
        StepOutcome::Deny(Denial::role_not_allowed())
    }
}

pub fn check_permission(options: &GateOptions, principal: &Principal) -> StepOutcome {
    match options.permission {
        Some(permission) if !user_can(principal, permission) => {
            StepOutcome::Deny(Denial::access_denied())
        }
        _ => StepOutcome::Continue,
    }
}

pub fn validate_ids(options: &GateOptions, _principal: &Principal) -> StepOutcome {
    if !options.check_valid_id {
        return StepOutcome::Continue;
    }
    match check_ids(options.id_to_check.as_ref()) {
        Ok(()) => StepOutcome::Continue,
        Err(IdProblem::Missing) => StepOutcome::Deny(Denial::id_required()),
        Err(IdProblem::Malformed) => StepOutcome::Deny(Denial::invalid_id()),
        Err(IdProblem::MalformedInBatch) => StepOutcome::Deny(Denial::invalid_ids()),
    }
}

/// The single entry point protected operations call before touching data.
pub struct AuthorizationGate<Req: ?Sized + Sync + 'static> {
    resolver: Arc<dyn SessionResolver<Req>>,
    connector: Arc<dyn StoreConnector>,
}

impl<Req: ?Sized + Sync + 'static> Clone for AuthorizationGate<Req> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<Req: ?Sized + Sync + 'static> AuthorizationGate<Req> {
    pub fn new(
        resolver: Arc<dyn SessionResolver<Req>>,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            resolver,
            connector,
        }
    }

    /// Runs the pipeline for `request`.
    ///
    /// Returns `Ok(Denied)` for every authorization failure; `Err` only when
    /// the session resolver or the storage connection fails.
    pub async fn authorize(&self, request: &Req, options: &GateOptions) -> Result<AuthOutcome> {
        let session = self.resolver.resolve(request).await?;

        let Some(session) = session else {
            return Ok(deny(GateStep::ResolveSession, Denial::session_not_found()));
        };

        let Some(principal) = session.user else {
            return Ok(deny(GateStep::ExtractPrincipal, Denial::not_authenticated()));
        };

        for (step, check) in PRINCIPAL_CHECKS {
            if let StepOutcome::Deny(denial) = check(options, &principal) {
                debug!("AUTHZ GATE: principal {} stopped at {}", principal.id, step);
                return Ok(deny(step, denial));
            }
        }

        if options.require_db {
            self.connector.ensure_connected().await.map_err(|e| {
                error!("AUTHZ GATE: {} failed: {}", GateStep::ConnectStore, e);
                e
            })?;
        }

        debug!("AUTHZ GATE: principal {} authorized", principal.id);
        Ok(AuthOutcome::Authorized(principal))
    }
}

fn deny(step: GateStep, denial: Denial) -> AuthOutcome {
    warn!("AUTHZ GATE: denied at {} with {}", step, denial);
    AuthOutcome::Denied(denial)
}
