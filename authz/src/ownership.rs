//! Ownership and demo-data protection for mutations on stored resources.
//!
//! Applied by controllers after the gate has authorized the principal and the
//! targeted records have been loaded. The policy is all-or-nothing per
//! request: one demo record or one foreign record rejects the whole batch.
//!
//! Concurrent changes between this check and the mutation are not guarded
//! against; the check reads, the caller acts.

use tracing::{debug, warn};

use crate::classifier::is_super_admin;
use crate::outcome::Denial;
use crate::types::Principal;

/// A stored record with an author and a demo flag.
pub trait OwnedResource {
    fn resource_id(&self) -> &str;

    /// Id of the principal that created the record
    fn owner_id(&self) -> &str;

    /// Seed / protected data, mutable only by super-admins
    fn is_demo(&self) -> bool;
}

/// Who may act on records they did not author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipBypass {
    /// Only super-admins bypass authorship.
    SuperAdminOnly,
    /// Any admin bypasses authorship.
    AnyAdmin,
}

/// What to do with requested ids that were not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Any missing id fails the request (single-resource endpoints).
    Reject,
    /// Missing ids are dropped from the operated-on set (bulk endpoints).
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipViolation {
    NotFound,
    DemoProtected,
    NotOwner,
}

impl OwnershipViolation {
    pub fn denial(&self) -> Denial {
        match self {
            OwnershipViolation::NotFound => Denial::not_found(),
            OwnershipViolation::DemoProtected => Denial::demo_protected(),
            OwnershipViolation::NotOwner => Denial::not_owner(),
        }
    }
}

impl From<OwnershipViolation> for Denial {
    fn from(violation: OwnershipViolation) -> Self {
        violation.denial()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipPolicy {
    pub bypass: OwnershipBypass,
    pub missing: MissingPolicy,
}

impl OwnershipPolicy {
    pub const fn new(bypass: OwnershipBypass, missing: MissingPolicy) -> Self {
        Self { bypass, missing }
    }

    /// Policy for endpoints addressing one resource.
    pub const fn single(bypass: OwnershipBypass) -> Self {
        Self::new(bypass, MissingPolicy::Reject)
    }

    /// Policy for endpoints operating over a list of ids.
    pub const fn bulk(bypass: OwnershipBypass) -> Self {
        Self::new(bypass, MissingPolicy::Skip)
    }

    pub fn bypasses_ownership(&self, principal: &Principal) -> bool {
        match self.bypass {
            OwnershipBypass::SuperAdminOnly => is_super_admin(principal),
            OwnershipBypass::AnyAdmin => principal.is_admin(),
        }
    }

    /// Checks `found` (the records loaded for `requested`) and returns the
    /// records the principal may mutate.
    ///
    /// Guards run in order: missing ids, demo protection, authorship. Nothing
    /// is returned unless every guard passes for every record.
    pub fn authorize<'a, R: OwnedResource>(
        &self,
        principal: &Principal,
        requested: &[String],
        found: &'a [R],
    ) -> Result<Vec<&'a R>, OwnershipViolation> {
        let targets: Vec<&R> = found
            .iter()
            .filter(|record| requested.iter().any(|id| id == record.resource_id()))
            .collect();

        let missing = requested
            .iter()
            .filter(|id| !targets.iter().any(|record| record.resource_id() == id.as_str()))
            .count();

        if targets.is_empty() || (missing > 0 && self.missing == MissingPolicy::Reject) {
            debug!("OWNERSHIP: {} of {} requested ids missing", missing, requested.len());
            return Err(OwnershipViolation::NotFound);
        }

        let super_admin = is_super_admin(principal);
        if !super_admin && targets.iter().any(|record| record.is_demo()) {
            warn!("OWNERSHIP: demo record in batch, rejecting {} records", targets.len());
            return Err(OwnershipViolation::DemoProtected);
        }

        if !self.bypasses_ownership(principal)
            && targets.iter().any(|record| record.owner_id() != principal.id)
        {
            warn!("OWNERSHIP: foreign record in batch, rejecting {} records", targets.len());
            return Err(OwnershipViolation::NotOwner);
        }

        Ok(targets)
    }

    /// Single-record form of [`OwnershipPolicy::authorize`].
    pub fn authorize_one<'a, R: OwnedResource>(
        &self,
        principal: &Principal,
        record: Option<&'a R>,
    ) -> Result<&'a R, OwnershipViolation> {
        let record = record.ok_or(OwnershipViolation::NotFound)?;
        let requested = [record.resource_id().to_string()];
        self.authorize(principal, &requested, std::slice::from_ref(record))?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UserType};

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        id: String,
        author: String,
        demo: bool,
    }

    impl OwnedResource for Doc {
        fn resource_id(&self) -> &str {
            &self.id
        }
        fn owner_id(&self) -> &str {
            &self.author
        }
        fn is_demo(&self) -> bool {
            self.demo
        }
    }

    fn doc(id: &str, author: &str, demo: bool) -> Doc {
        Doc {
            id: id.to_string(),
            author: author.to_string(),
            demo,
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn author_p() -> Principal {
        Principal::new("p", Role::Author, UserType::Writer)
    }

    fn editor_admin() -> Principal {
        Principal::new("admin", Role::Admin, UserType::Editor)
    }

    fn super_admin() -> Principal {
        Principal::new("root", Role::Admin, UserType::SuperAdmin)
    }

    #[test]
    fn test_foreign_record_rejects_whole_batch() {
        let found = vec![doc("a", "p", false), doc("b", "q", false)];
        let policy = OwnershipPolicy::bulk(OwnershipBypass::SuperAdminOnly);
        assert_eq!(
            policy.authorize(&author_p(), &ids(&["a", "b"]), &found),
            Err(OwnershipViolation::NotOwner)
        );
    }

    #[test]
    fn test_demo_record_rejects_whole_batch_for_admin() {
        let found = vec![doc("c", "admin", false), doc("d", "admin", true)];
        let policy = OwnershipPolicy::bulk(OwnershipBypass::AnyAdmin);
        let result = policy.authorize(&editor_admin(), &ids(&["c", "d"]), &found);
        assert_eq!(result, Err(OwnershipViolation::DemoProtected));
        assert_eq!(OwnershipViolation::DemoProtected.denial().status, 403);
    }

    #[test]
    fn test_super_admin_passes_demo_and_ownership() {
        let found = vec![doc("c", "x", false), doc("d", "y", true)];
        let policy = OwnershipPolicy::bulk(OwnershipBypass::SuperAdminOnly);
        let allowed = policy
            .authorize(&super_admin(), &ids(&["c", "d"]), &found)
            .unwrap();
        assert_eq!(allowed.len(), 2);
    }

    #[test]
    fn test_bypass_differs_by_resource_type() {
        let found = vec![doc("c", "someone", false)];
        let requested = ids(&["c"]);

        let categories = OwnershipPolicy::single(OwnershipBypass::AnyAdmin);
        assert!(categories.authorize(&editor_admin(), &requested, &found).is_ok());

        let pages = OwnershipPolicy::single(OwnershipBypass::SuperAdminOnly);
        assert_eq!(
            pages.authorize(&editor_admin(), &requested, &found),
            Err(OwnershipViolation::NotOwner)
        );
    }

    #[test]
    fn test_missing_ids_single_vs_bulk() {
        let found = vec![doc("a", "p", false)];
        let requested = ids(&["a", "ghost"]);

        let single = OwnershipPolicy::single(OwnershipBypass::SuperAdminOnly);
        assert_eq!(
            single.authorize(&author_p(), &requested, &found),
            Err(OwnershipViolation::NotFound)
        );

        let bulk = OwnershipPolicy::bulk(OwnershipBypass::SuperAdminOnly);
        let allowed = bulk.authorize(&author_p(), &requested, &found).unwrap();
        assert_eq!(allowed, vec![&found[0]]);
    }

    #[test]
    fn test_nothing_found_is_not_found_even_in_bulk() {
        let found: Vec<Doc> = Vec::new();
        let bulk = OwnershipPolicy::bulk(OwnershipBypass::AnyAdmin);
        assert_eq!(
            bulk.authorize(&super_admin(), &ids(&["x"]), &found),
            Err(OwnershipViolation::NotFound)
        );
    }

    #[test]
    fn test_authorize_one() {
        let mine = doc("a", "p", false);
        let policy = OwnershipPolicy::single(OwnershipBypass::SuperAdminOnly);
        assert_eq!(policy.authorize_one(&author_p(), Some(&mine)), Ok(&mine));
        assert_eq!(
            policy.authorize_one::<Doc>(&author_p(), None),
            Err(OwnershipViolation::NotFound)
        );
    }
}
