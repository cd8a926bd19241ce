//! Permission-conditional shaping of response payloads.
//!
//! Neither helper authorizes anything. Both ask [`user_can`] and only decide
//! how much of an already-authorized payload the principal gets to see.

use serde::{Deserialize, Serialize};

use crate::permissions::{user_can, Permission};
use crate::types::Principal;

/// Returns `fields` unchanged if the principal holds `permission`, otherwise
/// `T::default()`.
///
/// With a `serde_json::Map` this gives "spread" semantics: extend the response
/// object with the result and restricted fields simply don't appear.
pub fn include_if_permitted<T: Default>(principal: &Principal, permission: Permission, fields: T) -> T {
    if user_can(principal, permission) {
        fields
    } else {
        T::default()
    }
}

/// A directive to expand the reference stored at `path` into the referenced
/// record, keeping only `select` (all fields when empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateSpec {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub select: Vec<String>,
}

impl PopulateSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            select: Vec::new(),
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// One spec or an ordered list of specs.
#[derive(Debug, Clone)]
pub enum Populate {
    One(PopulateSpec),
    Many(Vec<PopulateSpec>),
}

impl From<PopulateSpec> for Populate {
    fn from(spec: PopulateSpec) -> Self {
        Populate::One(spec)
    }
}

impl From<Vec<PopulateSpec>> for Populate {
    fn from(specs: Vec<PopulateSpec>) -> Self {
        Populate::Many(specs)
    }
}

impl IntoIterator for Populate {
    type Item = PopulateSpec;
    type IntoIter = std::vec::IntoIter<PopulateSpec>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Populate::One(spec) => vec![spec].into_iter(),
            Populate::Many(specs) => specs.into_iter(),
        }
    }
}

/// A read plan over one collection: which references to expand.
///
/// Plans are values. Adding an expansion produces a new plan, so a base plan
/// can be shared between concurrent requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub collection: String,
    pub expand: Vec<PopulateSpec>,
}

impl QueryPlan {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            expand: Vec::new(),
        }
    }

    /// Adds (or replaces) the expansion for `spec.path`.
    pub fn with_expansion(mut self, spec: PopulateSpec) -> Self {
        self.expand.retain(|existing| existing.path != spec.path);
        self.expand.push(spec);
        self
    }

    /// The expansion registered for `path`, if any.
    pub fn expansion(&self, path: &str) -> Option<&PopulateSpec> {
        self.expand.iter().find(|spec| spec.path == path)
    }
}

/// Adds every spec in `populate` to `query` if the principal holds
/// `permission`; otherwise returns `query` untouched so references stay bare
/// ids.
pub fn populate_if_permitted(
    query: QueryPlan,
    principal: &Principal,
    permission: Permission,
    populate: impl Into<Populate>,
) -> QueryPlan {
    if !user_can(principal, permission) {
        return query;
    }
    populate
        .into()
        .into_iter()
        .fold(query, |plan, spec| plan.with_expansion(spec))
}
