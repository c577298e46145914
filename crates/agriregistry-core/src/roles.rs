/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Role tags and role sets.
//!
//! Every comparison between a session's roles and a required-role set goes
//! through [`normalize_role`]. The API reports roles upper-cased (`"ADMIN"`),
//! the navigation config lists them lower-cased; both collapse to the same tag.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_OPERATOR: &str = "operator";

/// Canonical form of a role string: trimmed and ASCII-lowercased.
///
/// Returns `None` for blank input so that an empty tag never matches anything.
pub fn normalize_role(raw: &str) -> Option<RoleTag> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(RoleTag(trimmed.to_ascii_lowercase()))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleTag(String);

impl RoleTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == ROLE_ADMIN
    }

    pub fn is_operator(&self) -> bool {
        self.0 == ROLE_OPERATOR
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of normalized role tags.
///
/// Order matters in one place only: the first role reported by the API picks
/// the landing dashboard, so the set remembers insertion order separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    ordered: Vec<RoleTag>,
}

impl RoleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(role: &str) -> Self {
        Self::parse([role])
    }

    /// Build a set from raw role strings, normalizing and de-duplicating.
    pub fn parse<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        for raw in roles {
            let Some(tag) = normalize_role(raw.as_ref()) else {
                continue;
            };
            if seen.insert(tag.clone()) {
                ordered.push(tag);
            }
        }
        Self { ordered }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn primary(&self) -> Option<&RoleTag> {
        self.ordered.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleTag> {
        self.ordered.iter()
    }

    pub fn contains(&self, role: &str) -> bool {
        normalize_role(role).is_some_and(|tag| self.ordered.contains(&tag))
    }

    /// Non-empty intersection test used by the role gate and the nav filter.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.ordered.iter().any(|tag| other.ordered.contains(tag))
    }

    pub fn is_admin(&self) -> bool {
        self.ordered.iter().any(RoleTag::is_admin)
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::parse(iter)
    }
}
