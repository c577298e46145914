/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Session and user identity.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::roles::{RoleSet, RoleTag};

const FALLBACK_INITIALS: &str = "AD";
const FALLBACK_ROLE_LABEL: &str = "System Admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub roles: RoleSet,
}

impl User {
    /// Two-letter badge shown in the sidebar footer.
    pub fn initials(&self) -> String {
        let name = self.display_name.trim();
        if name.is_empty() {
            return FALLBACK_INITIALS.to_string();
        }
        name.chars().take(2).collect::<String>().to_uppercase()
    }

    pub fn role_label(&self) -> String {
        self.roles
            .primary()
            .map(RoleTag::to_string)
            .unwrap_or_else(|| FALLBACK_ROLE_LABEL.to_string())
    }
}

/// What a successful login call hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

/// Token and user travel together: there is no state holding one without the
/// other.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated {
        token: String,
        user: User,
        #[serde(with = "time::serde::timestamp")]
        established_at: OffsetDateTime,
    },
}

impl Session {
    pub fn from_grant(grant: AuthGrant) -> Self {
        Self::Authenticated {
            token: grant.token,
            user: grant.user,
            established_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            Self::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    /// Roles of the signed-in user; empty when anonymous.
    pub fn roles(&self) -> RoleSet {
        self.user()
            .map(|user| user.roles.clone())
            .unwrap_or_default()
    }

    pub fn has_any_role(&self, required: &RoleSet) -> bool {
        self.user()
            .is_some_and(|user| user.roles.intersects(required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, roles: &[&str]) -> User {
        User {
            id: "u-1".into(),
            display_name: name.into(),
            email: None,
            roles: RoleSet::parse(roles),
        }
    }

    #[test]
    fn anonymous_session_has_no_token_and_no_roles() {
        let session = Session::Anonymous;
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert!(session.roles().is_empty());
    }

    #[test]
    fn grant_populates_token_and_user_together() {
        let session = Session::from_grant(AuthGrant {
            token: "tok".into(),
            user: user("Chanda Banda", &["OPERATOR"]),
        });
        assert_eq!(session.token(), Some("tok"));
        assert!(session.has_any_role(&RoleSet::single("operator")));
        assert!(!session.has_any_role(&RoleSet::single("admin")));
    }

    #[test]
    fn initials_fall_back_for_blank_names() {
        assert_eq!(user("chanda", &[]).initials(), "CH");
        assert_eq!(user("  ", &[]).initials(), "AD");
        assert_eq!(user("x", &[]).role_label(), "System Admin");
        assert_eq!(user("x", &["ADMIN"]).role_label(), "admin");
    }

    #[test]
    fn session_survives_json_round_trip() {
        let session = Session::from_grant(AuthGrant {
            token: "tok".into(),
            user: user("Mwape", &["admin"]),
        });
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token(), Some("tok"));
        assert_eq!(back.user().map(|u| u.display_name.as_str()), Some("Mwape"));
    }
}
