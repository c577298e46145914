/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Sidebar, header title and user badge for the authenticated layout.
//!
//! [`NavShellView::build`] is a pure function of the session, the current
//! path and the static link table below.

use agriregistry_core::{AuthApi, ROLE_ADMIN, ROLE_OPERATOR, RoleSet, Session};

use crate::shell::routes::Route;
use crate::shell::session_store::SessionStore;

const FALLBACK_INITIALS: &str = "AD";
const FALLBACK_ROLE_LABEL: &str = "System Admin";
const ADMIN_CRUMB: &str = "Lusaka HQ";
const FIELD_CRUMB: &str = "Camp Level";
const DEFAULT_PAGE_TITLE: &str = "Dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub target: &'static str,
    pub label: &'static str,
    pub roles: &'static [&'static str],
    pub badge: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavGroup {
    pub title: &'static str,
    pub links: &'static [NavLink],
}

const BOTH: &[&str] = &[ROLE_ADMIN, ROLE_OPERATOR];
const ADMIN: &[&str] = &[ROLE_ADMIN];
const OPERATOR: &[&str] = &[ROLE_OPERATOR];

const fn link(target: &'static str, label: &'static str, roles: &'static [&'static str]) -> NavLink {
    NavLink {
        target,
        label,
        roles,
        badge: None,
    }
}

pub const NAV_GROUPS: &[NavGroup] = &[
    NavGroup {
        title: "Overview",
        links: &[
            link("/dashboard", "Dashboard", BOTH),
            link("/analytics", "Analytics & Trends", ADMIN),
        ],
    },
    NavGroup {
        title: "Farmer Management",
        links: &[
            link("/farmers", "Farmer Registry", BOTH),
            link("/farmers/create", "New Registration", BOTH),
            link("/groups", "Cooperatives", ADMIN),
        ],
    },
    NavGroup {
        title: "Operations",
        links: &[
            NavLink {
                badge: Some(4),
                ..link("/requests", "Requests (FISP)", BOTH)
            },
            link("/visits", "Extension Visits", OPERATOR),
        ],
    },
    NavGroup {
        title: "Administration",
        links: &[
            link("/operators/manage", "User Management", ADMIN),
            link("/reports", "System Reports", ADMIN),
        ],
    },
];

/// Header title for a path. Ordered rules, first match wins.
pub fn page_title(path: &str) -> &'static str {
    const RULES: [(&str, &str); 3] = [
        ("/farmers/create", "New Farmer Registration"),
        ("/farmers", "Farmer Registry"),
        ("/operators/manage", "Operator Management"),
    ];
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if path.contains("dashboard") {
        return "Executive Dashboard";
    }
    RULES
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map(|(_, title)| *title)
        .unwrap_or(DEFAULT_PAGE_TITLE)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLinkView {
    pub target: &'static str,
    pub label: &'static str,
    pub badge: Option<u32>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavGroupView {
    pub title: &'static str,
    pub links: Vec<NavLinkView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavShellView {
    pub groups: Vec<NavGroupView>,
    pub page_title: &'static str,
    pub user_name: String,
    pub initials: String,
    pub role_label: String,
    pub crumb: &'static str,
}

impl NavShellView {
    pub fn build(session: &Session, current_path: &str) -> Self {
        let roles = session.roles();
        let current = Route::parse(current_path).path();
        let groups = NAV_GROUPS
            .iter()
            .filter_map(|group| {
                let links: Vec<NavLinkView> = group
                    .links
                    .iter()
                    .filter(|link| RoleSet::parse(link.roles).intersects(&roles))
                    .map(|link| NavLinkView {
                        target: link.target,
                        label: link.label,
                        badge: link.badge,
                        active: link.target == current,
                    })
                    .collect();
                (!links.is_empty()).then_some(NavGroupView {
                    title: group.title,
                    links,
                })
            })
            .collect();

        let user = session.user();
        Self {
            groups,
            page_title: page_title(current_path),
            user_name: user.map(|u| u.display_name.clone()).unwrap_or_default(),
            initials: user
                .map(|u| u.initials())
                .unwrap_or_else(|| FALLBACK_INITIALS.to_string()),
            role_label: user
                .map(|u| u.role_label())
                .unwrap_or_else(|| FALLBACK_ROLE_LABEL.to_string()),
            crumb: if roles.is_admin() {
                ADMIN_CRUMB
            } else {
                FIELD_CRUMB
            },
        }
    }

    pub fn active_link(&self) -> Option<&NavLinkView> {
        self.groups
            .iter()
            .flat_map(|group| group.links.iter())
            .find(|link| link.active)
    }

    pub fn visible_targets(&self) -> Vec<&'static str> {
        self.groups
            .iter()
            .flat_map(|group| group.links.iter().map(|link| link.target))
            .collect()
    }
}

/// Sign out from the shell; the caller navigates to the returned route.
pub fn logout<A: AuthApi>(store: &SessionStore, api: &A) -> Route {
    store.logout(api);
    Route::Login
}

#[cfg(test)]
mod tests {
    use agriregistry_core::{AuthGrant, User};
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{FakeRegistryApi, block_on};

    fn session(name: &str, roles: &[&str]) -> Session {
        Session::from_grant(AuthGrant {
            token: "tok".into(),
            user: User {
                id: "u".into(),
                display_name: name.into(),
                email: None,
                roles: RoleSet::parse(roles),
            },
        })
    }

    #[rstest]
    #[case("/admin-dashboard", "Executive Dashboard")]
    #[case("/dashboard?tab=1", "Executive Dashboard")]
    #[case("/farmers/create", "New Farmer Registration")]
    #[case("/farmers/ZM-1", "Farmer Registry")]
    #[case("/operators/manage", "Operator Management")]
    #[case("/operators/create", "Dashboard")]
    #[case("/reports", "Dashboard")]
    fn page_titles(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(page_title(path), expected);
    }

    #[test]
    fn operator_sees_operator_links_only() {
        let view = NavShellView::build(&session("Chanda Banda", &["OPERATOR"]), "/farmers");
        assert_eq!(
            view.visible_targets(),
            vec!["/dashboard", "/farmers", "/farmers/create", "/requests", "/visits"]
        );
        assert!(view.groups.iter().all(|g| g.title != "Administration"));
        assert_eq!(view.active_link().map(|l| l.label), Some("Farmer Registry"));
        assert_eq!(view.crumb, "Camp Level");
        assert_eq!(view.initials, "CH");
        assert_eq!(view.role_label, "operator");
    }

    #[test]
    fn admin_sees_administration_and_badge() {
        let view = NavShellView::build(&session("mwape", &["admin"]), "/requests/");
        assert!(view.visible_targets().contains(&"/operators/manage"));
        assert!(!view.visible_targets().contains(&"/visits"));
        let active = view.active_link().unwrap();
        assert_eq!(active.badge, Some(4));
        assert_eq!(view.crumb, "Lusaka HQ");
    }

    #[test]
    fn anonymous_session_gets_fallback_badge_and_no_links() {
        let view = NavShellView::build(&Session::Anonymous, "/dashboard");
        assert!(view.groups.is_empty());
        assert_eq!(view.initials, "AD");
        assert_eq!(view.role_label, "System Admin");
    }

    #[test]
    fn logout_returns_login_route_and_drops_bearer() {
        let api = FakeRegistryApi::new();
        let store = SessionStore::in_memory();
        assert!(block_on(store.login(&api, "admin@agri.zm", "secret")));

        assert_eq!(logout(&store, &api), Route::Login);
        assert!(!store.is_authenticated());
        assert_eq!(api.bearer(), None);
    }
}
