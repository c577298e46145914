/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The console's route table.

use std::fmt;

use agriregistry_core::{ROLE_ADMIN, ROLE_OPERATOR, RoleSet};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    AdminDashboard,
    OperatorDashboard,
    Farmers,
    FarmerCreate,
    FarmerEdit(String),
    FarmerDetail(String),
    OperatorsManage,
    OperatorsCreate,
    Unknown(String),
}

impl Route {
    /// Parse a location path. Query strings, fragments and trailing slashes
    /// are ignored; anything not in the table is `Unknown`.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self::Root,
            ["login"] => Self::Login,
            ["dashboard"] => Self::Dashboard,
            ["admin-dashboard"] => Self::AdminDashboard,
            ["operator-dashboard"] => Self::OperatorDashboard,
            ["farmers"] => Self::Farmers,
            ["farmers", "create"] => Self::FarmerCreate,
            ["farmers", "edit", id] => Self::FarmerEdit((*id).to_string()),
            ["farmers", id] => Self::FarmerDetail((*id).to_string()),
            ["operators", "manage"] => Self::OperatorsManage,
            ["operators", "create"] => Self::OperatorsCreate,
            _ => Self::Unknown(format!("/{}", segments.join("/"))),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".into(),
            Self::Login => "/login".into(),
            Self::Dashboard => "/dashboard".into(),
            Self::AdminDashboard => "/admin-dashboard".into(),
            Self::OperatorDashboard => "/operator-dashboard".into(),
            Self::Farmers => "/farmers".into(),
            Self::FarmerCreate => "/farmers/create".into(),
            Self::FarmerEdit(id) => format!("/farmers/edit/{id}"),
            Self::FarmerDetail(id) => format!("/farmers/{id}"),
            Self::OperatorsManage => "/operators/manage".into(),
            Self::OperatorsCreate => "/operators/create".into(),
            Self::Unknown(path) => path.clone(),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login)
    }

    /// Roles allowed to render this route. `None` means no role gate (the
    /// route is public, or only redirects).
    pub fn required_roles(&self) -> Option<RoleSet> {
        match self {
            Self::Root | Self::Login | Self::Unknown(_) => None,
            Self::AdminDashboard | Self::OperatorsManage | Self::OperatorsCreate => {
                Some(RoleSet::single(ROLE_ADMIN))
            },
            Self::OperatorDashboard => Some(RoleSet::single(ROLE_OPERATOR)),
            Self::Dashboard
            | Self::Farmers
            | Self::FarmerCreate
            | Self::FarmerEdit(_)
            | Self::FarmerDetail(_) => Some(RoleSet::parse([ROLE_ADMIN, ROLE_OPERATOR])),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Landing page picked from the first role the API reported.
pub fn default_dashboard(roles: &RoleSet) -> Route {
    match roles.primary() {
        Some(role) if role.is_admin() => Route::AdminDashboard,
        Some(role) if role.is_operator() => Route::OperatorDashboard,
        _ => Route::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("/", Route::Root)]
    #[case("", Route::Root)]
    #[case("/login", Route::Login)]
    #[case("/farmers/", Route::Farmers)]
    #[case("/farmers/create?step=2", Route::FarmerCreate)]
    #[case("/farmers/edit/ZM-7", Route::FarmerEdit("ZM-7".into()))]
    #[case("/farmers/ZM-7", Route::FarmerDetail("ZM-7".into()))]
    #[case("/operators/manage", Route::OperatorsManage)]
    #[case("/analytics", Route::Unknown("/analytics".into()))]
    #[case("/farmers/a/b/c", Route::Unknown("/farmers/a/b/c".into()))]
    fn parses_paths(#[case] path: &str, #[case] expected: Route) {
        assert_eq!(Route::parse(path), expected);
    }

    #[test]
    fn paths_round_trip_through_parse() {
        for route in [
            Route::Login,
            Route::AdminDashboard,
            Route::FarmerDetail("x1".into()),
            Route::OperatorsCreate,
        ] {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[rstest]
    #[case(&["ADMIN"], Route::AdminDashboard)]
    #[case(&["operator", "admin"], Route::OperatorDashboard)]
    #[case(&["viewer"], Route::Dashboard)]
    #[case(&[], Route::Dashboard)]
    fn first_role_picks_landing_page(#[case] roles: &[&str], #[case] expected: Route) {
        assert_eq!(default_dashboard(&RoleSet::parse(roles)), expected);
    }

    #[test]
    fn admin_only_routes_exclude_operators() {
        let operator = RoleSet::single("operator");
        assert!(
            !Route::OperatorsManage
                .required_roles()
                .is_some_and(|required| required.intersects(&operator))
        );
        assert!(
            Route::FarmerCreate
                .required_roles()
                .is_some_and(|required| required.intersects(&operator))
        );
    }
}
