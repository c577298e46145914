/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Authentication and role gates.
//!
//! The role gate is only ever consulted after the auth gate has let a request
//! through; [`resolve`] composes them in that order for the route table.

use agriregistry_core::{RoleSet, Session};
use log::debug;

use crate::runtime::diagnostics::{
    CHANNEL_GUARD_REDIRECT_LOGIN, CHANNEL_GUARD_ROLE_DENIED, emit_signal,
};
use crate::shell::routes::{Route, default_dashboard};
use crate::shell::session_store::{AuthStatus, SessionSnapshot};

/// Redirects followed by [`resolve_final`] before giving up.
const MAX_REDIRECT_HOPS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    /// Session state is still being established; show a neutral placeholder.
    Waiting,
    Redirect {
        to: Route,
        replace: bool,
    },
}

impl GuardOutcome {
    fn to_login() -> Self {
        Self::Redirect {
            to: Route::Login,
            replace: true,
        }
    }
}

pub struct AuthGate;

impl AuthGate {
    pub fn check(snapshot: &SessionSnapshot) -> GuardOutcome {
        match snapshot.status() {
            AuthStatus::Loading => GuardOutcome::Waiting,
            AuthStatus::Anonymous => {
                emit_signal(CHANNEL_GUARD_REDIRECT_LOGIN, 0);
                GuardOutcome::to_login()
            },
            AuthStatus::Authenticated => GuardOutcome::Render,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleGate {
    required: RoleSet,
}

impl RoleGate {
    pub fn new(required: RoleSet) -> Self {
        Self { required }
    }

    /// Accepts one role or several: `RoleGate::any_of(["admin", "operator"])`.
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(RoleSet::parse(roles))
    }

    pub fn check(&self, session: &Session) -> GuardOutcome {
        if session.has_any_role(&self.required) {
            GuardOutcome::Render
        } else {
            emit_signal(CHANNEL_GUARD_ROLE_DENIED, 0);
            GuardOutcome::to_login()
        }
    }
}

/// Gate a single navigation to `route`.
pub fn resolve(route: &Route, snapshot: &SessionSnapshot) -> GuardOutcome {
    if route.is_public() {
        return GuardOutcome::Render;
    }
    match AuthGate::check(snapshot) {
        GuardOutcome::Render => {},
        other => return other,
    }
    match route {
        Route::Root => GuardOutcome::Redirect {
            to: default_dashboard(&snapshot.roles()),
            replace: true,
        },
        Route::Unknown(_) => GuardOutcome::Redirect {
            to: Route::Root,
            replace: true,
        },
        _ => match route.required_roles() {
            Some(required) => RoleGate::new(required).check(&snapshot.session),
            None => GuardOutcome::Render,
        },
    }
}

/// Where a navigation ends up once redirects are followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub requested: Route,
    pub hops: Vec<Route>,
    pub outcome: GuardOutcome,
}

impl Resolution {
    /// The route actually displayed (or awaited).
    pub fn landed(&self) -> &Route {
        self.hops.last().unwrap_or(&self.requested)
    }
}

/// Follow redirects from `path` until a route renders or waits.
pub fn resolve_final(path: &str, snapshot: &SessionSnapshot) -> Resolution {
    let requested = Route::parse(path);
    let mut current = requested.clone();
    let mut hops = Vec::new();
    loop {
        let outcome = resolve(&current, snapshot);
        let GuardOutcome::Redirect { to, .. } = &outcome else {
            return Resolution {
                requested,
                hops,
                outcome,
            };
        };
        if hops.len() >= MAX_REDIRECT_HOPS {
            debug!("redirect chain from {requested} exceeded {MAX_REDIRECT_HOPS} hops");
            return Resolution {
                requested,
                hops,
                outcome,
            };
        }
        current = to.clone();
        hops.push(current.clone());
    }
}
