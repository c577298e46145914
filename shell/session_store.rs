/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared session state.
//!
//! The store is cheap to clone; clones share one `RwLock`ed state so the
//! route guard, the nav shell and the login form all see the same session.
//! Successful login and restore are the only writers of the token and user.

use std::sync::Arc;

use agriregistry_core::{ApiError, AuthApi, RoleSet, Session, User};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::runtime::diagnostics::{
    CHANNEL_SESSION_LOGIN_FAILED, CHANNEL_SESSION_LOGIN_SUCCEEDED, CHANNEL_SESSION_LOGOUT,
    CHANNEL_SESSION_PERSIST_FAILED, CHANNEL_SESSION_RESTORE_REJECTED,
    CHANNEL_SESSION_RESTORE_SUCCEEDED, emit_signal,
};
use crate::shell::routes::{Route, default_dashboard};
use crate::shell::token_vault::TokenVault;

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStatus {
    Loading,
    Anonymous,
    Authenticated,
}

/// Read-only view of the store at one instant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Session,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Loading
        } else if self.session.is_authenticated() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn roles(&self) -> RoleSet {
        self.session.roles()
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionSnapshot>>,
    vault: Option<Arc<TokenVault>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SessionStore")
            .field("status", &state.status())
            .field("vault", &self.vault.as_ref().map(|v| v.path().to_path_buf()))
            .finish()
    }
}

impl SessionStore {
    /// A store that keeps the session in memory only.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_vault(vault: TokenVault) -> Self {
        Self {
            state: Arc::default(),
            vault: Some(Arc::new(vault)),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().session.is_authenticated()
    }

    pub fn landing_route(&self) -> Route {
        default_dashboard(&self.state.read().session.roles())
    }

    /// Authenticate against the API. On failure the previous session is left
    /// exactly as it was and the error text is kept for display.
    pub async fn login<A: AuthApi>(&self, api: &A, identifier: &str, secret: &str) -> bool {
        if identifier.trim().is_empty() || secret.is_empty() {
            self.state.write().last_error = Some(MISSING_CREDENTIALS_MESSAGE.to_string());
            emit_signal(CHANNEL_SESSION_LOGIN_FAILED, 0);
            return false;
        }

        match api.login(identifier, secret).await {
            Ok(grant) => {
                api.authorize(Some(&grant.token));
                self.persist(&grant.token, &grant.user);
                info!(
                    "signed in as {} ({} role(s))",
                    grant.user.display_name,
                    grant.user.roles.len()
                );
                let mut state = self.state.write();
                state.session = Session::from_grant(grant);
                state.loading = false;
                state.last_error = None;
                emit_signal(CHANNEL_SESSION_LOGIN_SUCCEEDED, 0);
                true
            },
            Err(error) => {
                warn!("login failed: {error}");
                self.state.write().last_error = Some(error.to_string());
                emit_signal(CHANNEL_SESSION_LOGIN_FAILED, 0);
                false
            },
        }
    }

    /// Clear the session unconditionally, including the saved token and the
    /// bearer installed on `api`.
    pub fn logout<A: AuthApi>(&self, api: &A) {
        api.authorize(None);
        {
            let mut state = self.state.write();
            state.session = Session::Anonymous;
            state.loading = false;
            state.last_error = None;
        }
        self.forget_saved();
        emit_signal(CHANNEL_SESSION_LOGOUT, 0);
    }

    /// Enter the loading state. The auth gate waits instead of redirecting
    /// until [`SessionStore::restore`] settles.
    pub fn begin_restore(&self) {
        self.state.write().loading = true;
    }

    /// Re-establish a session from the saved token. A token the API rejects
    /// is forgotten; a network failure keeps it for the next attempt.
    pub async fn restore<A: AuthApi>(&self, api: &A) -> bool {
        let stored = match self.vault.as_ref().map(|vault| vault.load()) {
            Some(Ok(stored)) => stored,
            Some(Err(error)) => {
                warn!("ignoring saved session: {error}");
                None
            },
            None => None,
        };
        let Some(stored) = stored else {
            self.state.write().loading = false;
            return false;
        };

        self.begin_restore();
        debug!("validating saved session for {}", stored.user.display_name);
        match api.me(&stored.token).await {
            Ok(user) => {
                api.authorize(Some(&stored.token));
                let mut state = self.state.write();
                state.session = Session::from_grant(agriregistry_core::AuthGrant {
                    token: stored.token,
                    user,
                });
                state.loading = false;
                state.last_error = None;
                emit_signal(CHANNEL_SESSION_RESTORE_SUCCEEDED, 0);
                true
            },
            Err(error) => {
                self.reject_restore(api, &error);
                false
            },
        }
    }

    fn reject_restore<A: AuthApi>(&self, api: &A, error: &ApiError) {
        warn!("saved session not restored: {error}");
        api.authorize(None);
        if error.is_unauthorized() {
            self.forget_saved();
        }
        let mut state = self.state.write();
        state.session = Session::Anonymous;
        state.loading = false;
        state.last_error = Some(error.to_string());
        emit_signal(CHANNEL_SESSION_RESTORE_REJECTED, 0);
    }

    fn forget_saved(&self) {
        let Some(vault) = &self.vault else {
            return;
        };
        if let Err(error) = vault.clear() {
            warn!("{error}");
            emit_signal(CHANNEL_SESSION_PERSIST_FAILED, 0);
        }
    }

    fn persist(&self, token: &str, user: &User) {
        let Some(vault) = &self.vault else {
            return;
        };
        if let Err(error) = vault.save(token, user) {
            warn!("{error}");
            emit_signal(CHANNEL_SESSION_PERSIST_FAILED, 0);
        }
    }
}
