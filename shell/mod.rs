/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Session, routing and the authenticated layout around the wizard.

pub mod nav_shell;
pub mod operator_form;
pub mod route_guard;
pub mod routes;
pub mod session_store;
pub mod token_vault;
