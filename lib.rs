/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Operator console for the national farmer registry.
//!
//! Domain types and the API ports live in `agriregistry-core`; the HTTP
//! client lives in `agriregistry-comms`. This crate holds the session store,
//! route guards, navigation shell and the farmer registration wizard.

pub mod prefs;
pub mod runtime;
pub mod shell;
pub mod test_utils;
pub mod wizard;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
