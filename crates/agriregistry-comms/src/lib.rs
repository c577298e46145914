/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Transport for the registry API: a `reqwest` client implementing the
//! `agriregistry-core` port traits, plus the adapter that folds the server's
//! response variants into canonical shapes.

pub mod client;
pub mod normalize;

pub use client::{DEFAULT_TIMEOUT, RegistryClient};
