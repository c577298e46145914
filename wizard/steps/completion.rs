/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 7: terminal confirmation.

use agriregistry_core::CreatedFarmer;

use crate::shell::routes::Route;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionPanel {
    pub farmer_id: String,
    pub farmer_name: String,
    pub profile_link: Route,
    pub register_another_link: Route,
}

impl CompletionPanel {
    pub fn open(created: &CreatedFarmer) -> Self {
        Self {
            farmer_id: created.farmer_id.clone(),
            farmer_name: created.display_name.clone(),
            profile_link: Route::FarmerDetail(created.farmer_id.clone()),
            register_another_link: Route::FarmerCreate,
        }
    }
}
