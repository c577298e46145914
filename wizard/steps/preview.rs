/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 4: review the draft and submit it as the single create call.

use agriregistry_core::{ApiError, FarmerCreatePayload, WizardDraft};

pub const CREATE_FAILED_FALLBACK: &str = "Failed to create";

const BLANK: &str = "-";

fn or_dash(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        BLANK.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviewPanel {
    pub rows: Vec<PreviewRow>,
    pub submitting: bool,
    pub error: Option<String>,
}

impl PreviewPanel {
    pub fn open(draft: &WizardDraft) -> Self {
        let personal = &draft.personal;
        let address = &draft.address;
        let farm = &draft.farm;
        let row = |label, value: String| PreviewRow { label, value };
        Self {
            rows: vec![
                row("Name", or_dash(&personal.full_name())),
                row("Phone", or_dash(&personal.phone_primary)),
                row("Province", or_dash(&address.province_name)),
                row("District", or_dash(&address.district_name)),
                row("Chiefdom", or_dash(&address.chiefdom_name)),
                row("Village", or_dash(&address.village)),
                row("Farm size (ha)", or_dash(&farm.size_hectares)),
                row("Crops", or_dash(&farm.crops.join(", "))),
            ],
            submitting: false,
            error: None,
        }
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }

    /// Start the create call. Returns `None` while a previous call is still
    /// outstanding.
    pub fn begin_submit(&mut self, draft: &WizardDraft) -> Option<FarmerCreatePayload> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some(FarmerCreatePayload::from_draft(draft))
    }

    pub fn fail(&mut self, error: &ApiError) {
        self.submitting = false;
        let message = error.to_string();
        self.error = Some(if message.trim().is_empty() {
            CREATE_FAILED_FALLBACK.to_string()
        } else {
            message
        });
    }
}
