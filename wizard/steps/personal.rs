/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 1: bio-data.

use agriregistry_core::{PersonalPatch, PersonalSection, SectionPatch, WizardDraft};

pub const PERSONAL_REQUIRED_MESSAGE: &str = "NRC, First Name, and Surname are required.";

pub const GENDER_OPTIONS: [&str; 2] = ["Male", "Female"];
pub const MARITAL_STATUS_OPTIONS: [&str; 3] = ["Married", "Single", "Widowed"];
pub const EDUCATION_LEVEL_OPTIONS: [&str; 4] = ["Primary", "Secondary", "Tertiary", "None"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersonalPanel {
    pub form: PersonalSection,
    pub error: Option<String>,
}

impl PersonalPanel {
    pub fn open(draft: &WizardDraft) -> Self {
        Self {
            form: draft.personal.clone(),
            error: None,
        }
    }

    pub fn edit(&mut self, patch: PersonalPatch) {
        self.form.apply(patch);
    }

    /// The section to merge, or `None` with `error` set.
    pub fn submit(&mut self) -> Option<SectionPatch> {
        let form = &self.form;
        if [&form.nrc, &form.first_name, &form.last_name]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            self.error = Some(PERSONAL_REQUIRED_MESSAGE.to_string());
            return None;
        }
        self.error = None;
        Some(SectionPatch::Personal(PersonalPatch::from(form)))
    }
}
