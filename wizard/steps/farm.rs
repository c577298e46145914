/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 3: farm profile and socio-economic flags. Nothing here is required.

use agriregistry_core::{FarmPatch, FarmSection, SectionPatch, WizardDraft};

pub const CROP_OPTIONS: [&str; 8] = [
    "Maize",
    "Soya Beans",
    "Groundnuts",
    "Sunflower",
    "Cotton",
    "Tobacco",
    "Vegetables",
    "Fruits",
];
pub const LAND_TENURE_OPTIONS: [&str; 2] = ["Customary", "Title Deed"];
pub const SOIL_TYPE_OPTIONS: [&str; 2] = ["Sandy Loam", "Clay"];
pub const PRIMARY_INCOME_OPTIONS: [&str; 2] = ["Farming Only", "Farming + Business"];
pub const FINANCIAL_SERVICE_OPTIONS: [&str; 4] = [
    "Has Bank Account",
    "Has Mobile Money (Airtel)",
    "Has Mobile Money (MTN)",
    "Has Mobile Money (Zamtel)",
];
pub const VULNERABILITY_OPTIONS: [&str; 4] = [
    "Female Headed Household",
    "Youth Farmer (< 35)",
    "Living with Disability",
    "Elderly (> 60)",
];

/// Multi-select groups on the farm panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FarmChoiceGroup {
    Crops,
    FinancialServices,
    Vulnerability,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LivestockKind {
    Cattle,
    Goats,
    Pigs,
    Poultry,
}

impl LivestockKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cattle" => Some(Self::Cattle),
            "goats" | "goat" => Some(Self::Goats),
            "pigs" | "pig" => Some(Self::Pigs),
            "poultry" | "chickens" => Some(Self::Poultry),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FarmPanel {
    pub form: FarmSection,
}

impl FarmPanel {
    pub fn open(draft: &WizardDraft) -> Self {
        Self {
            form: draft.farm.clone(),
        }
    }

    pub fn edit(&mut self, patch: FarmPatch) {
        self.form.apply(patch);
    }

    /// Flip one option of a multi-select group.
    pub fn toggle(&mut self, group: FarmChoiceGroup, value: &str) {
        let list = match group {
            FarmChoiceGroup::Crops => &mut self.form.crops,
            FarmChoiceGroup::FinancialServices => &mut self.form.financial_services,
            FarmChoiceGroup::Vulnerability => &mut self.form.vulnerability,
        };
        match list.iter().position(|existing| existing == value) {
            Some(index) => {
                list.remove(index);
            },
            None => list.push(value.to_string()),
        }
    }

    /// Counts typed into the livestock grid; anything unparseable is zero.
    pub fn set_livestock(&mut self, kind: LivestockKind, raw: &str) {
        let count = raw.trim().parse::<u32>().unwrap_or(0);
        let livestock = &mut self.form.livestock;
        match kind {
            LivestockKind::Cattle => livestock.cattle = count,
            LivestockKind::Goats => livestock.goats = count,
            LivestockKind::Pigs => livestock.pigs = count,
            LivestockKind::Poultry => livestock.poultry = count,
        }
    }

    pub fn submit(&self) -> SectionPatch {
        SectionPatch::Farm(FarmPatch::from(&self.form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_twice_removes_the_choice() {
        let mut panel = FarmPanel::default();
        panel.toggle(FarmChoiceGroup::Crops, "Maize");
        panel.toggle(FarmChoiceGroup::Crops, "Cotton");
        panel.toggle(FarmChoiceGroup::Crops, "Maize");
        assert_eq!(panel.form.crops, vec!["Cotton".to_string()]);
    }

    #[test]
    fn livestock_input_falls_back_to_zero() {
        let mut panel = FarmPanel::default();
        panel.set_livestock(LivestockKind::Cattle, "12");
        panel.set_livestock(LivestockKind::Goats, "a few");
        assert_eq!(panel.form.livestock.cattle, 12);
        assert_eq!(panel.form.livestock.goats, 0);
        assert_eq!(LivestockKind::parse(" Poultry "), Some(LivestockKind::Poultry));
    }

    #[test]
    fn empty_farm_profile_still_submits() {
        let panel = FarmPanel::open(&WizardDraft::new());
        assert!(matches!(panel.submit(), SectionPatch::Farm(_)));
    }
}
