/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The in-progress registration record accumulated across wizard steps.
//!
//! Sections are independent. A patch names exactly one section and only the
//! fields it carries (`Some`) are written; everything else keeps its value.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_INCOME: &str = "Farming Only";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalSection {
    pub nrc: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub marital_status: String,
    pub phone_primary: String,
    pub education_level: String,
}

impl PersonalSection {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Each level keeps the code (for cascading lookups) and the resolved name
/// (for display and submission).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressSection {
    pub province_code: String,
    pub province_name: String,
    pub district_code: String,
    pub district_name: String,
    pub chiefdom_code: String,
    pub chiefdom_name: String,
    pub village: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Livestock {
    pub cattle: u32,
    pub goats: u32,
    pub pigs: u32,
    pub poultry: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmSection {
    pub size_hectares: String,
    pub land_tenure: String,
    pub soil_type: String,
    pub crops: Vec<String>,
    pub livestock: Livestock,
    pub household_size: String,
    pub primary_income: String,
    pub financial_services: Vec<String>,
    pub vulnerability: Vec<String>,
}

impl Default for FarmSection {
    fn default() -> Self {
        Self {
            size_hectares: String::new(),
            land_tenure: String::new(),
            soil_type: String::new(),
            crops: Vec::new(),
            livestock: Livestock::default(),
            household_size: String::new(),
            primary_income: DEFAULT_PRIMARY_INCOME.to_string(),
            financial_services: Vec::new(),
            vulnerability: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalPatch {
    pub nrc: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub phone_primary: Option<String>,
    pub education_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPatch {
    pub province_code: Option<String>,
    pub province_name: Option<String>,
    pub district_code: Option<String>,
    pub district_name: Option<String>,
    pub chiefdom_code: Option<String>,
    pub chiefdom_name: Option<String>,
    pub village: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FarmPatch {
    pub size_hectares: Option<String>,
    pub land_tenure: Option<String>,
    pub soil_type: Option<String>,
    pub crops: Option<Vec<String>>,
    pub livestock: Option<Livestock>,
    pub household_size: Option<String>,
    pub primary_income: Option<String>,
    pub financial_services: Option<Vec<String>>,
    pub vulnerability: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionPatch {
    Personal(PersonalPatch),
    Address(AddressPatch),
    Farm(FarmPatch),
}

impl From<&PersonalSection> for PersonalPatch {
    fn from(section: &PersonalSection) -> Self {
        Self {
            nrc: Some(section.nrc.clone()),
            first_name: Some(section.first_name.clone()),
            last_name: Some(section.last_name.clone()),
            date_of_birth: Some(section.date_of_birth.clone()),
            gender: Some(section.gender.clone()),
            marital_status: Some(section.marital_status.clone()),
            phone_primary: Some(section.phone_primary.clone()),
            education_level: Some(section.education_level.clone()),
        }
    }
}

impl From<&AddressSection> for AddressPatch {
    fn from(section: &AddressSection) -> Self {
        Self {
            province_code: Some(section.province_code.clone()),
            province_name: Some(section.province_name.clone()),
            district_code: Some(section.district_code.clone()),
            district_name: Some(section.district_name.clone()),
            chiefdom_code: Some(section.chiefdom_code.clone()),
            chiefdom_name: Some(section.chiefdom_name.clone()),
            village: Some(section.village.clone()),
        }
    }
}

impl From<&FarmSection> for FarmPatch {
    fn from(section: &FarmSection) -> Self {
        Self {
            size_hectares: Some(section.size_hectares.clone()),
            land_tenure: Some(section.land_tenure.clone()),
            soil_type: Some(section.soil_type.clone()),
            crops: Some(section.crops.clone()),
            livestock: Some(section.livestock),
            household_size: Some(section.household_size.clone()),
            primary_income: Some(section.primary_income.clone()),
            financial_services: Some(section.financial_services.clone()),
            vulnerability: Some(section.vulnerability.clone()),
        }
    }
}

fn merge_field<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl PersonalSection {
    pub fn apply(&mut self, p: PersonalPatch) {
        merge_field(&mut self.nrc, p.nrc);
        merge_field(&mut self.first_name, p.first_name);
        merge_field(&mut self.last_name, p.last_name);
        merge_field(&mut self.date_of_birth, p.date_of_birth);
        merge_field(&mut self.gender, p.gender);
        merge_field(&mut self.marital_status, p.marital_status);
        merge_field(&mut self.phone_primary, p.phone_primary);
        merge_field(&mut self.education_level, p.education_level);
    }
}

impl AddressSection {
    pub fn apply(&mut self, p: AddressPatch) {
        merge_field(&mut self.province_code, p.province_code);
        merge_field(&mut self.province_name, p.province_name);
        merge_field(&mut self.district_code, p.district_code);
        merge_field(&mut self.district_name, p.district_name);
        merge_field(&mut self.chiefdom_code, p.chiefdom_code);
        merge_field(&mut self.chiefdom_name, p.chiefdom_name);
        merge_field(&mut self.village, p.village);
    }
}

impl FarmSection {
    pub fn apply(&mut self, p: FarmPatch) {
        merge_field(&mut self.size_hectares, p.size_hectares);
        merge_field(&mut self.land_tenure, p.land_tenure);
        merge_field(&mut self.soil_type, p.soil_type);
        merge_field(&mut self.crops, p.crops);
        merge_field(&mut self.livestock, p.livestock);
        merge_field(&mut self.household_size, p.household_size);
        merge_field(&mut self.primary_income, p.primary_income);
        merge_field(&mut self.financial_services, p.financial_services);
        merge_field(&mut self.vulnerability, p.vulnerability);
    }
}

/// Identity handed back by the registry after a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFarmer {
    pub farmer_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardDraft {
    pub personal: PersonalSection,
    pub address: AddressSection,
    pub farm: FarmSection,
    created: Option<CreatedFarmer>,
}

impl WizardDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge a patch into the one section it names.
    pub fn update(&mut self, patch: SectionPatch) {
        match patch {
            SectionPatch::Personal(p) => self.personal.apply(p),
            SectionPatch::Address(p) => self.address.apply(p),
            SectionPatch::Farm(p) => self.farm.apply(p),
        }
    }

    pub fn created(&self) -> Option<&CreatedFarmer> {
        self.created.as_ref()
    }

    /// Record the persisted entity. Returns `false` if an id was already set;
    /// a flow creates at most one farmer.
    pub fn mark_created(&mut self, created: CreatedFarmer) -> bool {
        if self.created.is_some() {
            return false;
        }
        self.created = Some(created);
        true
    }
}
