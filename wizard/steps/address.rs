/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 2: location, with cascading province → district → chiefdom selects.
//!
//! Every lookup the panel asks for carries a token from a [`GeoRequestLedger`].
//! Only the latest token per level is accepted; anything older is stale and
//! dropped, so a slow response for a previous province can never overwrite the
//! district list of the current one.

use agriregistry_core::geo::name_for_code;
use agriregistry_core::{
    AddressPatch, AddressSection, ApiError, GeoLevel, GeoOption, SectionPatch, WizardDraft,
};

pub const ADDRESS_REQUIRED_MESSAGE: &str = "Province and District are required.";

fn level_slot(level: GeoLevel) -> usize {
    match level {
        GeoLevel::Province => 0,
        GeoLevel::District => 1,
        GeoLevel::Chiefdom => 2,
    }
}

/// Monotonic request tokens plus the latest one issued per level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeoRequestLedger {
    next: u64,
    latest: [Option<u64>; 3],
}

impl GeoRequestLedger {
    pub fn issue(&mut self, level: GeoLevel) -> u64 {
        self.next += 1;
        self.latest[level_slot(level)] = Some(self.next);
        self.next
    }

    /// Invalidate any in-flight lookup for `level`.
    pub fn retire(&mut self, level: GeoLevel) {
        self.latest[level_slot(level)] = None;
    }

    pub fn is_latest(&self, level: GeoLevel, token: u64) -> bool {
        self.latest[level_slot(level)] == Some(token)
    }
}

/// A lookup the host should perform and answer with the same token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeoRequest {
    pub level: GeoLevel,
    pub parent_code: Option<String>,
    pub token: u64,
}

impl GeoRequest {
    fn issue(ledger: &mut GeoRequestLedger, level: GeoLevel, parent_code: Option<&str>) -> Self {
        Self {
            level,
            parent_code: parent_code.map(str::to_string),
            token: ledger.issue(level),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeoApplyOutcome {
    Applied,
    Failed,
    Stale,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressPanel {
    pub form: AddressSection,
    pub provinces: Vec<GeoOption>,
    pub districts: Vec<GeoOption>,
    pub chiefdoms: Vec<GeoOption>,
    loading: [bool; 3],
    pub lookup_error: Option<String>,
    pub error: Option<String>,
}

impl AddressPanel {
    /// Open the panel on the draft's address. Provinces are always fetched;
    /// child lists are fetched for codes already chosen.
    pub fn open(draft: &WizardDraft, ledger: &mut GeoRequestLedger) -> (Self, Vec<GeoRequest>) {
        let mut panel = Self {
            form: draft.address.clone(),
            ..Self::default()
        };
        let mut requests = vec![panel.request(ledger, GeoLevel::Province, None)];
        if !panel.form.province_code.is_empty() {
            let code = panel.form.province_code.clone();
            requests.push(panel.request(ledger, GeoLevel::District, Some(&code)));
        }
        if !panel.form.district_code.is_empty() {
            let code = panel.form.district_code.clone();
            requests.push(panel.request(ledger, GeoLevel::Chiefdom, Some(&code)));
        }
        (panel, requests)
    }

    fn request(
        &mut self,
        ledger: &mut GeoRequestLedger,
        level: GeoLevel,
        parent_code: Option<&str>,
    ) -> GeoRequest {
        self.loading[level_slot(level)] = true;
        GeoRequest::issue(ledger, level, parent_code)
    }

    pub fn is_loading(&self, level: GeoLevel) -> bool {
        self.loading[level_slot(level)]
    }

    fn clear_district(&mut self, ledger: &mut GeoRequestLedger) {
        self.form.district_code.clear();
        self.form.district_name.clear();
        self.districts.clear();
        self.loading[level_slot(GeoLevel::District)] = false;
        ledger.retire(GeoLevel::District);
    }

    fn clear_chiefdom(&mut self, ledger: &mut GeoRequestLedger) {
        self.form.chiefdom_code.clear();
        self.form.chiefdom_name.clear();
        self.chiefdoms.clear();
        self.loading[level_slot(GeoLevel::Chiefdom)] = false;
        ledger.retire(GeoLevel::Chiefdom);
    }

    /// Choose a province. Clears the district and chiefdom before anything
    /// is fetched; an empty code fetches nothing.
    pub fn select_province(
        &mut self,
        code: &str,
        ledger: &mut GeoRequestLedger,
    ) -> Option<GeoRequest> {
        let code = code.trim();
        if code == self.form.province_code {
            return None;
        }
        self.form.province_code = code.to_string();
        self.form.province_name = name_for_code(&self.provinces, code)
            .unwrap_or_default()
            .to_string();
        self.clear_district(ledger);
        self.clear_chiefdom(ledger);
        (!code.is_empty()).then(|| self.request(ledger, GeoLevel::District, Some(code)))
    }

    pub fn select_district(
        &mut self,
        code: &str,
        ledger: &mut GeoRequestLedger,
    ) -> Option<GeoRequest> {
        let code = code.trim();
        if code == self.form.district_code {
            return None;
        }
        self.form.district_code = code.to_string();
        self.form.district_name = name_for_code(&self.districts, code)
            .unwrap_or_default()
            .to_string();
        self.clear_chiefdom(ledger);
        (!code.is_empty()).then(|| self.request(ledger, GeoLevel::Chiefdom, Some(code)))
    }

    pub fn select_chiefdom(&mut self, code: &str) {
        let code = code.trim();
        self.form.chiefdom_code = code.to_string();
        self.form.chiefdom_name = name_for_code(&self.chiefdoms, code)
            .unwrap_or_default()
            .to_string();
    }

    pub fn set_village(&mut self, village: &str) {
        self.form.village = village.to_string();
    }

    /// Accept a lookup result if its token is still the latest for its level.
    pub fn apply_geo(
        &mut self,
        level: GeoLevel,
        token: u64,
        result: Result<Vec<GeoOption>, ApiError>,
        ledger: &GeoRequestLedger,
    ) -> GeoApplyOutcome {
        if !ledger.is_latest(level, token) {
            return GeoApplyOutcome::Stale;
        }
        self.loading[level_slot(level)] = false;
        let (options, outcome) = match result {
            Ok(options) => {
                self.lookup_error = None;
                (options, GeoApplyOutcome::Applied)
            },
            Err(error) => {
                self.lookup_error = Some(error.to_string());
                (Vec::new(), GeoApplyOutcome::Failed)
            },
        };
        match level {
            GeoLevel::Province => self.provinces = options,
            GeoLevel::District => self.districts = options,
            GeoLevel::Chiefdom => self.chiefdoms = options,
        }
        outcome
    }

    /// Province and district are required. Names are resolved from the
    /// loaded lists, keeping the previous name when a list lacks the code.
    pub fn submit(&mut self) -> Option<SectionPatch> {
        if self.form.province_code.is_empty() || self.form.district_code.is_empty() {
            self.error = Some(ADDRESS_REQUIRED_MESSAGE.to_string());
            return None;
        }
        self.error = None;

        let resolve = |options: &[GeoOption], code: &str, previous: &str| {
            name_for_code(options, code)
                .map(str::to_string)
                .unwrap_or_else(|| previous.to_string())
        };
        let form = &self.form;
        Some(SectionPatch::Address(AddressPatch {
            province_code: Some(form.province_code.clone()),
            province_name: Some(resolve(
                &self.provinces,
                &form.province_code,
                &form.province_name,
            )),
            district_code: Some(form.district_code.clone()),
            district_name: Some(resolve(
                &self.districts,
                &form.district_code,
                &form.district_name,
            )),
            chiefdom_code: Some(form.chiefdom_code.clone()),
            chiefdom_name: Some(resolve(
                &self.chiefdoms,
                &form.chiefdom_code,
                &form.chiefdom_name,
            )),
            village: Some(form.village.trim().to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lusaka() -> Vec<GeoOption> {
        vec![
            GeoOption::new("D0501", "Lusaka"),
            GeoOption::new("D0502", "Chongwe"),
        ]
    }

    fn opened() -> (AddressPanel, GeoRequestLedger) {
        let mut ledger = GeoRequestLedger::default();
        let (mut panel, requests) = AddressPanel::open(&WizardDraft::new(), &mut ledger);
        assert_eq!(requests.len(), 1);
        panel.apply_geo(
            GeoLevel::Province,
            requests[0].token,
            Ok(vec![GeoOption::new("P05", "Lusaka"), GeoOption::new("P02", "Central")]),
            &ledger,
        );
        (panel, ledger)
    }

    #[test]
    fn changing_province_clears_children_before_new_list_arrives() {
        let (mut panel, mut ledger) = opened();
        let request = panel.select_province("P05", &mut ledger).unwrap();
        panel.apply_geo(GeoLevel::District, request.token, Ok(lusaka()), &ledger);
        panel.select_district("D0502", &mut ledger);
        panel.chiefdoms = vec![GeoOption::new("C1", "Bundabunda")];
        panel.select_chiefdom("C1");

        let request = panel.select_province("P02", &mut ledger).unwrap();
        assert_eq!(request.parent_code.as_deref(), Some("P02"));
        assert!(panel.form.district_code.is_empty());
        assert!(panel.form.chiefdom_code.is_empty());
        assert!(panel.districts.is_empty());
        assert!(panel.chiefdoms.is_empty());
        assert!(panel.is_loading(GeoLevel::District));
    }

    #[test]
    fn empty_parent_short_circuits_without_fetch() {
        let (mut panel, mut ledger) = opened();
        assert!(panel.select_province("P05", &mut ledger).is_some());
        assert!(panel.select_province("", &mut ledger).is_none());
        assert!(panel.districts.is_empty());
        assert!(!panel.is_loading(GeoLevel::District));
    }

    #[test]
    fn superseded_district_response_is_stale() {
        let (mut panel, mut ledger) = opened();
        let first = panel.select_province("P05", &mut ledger).unwrap();
        let second = panel.select_province("P02", &mut ledger).unwrap();

        let late = panel.apply_geo(GeoLevel::District, first.token, Ok(lusaka()), &ledger);
        assert_eq!(late, GeoApplyOutcome::Stale);
        assert!(panel.districts.is_empty());

        let current = panel.apply_geo(
            GeoLevel::District,
            second.token,
            Ok(vec![GeoOption::new("D0201", "Kabwe")]),
            &ledger,
        );
        assert_eq!(current, GeoApplyOutcome::Applied);
        assert_eq!(panel.districts[0].name, "Kabwe");
    }

    #[test]
    fn submit_requires_province_and_district_and_resolves_names() {
        let (mut panel, mut ledger) = opened();
        assert!(panel.submit().is_none());
        assert_eq!(panel.error.as_deref(), Some(ADDRESS_REQUIRED_MESSAGE));

        let request = panel.select_province("P05", &mut ledger).unwrap();
        panel.apply_geo(GeoLevel::District, request.token, Ok(lusaka()), &ledger);
        panel.select_district("D0501", &mut ledger);
        panel.set_village(" Kalikiliki ");

        let Some(SectionPatch::Address(patch)) = panel.submit() else {
            panic!("expected address patch");
        };
        assert_eq!(patch.province_name.as_deref(), Some("Lusaka"));
        assert_eq!(patch.district_name.as_deref(), Some("Lusaka"));
        assert_eq!(patch.village.as_deref(), Some("Kalikiliki"));
        assert_eq!(panel.error, None);
    }

    #[test]
    fn failed_lookup_empties_list_and_reports() {
        let (mut panel, mut ledger) = opened();
        let request = panel.select_province("P05", &mut ledger).unwrap();
        let outcome = panel.apply_geo(
            GeoLevel::District,
            request.token,
            Err(ApiError::Network("connection refused".into())),
            &ledger,
        );
        assert_eq!(outcome, GeoApplyOutcome::Failed);
        assert!(panel.districts.is_empty());
        assert!(panel.lookup_error.is_some());
    }

    #[test]
    fn successful_retry_clears_lookup_error() {
        let (mut panel, mut ledger) = opened();
        let failed = panel.select_province("P05", &mut ledger).unwrap();
        panel.apply_geo(
            GeoLevel::District,
            failed.token,
            Err(ApiError::Network("connection refused".into())),
            &ledger,
        );
        assert!(panel.lookup_error.is_some());

        let retry = panel.select_province("P02", &mut ledger).unwrap();
        let outcome = panel.apply_geo(
            GeoLevel::District,
            retry.token,
            Ok(vec![GeoOption::new("D0201", "Kabwe")]),
            &ledger,
        );
        assert_eq!(outcome, GeoApplyOutcome::Applied);
        assert_eq!(panel.lookup_error, None);
    }
}
