/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Runs queued wizard effects against the registry API.

use std::time::Instant;

use agriregistry_core::{GeoLevel, RegistryApi};
use log::debug;

use super::{RegistrationWizard, WizardEffect, WizardIntent};
use crate::runtime::diagnostics::{
    CHANNEL_API_CREATE_RESPONSE, CHANNEL_API_GEO_RESPONSE, CHANNEL_API_UPLOAD_REQUEST,
    CHANNEL_API_UPLOAD_RESPONSE, DiagnosticEvent, emit_event, emit_signal,
};

fn effect_channel(effect: &WizardEffect) -> &'static str {
    match effect {
        WizardEffect::FetchGeo(_) => CHANNEL_API_GEO_RESPONSE,
        WizardEffect::CreateFarmer(_) => CHANNEL_API_CREATE_RESPONSE,
        WizardEffect::UploadPhoto { .. } | WizardEffect::UploadDocument { .. } => {
            CHANNEL_API_UPLOAD_RESPONSE
        },
    }
}

/// Perform one effect and turn its outcome into the intent that reports it.
/// The round trip is reported as a `MessageReceived` latency on the
/// effect's response channel.
pub async fn execute_effect<A: RegistryApi>(api: &A, effect: WizardEffect) -> WizardIntent {
    let channel_id = effect_channel(&effect);
    let started = Instant::now();
    let intent = run_effect(api, effect).await;
    emit_event(DiagnosticEvent::MessageReceived {
        channel_id,
        latency_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
    });
    intent
}

async fn run_effect<A: RegistryApi>(api: &A, effect: WizardEffect) -> WizardIntent {
    match effect {
        WizardEffect::FetchGeo(request) => {
            let parent = request.parent_code.as_deref().unwrap_or_default();
            let result = match request.level {
                GeoLevel::Province => api.provinces().await,
                GeoLevel::District => api.districts(parent).await,
                GeoLevel::Chiefdom => api.chiefdoms(parent).await,
            };
            WizardIntent::GeoLoaded {
                level: request.level,
                token: request.token,
                result,
            }
        },
        WizardEffect::CreateFarmer(payload) => {
            WizardIntent::CreateFinished(api.create_farmer(&payload).await)
        },
        WizardEffect::UploadPhoto { farmer_id, file } => {
            emit_signal(CHANNEL_API_UPLOAD_REQUEST, file.bytes.len());
            WizardIntent::PhotoUploaded(api.upload_photo(&farmer_id, &file).await)
        },
        WizardEffect::UploadDocument {
            farmer_id,
            kind,
            file,
        } => {
            emit_signal(CHANNEL_API_UPLOAD_REQUEST, file.bytes.len());
            let result = api.upload_document(&farmer_id, &kind, &file).await;
            WizardIntent::DocumentUploaded {
                kind,
                file_name: file.file_name,
                result,
            }
        },
    }
}

/// A wizard bound to an API. Effects run one at a time in the order they
/// were queued.
pub struct WizardDriver<'a, A> {
    api: &'a A,
    wizard: RegistrationWizard,
}

impl<'a, A: RegistryApi> WizardDriver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            wizard: RegistrationWizard::new(),
        }
    }

    pub fn wizard(&self) -> &RegistrationWizard {
        &self.wizard
    }

    pub fn into_wizard(self) -> RegistrationWizard {
        self.wizard
    }

    /// Apply `intents` one at a time, settling after each so that later
    /// intents see the results of the calls earlier ones queued. Returns the
    /// number of effects executed.
    pub async fn dispatch<I>(&mut self, intents: I) -> usize
    where
        I: IntoIterator<Item = WizardIntent>,
    {
        let mut executed = 0;
        for intent in intents {
            self.wizard.apply_intents([intent]);
            executed += self.settle().await;
        }
        executed
    }

    /// Drain the effect queue, feeding each result back. Returns the number
    /// of effects executed.
    pub async fn settle(&mut self) -> usize {
        let mut executed = 0;
        loop {
            let effects = self.wizard.take_pending_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                let intent = execute_effect(self.api, effect).await;
                self.wizard.apply_intents([intent]);
                executed += 1;
            }
        }
        debug!(
            "flow {}: settled after {executed} effect(s)",
            self.wizard.flow_id()
        );
        executed
    }
}

#[cfg(test)]
mod tests {
    use agriregistry_core::PersonalPatch;

    use super::*;
    use crate::runtime::diagnostics::DiagnosticsState;
    use crate::test_utils::{FakeRegistryApi, block_on, upload_file};
    use crate::wizard::WizardStep;
    use crate::wizard::steps::ActivePanel;

    fn jane() -> WizardIntent {
        WizardIntent::EditPersonal(PersonalPatch {
            nrc: Some("123456/10/1".into()),
            first_name: Some("Jane".into()),
            last_name: Some("Mwale".into()),
            ..Default::default()
        })
    }

    /// Personal, address and preview done, farmer created.
    fn created_driver(api: &FakeRegistryApi) -> WizardDriver<'_, FakeRegistryApi> {
        let mut driver = WizardDriver::new(api);
        block_on(driver.dispatch([
            jane(),
            WizardIntent::Next,
            WizardIntent::SelectProvince("P05".into()),
            WizardIntent::SelectDistrict("D0501".into()),
            WizardIntent::Next,
            WizardIntent::Next,
            WizardIntent::Submit,
        ]));
        assert_eq!(driver.wizard().step(), WizardStep::PhotoUpload);
        driver
    }

    #[test]
    fn upload_then_next_in_one_dispatch_reaches_documents() {
        let api = FakeRegistryApi::new();
        let mut driver = created_driver(&api);
        let executed = block_on(driver.dispatch([
            WizardIntent::UploadPhoto(upload_file("jane.jpg", "image/jpeg")),
            WizardIntent::Next,
        ]));

        assert_eq!(executed, 1);
        assert_eq!(driver.wizard().step(), WizardStep::DocumentUpload);
        assert!(driver.wizard().uploaded_photo().is_some());
        assert_eq!(api.uploads().len(), 1);
    }

    #[test]
    fn api_calls_report_latency_and_upload_size() {
        let mut diagnostics = DiagnosticsState::new();
        diagnostics.install_for_current_thread();

        let api = FakeRegistryApi::new();
        let mut driver = created_driver(&api);
        block_on(driver.dispatch([WizardIntent::UploadPhoto(upload_file(
            "jane.jpg",
            "image/jpeg",
        ))]));

        diagnostics.drain();
        crate::runtime::diagnostics::clear_thread_sender();
        assert_eq!(diagnostics.channel_count(CHANNEL_API_CREATE_RESPONSE), 1);
        assert_eq!(diagnostics.channel_count(CHANNEL_API_UPLOAD_RESPONSE), 1);
        assert!(diagnostics.channel_count(CHANNEL_API_GEO_RESPONSE) >= 2);
        let graph = diagnostics.graph();
        assert!(graph.message_latency_us.contains_key(CHANNEL_API_UPLOAD_RESPONSE));
        assert_eq!(
            graph.message_bytes_sent.get(CHANNEL_API_UPLOAD_REQUEST),
            Some(&4)
        );
    }

    #[test]
    fn settle_answers_geo_lookups_issued_on_entering_address() {
        let api = FakeRegistryApi::new();
        let mut driver = WizardDriver::new(&api);
        block_on(driver.dispatch([
            WizardIntent::EditPersonal(PersonalPatch {
                nrc: Some("123456/10/1".into()),
                first_name: Some("Jane".into()),
                last_name: Some("Mwale".into()),
                ..Default::default()
            }),
            WizardIntent::Next,
        ]));

        assert_eq!(driver.wizard().step(), WizardStep::Address);
        let ActivePanel::Address(panel) = driver.wizard().panel() else {
            panic!("expected address panel");
        };
        assert!(!panel.provinces.is_empty());
        assert!(!panel.is_loading(GeoLevel::Province));
    }
}
