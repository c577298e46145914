/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use agriregistry::VERSION;
use agriregistry::runtime::diagnostics::{CHANNEL_GEO_RESPONSE_STALE, DiagnosticsState};
use agriregistry::shell::nav_shell::NavShellView;
use agriregistry::shell::route_guard::{GuardOutcome, resolve, resolve_final};
use agriregistry::shell::routes::Route;
use agriregistry::shell::session_store::{SessionSnapshot, SessionStore};
use agriregistry::test_utils::{FakeRegistryApi, upload_file};
use agriregistry::wizard::driver::{WizardDriver, execute_effect};
use agriregistry::wizard::steps::ActivePanel;
use agriregistry::wizard::{WizardEffect, WizardIntent, WizardStep};
use agriregistry_core::{DocumentKind, GeoLevel, PersonalPatch};

fn jane() -> WizardIntent {
    WizardIntent::EditPersonal(PersonalPatch {
        nrc: Some("123456/10/1".into()),
        first_name: Some("Jane".into()),
        last_name: Some("Mwale".into()),
        ..Default::default()
    })
}

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}

#[tokio::test]
async fn operator_is_sent_to_login_from_operator_management() {
    let api = FakeRegistryApi::new();
    let store = SessionStore::in_memory();
    assert!(store.login(&api, "operator@agri.zm", "secret").await);

    let resolution = resolve_final("/operators/manage", &store.snapshot());
    assert_eq!(resolution.landed(), &Route::Login);

    let view = NavShellView::build(&store.snapshot().session, "/farmers/create");
    assert!(!view.visible_targets().contains(&"/operators/manage"));
    assert_eq!(view.page_title, "New Farmer Registration");
}

#[tokio::test]
async fn jane_mwale_is_registered_end_to_end() {
    let api = FakeRegistryApi::new();
    let mut driver = WizardDriver::new(&api);

    driver.dispatch([jane(), WizardIntent::Next]).await;
    driver.dispatch([WizardIntent::SelectProvince("P05".into())]).await;
    driver
        .dispatch([
            WizardIntent::SelectDistrict("D0501".into()),
            WizardIntent::Next,
            WizardIntent::Next,
        ])
        .await;
    assert_eq!(driver.wizard().step(), WizardStep::Preview);

    let ActivePanel::Preview(preview) = driver.wizard().panel() else {
        panic!("expected preview");
    };
    assert_eq!(preview.value("Name"), Some("Jane Mwale"));
    assert_eq!(preview.value("Province"), Some("Lusaka"));
    assert_eq!(preview.value("District"), Some("Lusaka"));
    assert_eq!(preview.value("Chiefdom"), Some("-"));

    driver.dispatch([WizardIntent::Submit]).await;
    assert_eq!(driver.wizard().step(), WizardStep::PhotoUpload);
    assert_eq!(
        driver.wizard().created().map(|c| c.farmer_id.as_str()),
        Some("ZM-000001")
    );
    let sent = api.created();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].address.province, "Lusaka");
    assert_eq!(sent[0].address.province_code, "P05");

    driver
        .dispatch([
            WizardIntent::UploadPhoto(upload_file("jane.jpg", "image/jpeg")),
            WizardIntent::Next,
            WizardIntent::UploadDocument {
                kind: DocumentKind::Nrc,
                file: upload_file("nrc.pdf", "application/pdf"),
            },
        ])
        .await;
    driver.dispatch([WizardIntent::Finish]).await;

    let uploads = api.uploads();
    assert_eq!(uploads.len(), 2);
    assert!(uploads.iter().all(|u| u.farmer_id == "ZM-000001"));
    let ActivePanel::Completion(done) = driver.wizard().panel() else {
        panic!("expected completion");
    };
    assert_eq!(done.profile_link, Route::FarmerDetail("ZM-000001".into()));
}

#[tokio::test]
async fn failing_create_keeps_preview_and_allows_resubmit() {
    let api = FakeRegistryApi::new();
    api.fail_next_create("Farmer with this NRC already exists");
    let mut driver = WizardDriver::new(&api);
    driver.dispatch([jane(), WizardIntent::Next]).await;
    driver.dispatch([WizardIntent::SelectProvince("P02".into())]).await;
    driver
        .dispatch([
            WizardIntent::SelectDistrict("D0201".into()),
            WizardIntent::Next,
            WizardIntent::Next,
        ])
        .await;
    let draft = driver.wizard().draft().clone();

    driver.dispatch([WizardIntent::Submit]).await;
    assert_eq!(driver.wizard().step(), WizardStep::Preview);
    assert_eq!(
        driver.wizard().panel().error(),
        Some("Farmer with this NRC already exists")
    );
    assert_eq!(driver.wizard().draft(), &draft);

    driver.dispatch([WizardIntent::Submit]).await;
    assert_eq!(driver.wizard().step(), WizardStep::PhotoUpload);
}

#[tokio::test]
async fn stale_district_list_is_discarded() {
    let mut diagnostics = DiagnosticsState::new();
    diagnostics.install_for_current_thread();

    let api = FakeRegistryApi::new();
    let mut driver = WizardDriver::new(&api);
    driver.dispatch([jane(), WizardIntent::Next]).await;
    let mut wizard = driver.into_wizard();

    wizard.apply_intents([
        WizardIntent::SelectProvince("P05".into()),
        WizardIntent::SelectProvince("P02".into()),
    ]);
    let effects = wizard.take_pending_effects();
    assert_eq!(effects.len(), 2);
    assert!(
        effects
            .iter()
            .all(|e| matches!(e, WizardEffect::FetchGeo(r) if r.level == GeoLevel::District))
    );

    // Answer newest first so the older Lusaka list arrives late.
    let mut answers = Vec::new();
    for effect in effects.into_iter().rev() {
        answers.push(execute_effect(&api, effect).await);
    }
    wizard.apply_intents(answers);

    let ActivePanel::Address(panel) = wizard.panel() else {
        panic!("expected address panel");
    };
    assert_eq!(panel.form.province_code, "P02");
    let names: Vec<&str> = panel.districts.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Kabwe"]);

    diagnostics.drain();
    assert_eq!(diagnostics.channel_count(CHANNEL_GEO_RESPONSE_STALE), 1);
    agriregistry::runtime::diagnostics::clear_thread_sender();
}

#[tokio::test]
async fn unknown_path_lands_on_role_dashboard() {
    let api = FakeRegistryApi::new();
    let store = SessionStore::in_memory();
    assert!(store.login(&api, "admin@agri.zm", "secret").await);

    let resolution = resolve_final("/no/such/page", &store.snapshot());
    assert_eq!(resolution.hops, vec![Route::Root, Route::AdminDashboard]);
    assert_eq!(resolution.outcome, GuardOutcome::Render);
}

#[test]
fn loading_session_never_redirects() {
    let store = SessionStore::in_memory();
    store.begin_restore();
    let snapshot: SessionSnapshot = store.snapshot();
    for path in ["/", "/farmers", "/operators/manage", "/missing"] {
        assert_eq!(resolve(&Route::parse(path), &snapshot), GuardOutcome::Waiting);
    }
}
