/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Farmer registration wizard.
//!
//! [`RegistrationWizard`] is a deterministic reducer: hosts feed it
//! [`WizardIntent`]s and it never performs I/O. Anything that needs the API is
//! queued as a [`WizardEffect`]; the host drains the queue with
//! [`RegistrationWizard::take_pending_effects`], runs the calls, and reports
//! back with result intents in whatever order they complete.

pub mod driver;
pub mod steps;

use agriregistry_core::{
    ApiError, CreatedFarmer, DocumentKind, FarmPatch, FarmerCreatePayload, GeoLevel, GeoOption,
    PersonalPatch, UploadFile, UploadReceipt, WizardDraft,
};
use log::debug;
use uuid::Uuid;

use crate::runtime::diagnostics::{
    CHANNEL_GEO_LOOKUP_FAILED, CHANNEL_GEO_LOOKUP_ISSUED, CHANNEL_GEO_RESPONSE_STALE,
    CHANNEL_UPLOAD_FAILED, CHANNEL_UPLOAD_SUCCEEDED, CHANNEL_WIZARD_CREATE_FAILED,
    CHANNEL_WIZARD_CREATE_SUCCEEDED, CHANNEL_WIZARD_INTENT_IGNORED, CHANNEL_WIZARD_STEP_ADVANCED,
    CHANNEL_WIZARD_STEP_BLOCKED, CHANNEL_WIZARD_STEP_RETREATED, DiagnosticEvent, emit_event,
    emit_signal,
};
use steps::{
    ActivePanel, AddressPanel, CompletionPanel, DocumentUploadPanel, FarmChoiceGroup, FarmPanel,
    GeoApplyOutcome, GeoRequest, GeoRequestLedger, LivestockKind, PersonalPanel,
    PhotoUploadPanel, PreviewPanel, UploadedDocument,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Personal = 1,
    Address = 2,
    Farm = 3,
    Preview = 4,
    PhotoUpload = 5,
    DocumentUpload = 6,
    Completion = 7,
}

impl WizardStep {
    pub const ALL: [Self; 7] = [
        Self::Personal,
        Self::Address,
        Self::Farm,
        Self::Preview,
        Self::PhotoUpload,
        Self::DocumentUpload,
        Self::Completion,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Personal => "Bio-Data",
            Self::Address => "Location",
            Self::Farm => "Farm Profile",
            Self::Preview => "Preview",
            Self::PhotoUpload => "Photo",
            Self::DocumentUpload => "Documents",
            Self::Completion => "Complete",
        }
    }

    /// Steps after creation address the persisted farmer and cannot exist
    /// without its id.
    pub fn requires_created(self) -> bool {
        self >= Self::PhotoUpload
    }
}

/// Number of steps shown in the progress indicator.
pub const PROGRESS_STEPS: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DotState {
    Done,
    Active,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressDot {
    pub step: WizardStep,
    pub state: DotState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WizardIntent {
    EditPersonal(PersonalPatch),
    EditFarm(FarmPatch),
    ToggleFarmChoice {
        group: FarmChoiceGroup,
        value: String,
    },
    SetLivestock {
        kind: LivestockKind,
        count: String,
    },
    SelectProvince(String),
    SelectDistrict(String),
    SelectChiefdom(String),
    SetVillage(String),
    Next,
    Back,
    /// Submit the preview. Equivalent to `Next` on the preview step.
    Submit,
    /// Leave the document step for completion. Equivalent to `Next` there.
    Finish,
    UploadPhoto(UploadFile),
    UploadDocument {
        kind: DocumentKind,
        file: UploadFile,
    },
    GeoLoaded {
        level: GeoLevel,
        token: u64,
        result: Result<Vec<GeoOption>, ApiError>,
    },
    CreateFinished(Result<String, ApiError>),
    PhotoUploaded(Result<UploadReceipt, ApiError>),
    DocumentUploaded {
        kind: DocumentKind,
        file_name: String,
        result: Result<UploadReceipt, ApiError>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WizardEffect {
    FetchGeo(GeoRequest),
    CreateFarmer(FarmerCreatePayload),
    UploadPhoto {
        farmer_id: String,
        file: UploadFile,
    },
    UploadDocument {
        farmer_id: String,
        kind: DocumentKind,
        file: UploadFile,
    },
}

/// What a host renders for the current step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardView {
    pub flow_id: Uuid,
    pub step: WizardStep,
    pub progress: Option<Vec<ProgressDot>>,
    pub panel: ActivePanel,
}

#[derive(Debug)]
pub struct RegistrationWizard {
    flow_id: Uuid,
    step: WizardStep,
    draft: WizardDraft,
    panel: ActivePanel,
    ledger: GeoRequestLedger,
    pending_effects: Vec<WizardEffect>,
    /// Uploads accepted for the created farmer. Panels for steps 5 and 6
    /// are rebuilt on every visit and reopen from these.
    photo: Option<UploadReceipt>,
    documents: Vec<UploadedDocument>,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    pub fn new() -> Self {
        let draft = WizardDraft::new();
        let flow_id = Uuid::new_v4();
        debug!("registration flow {flow_id} started");
        Self {
            flow_id,
            step: WizardStep::Personal,
            panel: ActivePanel::Personal(PersonalPanel::open(&draft)),
            draft,
            ledger: GeoRequestLedger::default(),
            pending_effects: Vec::new(),
            photo: None,
            documents: Vec::new(),
        }
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    pub fn created(&self) -> Option<&CreatedFarmer> {
        self.draft.created()
    }

    pub fn panel(&self) -> &ActivePanel {
        &self.panel
    }

    /// True while the create call is outstanding.
    pub fn is_submitting(&self) -> bool {
        matches!(&self.panel, ActivePanel::Preview(preview) if preview.submitting)
    }

    pub fn take_pending_effects(&mut self) -> Vec<WizardEffect> {
        std::mem::take(&mut self.pending_effects)
    }

    pub fn uploaded_photo(&self) -> Option<&UploadReceipt> {
        self.photo.as_ref()
    }

    pub fn uploaded_documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    pub fn has_pending_effects(&self) -> bool {
        !self.pending_effects.is_empty()
    }

    /// Four dots for the pre-creation steps; hidden afterwards.
    pub fn progress(&self) -> Option<Vec<ProgressDot>> {
        if self.step.number() > PROGRESS_STEPS {
            return None;
        }
        Some(
            WizardStep::ALL
                .iter()
                .take(usize::from(PROGRESS_STEPS))
                .map(|&step| ProgressDot {
                    step,
                    state: match step.cmp(&self.step) {
                        std::cmp::Ordering::Less => DotState::Done,
                        std::cmp::Ordering::Equal => DotState::Active,
                        std::cmp::Ordering::Greater => DotState::Pending,
                    },
                })
                .collect(),
        )
    }

    /// `None` if the current step needs a created farmer that does not exist.
    pub fn view(&self) -> Option<WizardView> {
        if self.step.requires_created() && self.draft.created().is_none() {
            return None;
        }
        Some(WizardView {
            flow_id: self.flow_id,
            step: self.step,
            progress: self.progress(),
            panel: self.panel.clone(),
        })
    }

    /// Apply a batch of intents deterministically in insertion order.
    pub fn apply_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = WizardIntent>,
    {
        for intent in intents {
            self.apply_intent(intent);
        }
    }

    fn apply_intent(&mut self, intent: WizardIntent) {
        match intent {
            WizardIntent::EditPersonal(patch) => match &mut self.panel {
                ActivePanel::Personal(panel) => panel.edit(patch),
                _ => self.ignored("edit_personal"),
            },
            WizardIntent::EditFarm(patch) => match &mut self.panel {
                ActivePanel::Farm(panel) => panel.edit(patch),
                _ => self.ignored("edit_farm"),
            },
            WizardIntent::ToggleFarmChoice { group, value } => match &mut self.panel {
                ActivePanel::Farm(panel) => panel.toggle(group, &value),
                _ => self.ignored("toggle_farm_choice"),
            },
            WizardIntent::SetLivestock { kind, count } => match &mut self.panel {
                ActivePanel::Farm(panel) => panel.set_livestock(kind, &count),
                _ => self.ignored("set_livestock"),
            },
            WizardIntent::SelectProvince(code) => match &mut self.panel {
                ActivePanel::Address(panel) => {
                    if let Some(request) = panel.select_province(&code, &mut self.ledger) {
                        self.queue_geo(request);
                    }
                },
                _ => self.ignored("select_province"),
            },
            WizardIntent::SelectDistrict(code) => match &mut self.panel {
                ActivePanel::Address(panel) => {
                    if let Some(request) = panel.select_district(&code, &mut self.ledger) {
                        self.queue_geo(request);
                    }
                },
                _ => self.ignored("select_district"),
            },
            WizardIntent::SelectChiefdom(code) => match &mut self.panel {
                ActivePanel::Address(panel) => panel.select_chiefdom(&code),
                _ => self.ignored("select_chiefdom"),
            },
            WizardIntent::SetVillage(village) => match &mut self.panel {
                ActivePanel::Address(panel) => panel.set_village(&village),
                _ => self.ignored("set_village"),
            },
            WizardIntent::Next => self.next(),
            WizardIntent::Back => self.back(),
            WizardIntent::Submit => match self.step {
                WizardStep::Preview => self.submit(),
                _ => self.ignored("submit"),
            },
            WizardIntent::Finish => match self.step {
                WizardStep::DocumentUpload => self.next(),
                _ => self.ignored("finish"),
            },
            WizardIntent::UploadPhoto(file) => self.upload_photo(file),
            WizardIntent::UploadDocument { kind, file } => self.upload_document(kind, file),
            WizardIntent::GeoLoaded {
                level,
                token,
                result,
            } => self.geo_loaded(level, token, result),
            WizardIntent::CreateFinished(result) => self.create_finished(result),
            WizardIntent::PhotoUploaded(result) => match &mut self.panel {
                ActivePanel::PhotoUpload(panel) if panel.uploading => {
                    emit_signal(upload_channel(&result), 0);
                    panel.finish(result);
                    self.photo = panel.uploaded.clone();
                },
                _ => self.ignored("photo_uploaded"),
            },
            WizardIntent::DocumentUploaded {
                kind,
                file_name,
                result,
            } => match &mut self.panel {
                ActivePanel::DocumentUpload(panel) if panel.in_flight.contains(&kind) => {
                    emit_signal(upload_channel(&result), 0);
                    panel.finish(kind, file_name, result);
                    self.documents = panel.uploaded.clone();
                },
                _ => self.ignored("document_uploaded"),
            },
        }
    }

    fn ignored(&self, what: &'static str) {
        debug!(
            "flow {}: {what} ignored on step {}",
            self.flow_id,
            self.step.number()
        );
        emit_signal(CHANNEL_WIZARD_INTENT_IGNORED, 0);
    }

    fn queue_geo(&mut self, request: GeoRequest) {
        emit_signal(CHANNEL_GEO_LOOKUP_ISSUED, 0);
        self.pending_effects.push(WizardEffect::FetchGeo(request));
    }

    /// Open the panel for `step` from the current draft.
    fn enter(&mut self, step: WizardStep) {
        let panel = match step {
            WizardStep::Personal => ActivePanel::Personal(PersonalPanel::open(&self.draft)),
            WizardStep::Address => {
                let (panel, requests) = AddressPanel::open(&self.draft, &mut self.ledger);
                for request in requests {
                    self.queue_geo(request);
                }
                ActivePanel::Address(panel)
            },
            WizardStep::Farm => ActivePanel::Farm(FarmPanel::open(&self.draft)),
            WizardStep::Preview => ActivePanel::Preview(PreviewPanel::open(&self.draft)),
            WizardStep::PhotoUpload | WizardStep::DocumentUpload | WizardStep::Completion => {
                let Some(created) = self.draft.created() else {
                    self.ignored("enter_without_created");
                    return;
                };
                match step {
                    WizardStep::PhotoUpload => ActivePanel::PhotoUpload(PhotoUploadPanel::open(
                        created,
                        self.photo.clone(),
                    )),
                    WizardStep::DocumentUpload => ActivePanel::DocumentUpload(
                        DocumentUploadPanel::open(created, self.documents.clone()),
                    ),
                    _ => ActivePanel::Completion(CompletionPanel::open(created)),
                }
            },
        };
        let from = self.step;
        self.step = step;
        self.panel = panel;
        debug!(
            "flow {}: step {} -> {}",
            self.flow_id,
            from.number(),
            step.number()
        );
        let channel = if step > from {
            CHANNEL_WIZARD_STEP_ADVANCED
        } else {
            CHANNEL_WIZARD_STEP_RETREATED
        };
        emit_event(DiagnosticEvent::MessageSent {
            channel_id: channel,
            byte_len: 0,
        });
    }

    fn next(&mut self) {
        let merged = match &mut self.panel {
            ActivePanel::Personal(panel) => panel.submit(),
            ActivePanel::Address(panel) => panel.submit(),
            ActivePanel::Farm(panel) => Some(panel.submit()),
            ActivePanel::Preview(_) => {
                self.submit();
                return;
            },
            ActivePanel::PhotoUpload(panel) => {
                if panel.uploading {
                    self.ignored("next_while_uploading");
                    return;
                }
                self.enter(WizardStep::DocumentUpload);
                return;
            },
            ActivePanel::DocumentUpload(panel) => {
                if panel.is_uploading() {
                    self.ignored("finish_while_uploading");
                    return;
                }
                self.enter(WizardStep::Completion);
                return;
            },
            ActivePanel::Completion(_) => {
                self.ignored("next_from_completion");
                return;
            },
        };
        let Some(patch) = merged else {
            emit_signal(CHANNEL_WIZARD_STEP_BLOCKED, 0);
            return;
        };
        self.draft.update(patch);
        let next = match self.step {
            WizardStep::Personal => WizardStep::Address,
            WizardStep::Address => WizardStep::Farm,
            _ => WizardStep::Preview,
        };
        self.enter(next);
    }

    fn back(&mut self) {
        let target = match self.step {
            WizardStep::Address => WizardStep::Personal,
            WizardStep::Farm => WizardStep::Address,
            WizardStep::Preview if !self.is_submitting() => WizardStep::Farm,
            WizardStep::DocumentUpload if !self.documents_in_flight() => WizardStep::PhotoUpload,
            WizardStep::Personal
            | WizardStep::Preview
            | WizardStep::PhotoUpload
            | WizardStep::DocumentUpload
            | WizardStep::Completion => {
                self.ignored("back");
                return;
            },
        };
        self.enter(target);
    }

    fn documents_in_flight(&self) -> bool {
        matches!(&self.panel, ActivePanel::DocumentUpload(panel) if panel.is_uploading())
    }

    fn submit(&mut self) {
        if self.draft.created().is_some() {
            self.ignored("submit_after_create");
            return;
        }
        let ActivePanel::Preview(panel) = &mut self.panel else {
            return;
        };
        match panel.begin_submit(&self.draft) {
            Some(payload) => {
                debug!("flow {}: submitting farmer", self.flow_id);
                self.pending_effects
                    .push(WizardEffect::CreateFarmer(payload));
            },
            None => self.ignored("submit_in_flight"),
        }
    }

    fn create_finished(&mut self, result: Result<String, ApiError>) {
        let ActivePanel::Preview(panel) = &mut self.panel else {
            self.ignored("create_finished");
            return;
        };
        if !panel.submitting {
            self.ignored("create_finished");
            return;
        }
        match result {
            Ok(farmer_id) => {
                let created = CreatedFarmer {
                    farmer_id,
                    display_name: self.draft.personal.full_name(),
                };
                log::info!(
                    "flow {}: farmer {} created",
                    self.flow_id,
                    created.farmer_id
                );
                if self.draft.mark_created(created) {
                    emit_signal(CHANNEL_WIZARD_CREATE_SUCCEEDED, 0);
                    self.enter(WizardStep::PhotoUpload);
                }
            },
            Err(error) => {
                log::warn!("flow {}: create failed: {error}", self.flow_id);
                panel.fail(&error);
                emit_signal(CHANNEL_WIZARD_CREATE_FAILED, 0);
            },
        }
    }

    fn geo_loaded(
        &mut self,
        level: GeoLevel,
        token: u64,
        result: Result<Vec<GeoOption>, ApiError>,
    ) {
        let outcome = match &mut self.panel {
            ActivePanel::Address(panel) => panel.apply_geo(level, token, result, &self.ledger),
            _ => GeoApplyOutcome::Stale,
        };
        match outcome {
            GeoApplyOutcome::Applied => {},
            GeoApplyOutcome::Failed => emit_signal(CHANNEL_GEO_LOOKUP_FAILED, 0),
            GeoApplyOutcome::Stale => {
                debug!(
                    "flow {}: discarded stale {} response #{token}",
                    self.flow_id,
                    level.label()
                );
                emit_signal(CHANNEL_GEO_RESPONSE_STALE, 0);
            },
        }
    }

    fn upload_photo(&mut self, file: UploadFile) {
        let ActivePanel::PhotoUpload(panel) = &mut self.panel else {
            self.ignored("upload_photo");
            return;
        };
        if panel.begin_upload(&file).is_some() {
            self.pending_effects.push(WizardEffect::UploadPhoto {
                farmer_id: panel.farmer_id.clone(),
                file,
            });
        }
    }

    fn upload_document(&mut self, kind: DocumentKind, file: UploadFile) {
        let ActivePanel::DocumentUpload(panel) = &mut self.panel else {
            self.ignored("upload_document");
            return;
        };
        if panel.begin_upload(&kind, &file).is_some() {
            self.pending_effects.push(WizardEffect::UploadDocument {
                farmer_id: panel.farmer_id.clone(),
                kind,
                file,
            });
        }
    }
}

fn upload_channel<T>(result: &Result<T, ApiError>) -> &'static str {
    if result.is_ok() {
        CHANNEL_UPLOAD_SUCCEEDED
    } else {
        CHANNEL_UPLOAD_FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal_intent() -> WizardIntent {
        WizardIntent::EditPersonal(PersonalPatch {
            nrc: Some("123456/10/1".into()),
            first_name: Some("Jane".into()),
            last_name: Some("Mwale".into()),
            ..Default::default()
        })
    }

    fn geo_requests(wizard: &mut RegistrationWizard) -> Vec<GeoRequest> {
        wizard
            .take_pending_effects()
            .into_iter()
            .filter_map(|effect| match effect {
                WizardEffect::FetchGeo(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Drive a fresh wizard to the preview step with a valid address.
    fn at_preview() -> RegistrationWizard {
        let mut wizard = RegistrationWizard::new();
        wizard.apply_intents([personal_intent(), WizardIntent::Next]);
        let provinces = geo_requests(&mut wizard);
        wizard.apply_intents([
            WizardIntent::GeoLoaded {
                level: GeoLevel::Province,
                token: provinces[0].token,
                result: Ok(vec![GeoOption::new("P05", "Lusaka")]),
            },
            WizardIntent::SelectProvince("P05".into()),
        ]);
        let districts = geo_requests(&mut wizard);
        wizard.apply_intents([
            WizardIntent::GeoLoaded {
                level: GeoLevel::District,
                token: districts[0].token,
                result: Ok(vec![GeoOption::new("D0501", "Lusaka")]),
            },
            WizardIntent::SelectDistrict("D0501".into()),
            WizardIntent::Next,
            WizardIntent::Next,
        ]);
        wizard.take_pending_effects();
        assert_eq!(wizard.step(), WizardStep::Preview);
        wizard
    }

    #[test]
    fn blocked_personal_step_keeps_step_and_shows_message() {
        let mut wizard = RegistrationWizard::new();
        wizard.apply_intents([WizardIntent::Next]);
        assert_eq!(wizard.step(), WizardStep::Personal);
        assert_eq!(
            wizard.panel().error(),
            Some(steps::personal::PERSONAL_REQUIRED_MESSAGE)
        );
    }

    #[test]
    fn back_from_farm_returns_to_address_without_touching_draft() {
        let mut wizard = at_preview();
        wizard.apply_intents([WizardIntent::Back]);
        assert_eq!(wizard.step(), WizardStep::Farm);
        wizard.apply_intents([WizardIntent::EditFarm(FarmPatch {
            size_hectares: Some("4.5".into()),
            ..Default::default()
        })]);
        let before = wizard.draft().clone();

        wizard.apply_intents([WizardIntent::Back]);
        assert_eq!(wizard.step(), WizardStep::Address);
        assert_eq!(wizard.draft(), &before);
        assert_eq!(wizard.draft().farm.size_hectares, "");
    }

    #[test]
    fn progress_marks_done_active_pending() {
        let wizard = at_preview();
        let dots = wizard.progress().unwrap();
        assert_eq!(dots.len(), 4);
        assert_eq!(dots[0].state, DotState::Done);
        assert_eq!(dots[3].state, DotState::Active);
        assert_eq!(dots[3].step.title(), "Preview");

        let fresh = RegistrationWizard::new();
        let dots = fresh.progress().unwrap();
        assert_eq!(dots[0].state, DotState::Active);
        assert_eq!(dots[1].state, DotState::Pending);
    }

    #[test]
    fn submit_queues_single_create_and_blocks_back_while_in_flight() {
        let mut wizard = at_preview();
        wizard.apply_intents([WizardIntent::Submit, WizardIntent::Submit, WizardIntent::Back]);
        let effects = wizard.take_pending_effects();
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], WizardEffect::CreateFarmer(_)));
        assert_eq!(wizard.step(), WizardStep::Preview);
        assert!(wizard.is_submitting());
    }

    #[test]
    fn failed_create_stays_on_preview_with_error() {
        let mut wizard = at_preview();
        let draft = wizard.draft().clone();
        wizard.apply_intents([
            WizardIntent::Submit,
            WizardIntent::CreateFinished(Err(ApiError::Status {
                code: 409,
                message: "NRC already registered".into(),
            })),
        ]);
        assert_eq!(wizard.step(), WizardStep::Preview);
        assert_eq!(wizard.draft(), &draft);
        assert_eq!(wizard.panel().error(), Some("NRC already registered"));
        assert!(wizard.created().is_none());
    }

    #[test]
    fn successful_create_stores_id_then_advances_one_step() {
        let mut wizard = at_preview();
        wizard.apply_intents([
            WizardIntent::Submit,
            WizardIntent::CreateFinished(Ok("ZM-000042".into())),
        ]);
        assert_eq!(wizard.step(), WizardStep::PhotoUpload);
        assert_eq!(
            wizard.created().map(|c| c.farmer_id.as_str()),
            Some("ZM-000042")
        );
        assert!(wizard.progress().is_none());

        wizard.apply_intents([WizardIntent::Back]);
        assert_eq!(wizard.step(), WizardStep::PhotoUpload);
    }

    #[test]
    fn document_step_goes_back_to_photo_and_completion_is_terminal() {
        let mut wizard = at_preview();
        wizard.apply_intents([
            WizardIntent::Submit,
            WizardIntent::CreateFinished(Ok("ZM-000042".into())),
            WizardIntent::Next,
            WizardIntent::Back,
        ]);
        assert_eq!(wizard.step(), WizardStep::PhotoUpload);

        wizard.apply_intents([WizardIntent::Next, WizardIntent::Finish, WizardIntent::Back]);
        assert_eq!(wizard.step(), WizardStep::Completion);
        let ActivePanel::Completion(done) = wizard.view().unwrap().panel else {
            panic!("expected completion panel");
        };
        assert_eq!(done.farmer_name, "Jane Mwale");
    }

    fn jpeg(name: &str) -> UploadFile {
        UploadFile {
            file_name: name.into(),
            mime: "image/jpeg".into(),
            bytes: vec![0xFF, 0xD8],
        }
    }

    #[test]
    fn uploads_survive_moving_between_photo_and_documents() {
        let mut wizard = at_preview();
        wizard.apply_intents([
            WizardIntent::Submit,
            WizardIntent::CreateFinished(Ok("ZM-000042".into())),
            WizardIntent::UploadPhoto(jpeg("jane.jpg")),
            WizardIntent::PhotoUploaded(Ok(UploadReceipt {
                stored_path: Some("uploads/ZM-000042/jane.jpg".into()),
            })),
            WizardIntent::Next,
            WizardIntent::UploadDocument {
                kind: DocumentKind::Nrc,
                file: jpeg("nrc.jpg"),
            },
            WizardIntent::DocumentUploaded {
                kind: DocumentKind::Nrc,
                file_name: "nrc.jpg".into(),
                result: Ok(UploadReceipt::default()),
            },
            WizardIntent::Back,
        ]);
        assert_eq!(wizard.step(), WizardStep::PhotoUpload);
        let ActivePanel::PhotoUpload(photo) = wizard.panel() else {
            panic!("expected photo panel");
        };
        assert!(photo.uploaded.is_some());

        wizard.apply_intents([WizardIntent::Next]);
        let ActivePanel::DocumentUpload(documents) = wizard.panel() else {
            panic!("expected document panel");
        };
        assert_eq!(documents.uploaded_kinds(), vec![&DocumentKind::Nrc]);
        assert_eq!(wizard.uploaded_documents().len(), 1);
        assert!(wizard.uploaded_photo().is_some());
    }

    #[test]
    fn back_is_refused_while_a_document_is_in_flight() {
        let mut wizard = at_preview();
        wizard.apply_intents([
            WizardIntent::Submit,
            WizardIntent::CreateFinished(Ok("ZM-000042".into())),
            WizardIntent::Next,
            WizardIntent::UploadDocument {
                kind: DocumentKind::Nrc,
                file: jpeg("nrc.jpg"),
            },
            WizardIntent::Back,
        ]);
        assert_eq!(wizard.step(), WizardStep::DocumentUpload);
        let effects = wizard.take_pending_effects();
        assert!(matches!(effects.last(), Some(WizardEffect::UploadDocument { .. })));
    }

    #[test]
    fn post_creation_steps_never_render_without_a_farmer() {
        for step in [
            WizardStep::PhotoUpload,
            WizardStep::DocumentUpload,
            WizardStep::Completion,
        ] {
            let mut wizard = RegistrationWizard::new();
            wizard.step = step;
            assert!(wizard.view().is_none(), "step {} rendered", step.number());
        }
        assert!(RegistrationWizard::new().view().is_some());
    }

    #[test]
    fn entering_an_upload_step_without_a_farmer_is_ignored() {
        let mut diagnostics = crate::runtime::diagnostics::DiagnosticsState::new();
        diagnostics.install_for_current_thread();

        for step in [
            WizardStep::PhotoUpload,
            WizardStep::DocumentUpload,
            WizardStep::Completion,
        ] {
            let mut wizard = RegistrationWizard::new();
            wizard.enter(step);
            assert_eq!(wizard.step(), WizardStep::Personal);
            assert!(matches!(wizard.panel(), ActivePanel::Personal(_)));
        }

        diagnostics.drain();
        assert_eq!(diagnostics.channel_count(CHANNEL_WIZARD_INTENT_IGNORED), 3);
        crate::runtime::diagnostics::clear_thread_sender();
    }

    #[test]
    fn late_create_result_after_success_is_ignored() {
        let mut wizard = at_preview();
        wizard.apply_intents([
            WizardIntent::Submit,
            WizardIntent::CreateFinished(Ok("ZM-1".into())),
            WizardIntent::CreateFinished(Ok("ZM-2".into())),
        ]);
        assert_eq!(wizard.created().map(|c| c.farmer_id.as_str()), Some("ZM-1"));
    }

    #[test]
    fn step_numbers_round_trip() {
        for step in WizardStep::ALL {
            assert_eq!(WizardStep::from_number(step.number()), Some(step));
        }
        assert_eq!(WizardStep::from_number(0), None);
        assert_eq!(WizardStep::from_number(8), None);
    }
}
