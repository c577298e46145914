/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory registry API and helpers shared by unit and scenario tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;

use agriregistry_core::{
    ApiError, AuthApi, AuthGrant, DocumentKind, FarmerApi, FarmerCreatePayload, GeoApi,
    GeoLevel, GeoOption, NewOperator, OperatorApi, OperatorRecord, RoleSet, UploadFile,
    UploadReceipt, User,
};
use parking_lot::Mutex;

pub const FAKE_PASSWORD: &str = "secret";
pub const FAKE_LOGIN_ERROR: &str = "Invalid email or password";
pub const FAKE_TOKEN_ERROR: &str = "Could not validate credentials";

/// One upload received by [`FakeRegistryApi`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedUpload {
    pub farmer_id: String,
    pub kind: Option<DocumentKind>,
    pub file_name: String,
    pub len: usize,
}

#[derive(Debug, Default)]
struct FakeState {
    bearer: Option<String>,
    revoked: bool,
    provinces: Vec<GeoOption>,
    districts: HashMap<String, Vec<GeoOption>>,
    chiefdoms: HashMap<String, Vec<GeoOption>>,
    geo_calls: Vec<(GeoLevel, String)>,
    create_failures: VecDeque<ApiError>,
    created: Vec<FarmerCreatePayload>,
    uploads: Vec<RecordedUpload>,
    operators: Vec<OperatorRecord>,
}

/// Registry API backed by a fixed Zambian geo table.
///
/// Any identifier signs in with [`FAKE_PASSWORD`]. Roles come from the part
/// before `@`: `admin@…` is an admin, `operator@…` an operator, anything else
/// gets no known role.
#[derive(Debug)]
pub struct FakeRegistryApi {
    state: Mutex<FakeState>,
}

impl Default for FakeRegistryApi {
    fn default() -> Self {
        Self::new()
    }
}

fn options(pairs: &[(&str, &str)]) -> Vec<GeoOption> {
    pairs
        .iter()
        .map(|(code, name)| GeoOption::new(*code, *name))
        .collect()
}

fn user_for(identifier: &str) -> User {
    let local = identifier.split('@').next().unwrap_or_default();
    let roles = match local.to_ascii_lowercase().as_str() {
        "admin" => RoleSet::single("ADMIN"),
        "operator" => RoleSet::single("OPERATOR"),
        other => RoleSet::single(other),
    };
    User {
        id: format!("user-{local}"),
        display_name: local.to_string(),
        email: Some(identifier.to_string()),
        roles,
    }
}

impl FakeRegistryApi {
    pub fn new() -> Self {
        let state = FakeState {
            provinces: options(&[("P05", "Lusaka"), ("P02", "Central")]),
            districts: HashMap::from([
                (
                    "P05".to_string(),
                    options(&[("D0501", "Lusaka"), ("D0502", "Chongwe")]),
                ),
                ("P02".to_string(), options(&[("D0201", "Kabwe")])),
            ]),
            chiefdoms: HashMap::from([(
                "D0502".to_string(),
                options(&[("C050201", "Bundabunda"), ("C050202", "Nkomeshya")]),
            )]),
            ..FakeState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Bearer token most recently installed through [`AuthApi::authorize`].
    pub fn bearer(&self) -> Option<String> {
        self.state.lock().bearer.clone()
    }

    /// Make every previously issued token fail `me`.
    pub fn revoke_tokens(&self) {
        self.state.lock().revoked = true;
    }

    /// The next create call fails with a 400 carrying `message`.
    pub fn fail_next_create(&self, message: &str) {
        self.state.lock().create_failures.push_back(ApiError::Status {
            code: 400,
            message: message.to_string(),
        });
    }

    pub fn created(&self) -> Vec<FarmerCreatePayload> {
        self.state.lock().created.clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.state.lock().uploads.clone()
    }

    pub fn geo_calls(&self) -> Vec<(GeoLevel, String)> {
        self.state.lock().geo_calls.clone()
    }

    fn geo(&self, level: GeoLevel, parent: &str) -> Vec<GeoOption> {
        let mut state = self.state.lock();
        state.geo_calls.push((level, parent.to_string()));
        let table = match level {
            GeoLevel::Province => return state.provinces.clone(),
            GeoLevel::District => &state.districts,
            GeoLevel::Chiefdom => &state.chiefdoms,
        };
        table.get(parent).cloned().unwrap_or_default()
    }

    fn record_upload(&self, farmer_id: &str, kind: Option<&DocumentKind>, file: &UploadFile) -> UploadReceipt {
        let mut state = self.state.lock();
        state.uploads.push(RecordedUpload {
            farmer_id: farmer_id.to_string(),
            kind: kind.cloned(),
            file_name: file.file_name.clone(),
            len: file.bytes.len(),
        });
        UploadReceipt {
            stored_path: Some(format!("uploads/{farmer_id}/{}", file.file_name)),
        }
    }
}

impl AuthApi for FakeRegistryApi {
    async fn login(&self, identifier: &str, secret: &str) -> Result<AuthGrant, ApiError> {
        if secret != FAKE_PASSWORD {
            return Err(ApiError::Unauthorized(FAKE_LOGIN_ERROR.to_string()));
        }
        Ok(AuthGrant {
            token: format!("token-{identifier}"),
            user: user_for(identifier),
        })
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        let revoked = self.state.lock().revoked;
        match token.strip_prefix("token-") {
            Some(identifier) if !revoked => Ok(user_for(identifier)),
            _ => Err(ApiError::Unauthorized(FAKE_TOKEN_ERROR.to_string())),
        }
    }

    fn authorize(&self, token: Option<&str>) {
        self.state.lock().bearer = token.map(str::to_string);
    }
}

impl GeoApi for FakeRegistryApi {
    async fn provinces(&self) -> Result<Vec<GeoOption>, ApiError> {
        Ok(self.geo(GeoLevel::Province, ""))
    }

    async fn districts(&self, province_code: &str) -> Result<Vec<GeoOption>, ApiError> {
        Ok(self.geo(GeoLevel::District, province_code))
    }

    async fn chiefdoms(&self, district_code: &str) -> Result<Vec<GeoOption>, ApiError> {
        Ok(self.geo(GeoLevel::Chiefdom, district_code))
    }
}

impl FarmerApi for FakeRegistryApi {
    async fn create_farmer(&self, payload: &FarmerCreatePayload) -> Result<String, ApiError> {
        let mut state = self.state.lock();
        if let Some(error) = state.create_failures.pop_front() {
            return Err(error);
        }
        state.created.push(payload.clone());
        Ok(format!("ZM-{:06}", state.created.len()))
    }

    async fn upload_photo(&self, farmer_id: &str, file: &UploadFile) -> Result<UploadReceipt, ApiError> {
        Ok(self.record_upload(farmer_id, None, file))
    }

    async fn upload_document(
        &self,
        farmer_id: &str,
        kind: &DocumentKind,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        Ok(self.record_upload(farmer_id, Some(kind), file))
    }
}

impl OperatorApi for FakeRegistryApi {
    async fn list_operators(&self) -> Result<Vec<OperatorRecord>, ApiError> {
        Ok(self.state.lock().operators.clone())
    }

    async fn create_operator(&self, operator: &NewOperator) -> Result<OperatorRecord, ApiError> {
        let mut state = self.state.lock();
        if state.operators.iter().any(|op| op.email == operator.email) {
            return Err(ApiError::Status {
                code: 400,
                message: "Email already registered".to_string(),
            });
        }
        let record = OperatorRecord {
            id: format!("op-{}", state.operators.len() + 1),
            display_name: format!("{} {}", operator.first_name, operator.last_name),
            email: operator.email.clone(),
            is_active: true,
        };
        state.operators.push(record.clone());
        Ok(record)
    }

    async fn set_operator_active(&self, operator_id: &str, active: bool) -> Result<(), ApiError> {
        let mut state = self.state.lock();
        let Some(record) = state.operators.iter_mut().find(|op| op.id == operator_id) else {
            return Err(ApiError::Status {
                code: 404,
                message: "User not found".to_string(),
            });
        };
        record.is_active = active;
        Ok(())
    }
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map(|runtime| runtime.block_on(future))
        .unwrap_or_else(|error| panic!("test runtime failed to start: {error}"))
}

/// Shorthand for a small in-memory upload.
pub fn upload_file(file_name: &str, mime: &str) -> UploadFile {
    UploadFile {
        file_name: file_name.to_string(),
        mime: mime.to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}
