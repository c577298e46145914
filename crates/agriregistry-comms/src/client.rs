/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! HTTP client for the registry API.

use std::time::Duration;

use agriregistry_core::{
    ApiError, AuthApi, AuthGrant, DocumentKind, FarmerApi, FarmerCreatePayload, GeoApi, GeoLevel,
    GeoOption, NewOperator, OperatorApi, OperatorRecord, UploadFile, UploadReceipt, User,
};
use log::{debug, warn};
use parking_lot::RwLock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use url::Url;

use crate::normalize;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RegistryClient {
    http: Client,
    base: Url,
    bearer: RwLock<Option<String>>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base", &self.base.as_str())
            .field("authorized", &self.bearer.read().is_some())
            .finish()
    }
}

fn network_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Network("request timed out".into())
    } else {
        ApiError::Network(error.to_string())
    }
}

impl RegistryClient {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api/v1`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base =
            Url::parse(base_url.trim()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "unsupported scheme `{}`",
                base.scheme()
            )));
        }
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base,
            bearer: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    fn with_bearer(&self, request: RequestBuilder) -> RequestBuilder {
        match self.bearer.read().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and decode a JSON response, mapping non-2xx statuses to errors
    /// carrying the server's message.
    async fn send_json(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(network_error)?;
        let body = serde_json::from_slice::<Value>(&bytes).ok();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(normalize::error_message(
                status.as_u16(),
                body.as_ref(),
            )));
        }
        if !status.is_success() {
            warn!("registry api returned {status}");
            return Err(ApiError::Status {
                code: status.as_u16(),
                message: normalize::error_message(status.as_u16(), body.as_ref()),
            });
        }
        Ok(body.unwrap_or(Value::Null))
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");
        let request = self.with_bearer(self.http.get(url).query(query));
        self.send_json(request).await
    }

    async fn geo_list(
        &self,
        path: &str,
        query: &[(&str, &str)],
        level: GeoLevel,
    ) -> Result<Vec<GeoOption>, ApiError> {
        let body = self.get_json(path, query).await?;
        normalize::geo_options(&body, level)
    }

    async fn upload(&self, url: Url, file: &UploadFile) -> Result<UploadReceipt, ApiError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ApiError::Decode(format!("invalid content type: {e}")))?;
        let form = Form::new().part("file", part);
        debug!("POST {url} ({} bytes)", file.bytes.len());
        let body = self
            .send_json(self.with_bearer(self.http.post(url).multipart(form)))
            .await?;
        Ok(normalize::upload_receipt(&body))
    }
}

impl AuthApi for RegistryClient {
    async fn login(&self, identifier: &str, secret: &str) -> Result<AuthGrant, ApiError> {
        let url = self.endpoint("auth/login")?;
        let request = self
            .http
            .post(url)
            .json(&json!({ "email": identifier.trim(), "password": secret }));
        let body = self.send_json(request).await?;
        normalize::grant_from_login(&body)
    }

    async fn me(&self, token: &str) -> Result<User, ApiError> {
        let url = self.endpoint("auth/me")?;
        let body = self.send_json(self.http.get(url).bearer_auth(token)).await?;
        normalize::user_from_value(&body)
    }

    fn authorize(&self, token: Option<&str>) {
        *self.bearer.write() = token.map(str::to_string);
    }
}

impl GeoApi for RegistryClient {
    async fn provinces(&self) -> Result<Vec<GeoOption>, ApiError> {
        self.geo_list("geo/provinces", &[], GeoLevel::Province)
            .await
    }

    async fn districts(&self, province_code: &str) -> Result<Vec<GeoOption>, ApiError> {
        self.geo_list(
            "geo/districts",
            &[("province_id", province_code)],
            GeoLevel::District,
        )
        .await
    }

    async fn chiefdoms(&self, district_code: &str) -> Result<Vec<GeoOption>, ApiError> {
        self.geo_list(
            "geo/chiefdoms",
            &[("district_id", district_code)],
            GeoLevel::Chiefdom,
        )
        .await
    }
}

impl FarmerApi for RegistryClient {
    async fn create_farmer(&self, payload: &FarmerCreatePayload) -> Result<String, ApiError> {
        let url = self.endpoint("farmers/")?;
        let body = self
            .send_json(self.with_bearer(self.http.post(url).json(payload)))
            .await?;
        normalize::created_farmer_id(&body)
    }

    async fn upload_photo(
        &self,
        farmer_id: &str,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint(&format!("uploads/{farmer_id}/photo"))?;
        self.upload(url, file).await
    }

    async fn upload_document(
        &self,
        farmer_id: &str,
        kind: &DocumentKind,
        file: &UploadFile,
    ) -> Result<UploadReceipt, ApiError> {
        let mut url = self.endpoint(&format!("uploads/{farmer_id}/document"))?;
        url.query_pairs_mut()
            .append_pair("document_type", kind.wire_name());
        self.upload(url, file).await
    }
}

impl OperatorApi for RegistryClient {
    async fn list_operators(&self) -> Result<Vec<OperatorRecord>, ApiError> {
        let body = self.get_json("users/", &[]).await?;
        normalize::operator_records(&body)
    }

    async fn create_operator(&self, operator: &NewOperator) -> Result<OperatorRecord, ApiError> {
        let url = self.endpoint("users/")?;
        let full_name = format!(
            "{} {}",
            operator.first_name.trim(),
            operator.last_name.trim()
        );
        let mut body = json!({
            "email": operator.email.trim(),
            "password": operator.password,
            "full_name": full_name.trim(),
            "phone": operator.phone.trim(),
            "roles": [operator.role.trim().to_ascii_uppercase()],
        });
        if let Some(province) = operator.assigned_province.as_deref() {
            body["region"] = Value::from(province);
        }
        if let Some(district) = operator.assigned_district.as_deref() {
            body["district"] = Value::from(district);
        }
        let created = self
            .send_json(self.with_bearer(self.http.post(url).json(&body)))
            .await?;
        normalize::operator_record(&created)
    }

    async fn set_operator_active(&self, operator_id: &str, active: bool) -> Result<(), ApiError> {
        let action = if active { "activate" } else { "deactivate" };
        let url = self.endpoint(&format!("users/{operator_id}/{action}"))?;
        self.send_json(self.with_bearer(self.http.patch(url)))
            .await
            .map(|_| ())
    }
}
