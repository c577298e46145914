/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Port traits for the external registry API.
//!
//! The console never talks HTTP directly; hosts hand it something that
//! implements these traits (the `agriregistry-comms` client in production,
//! an in-memory fake in tests). All calls are single-shot and non-cancellable.

use std::future::Future;

use crate::error::ApiError;
use crate::geo::GeoOption;
use crate::payload::{
    DocumentKind, FarmerCreatePayload, NewOperator, OperatorRecord, UploadFile, UploadReceipt,
};
use crate::session::{AuthGrant, User};

pub trait AuthApi {
    fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> impl Future<Output = Result<AuthGrant, ApiError>> + Send;

    /// Resolve the user behind a bearer token; used to validate a restored
    /// session.
    fn me(&self, token: &str) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// Install or clear the bearer token used by subsequent calls.
    fn authorize(&self, token: Option<&str>);
}

pub trait GeoApi {
    fn provinces(&self) -> impl Future<Output = Result<Vec<GeoOption>, ApiError>> + Send;

    fn districts(
        &self,
        province_code: &str,
    ) -> impl Future<Output = Result<Vec<GeoOption>, ApiError>> + Send;

    fn chiefdoms(
        &self,
        district_code: &str,
    ) -> impl Future<Output = Result<Vec<GeoOption>, ApiError>> + Send;
}

pub trait FarmerApi {
    /// Persist a new farmer; returns the registry-assigned farmer id.
    fn create_farmer(
        &self,
        payload: &FarmerCreatePayload,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn upload_photo(
        &self,
        farmer_id: &str,
        file: &UploadFile,
    ) -> impl Future<Output = Result<UploadReceipt, ApiError>> + Send;

    fn upload_document(
        &self,
        farmer_id: &str,
        kind: &DocumentKind,
        file: &UploadFile,
    ) -> impl Future<Output = Result<UploadReceipt, ApiError>> + Send;
}

pub trait OperatorApi {
    fn list_operators(&self) -> impl Future<Output = Result<Vec<OperatorRecord>, ApiError>> + Send;

    fn create_operator(
        &self,
        operator: &NewOperator,
    ) -> impl Future<Output = Result<OperatorRecord, ApiError>> + Send;

    fn set_operator_active(
        &self,
        operator_id: &str,
        active: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Everything the registration flow needs from the API.
pub trait RegistryApi: AuthApi + GeoApi + FarmerApi {}

impl<T> RegistryApi for T where T: AuthApi + GeoApi + FarmerApi {}
