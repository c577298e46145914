/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Domain types shared by the console shell and the API client: roles,
//! sessions, the registration draft, geo options, request payloads and the
//! port traits for the external registry API.

pub mod draft;
pub mod error;
pub mod geo;
pub mod payload;
pub mod ports;
pub mod roles;
pub mod session;

pub use draft::{
    AddressPatch, AddressSection, CreatedFarmer, FarmPatch, FarmSection, Livestock,
    PersonalPatch, PersonalSection, SectionPatch, WizardDraft,
};
pub use error::ApiError;
pub use geo::{GeoLevel, GeoOption};
pub use payload::{
    DocumentKind, FarmerCreatePayload, NewOperator, OperatorRecord, UploadFile, UploadReceipt,
};
pub use ports::{AuthApi, FarmerApi, GeoApi, OperatorApi, RegistryApi};
pub use roles::{ROLE_ADMIN, ROLE_OPERATOR, RoleSet, RoleTag, normalize_role};
pub use session::{AuthGrant, Session, User};
