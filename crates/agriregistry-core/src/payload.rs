/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Request bodies sent to the registry API.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::draft::{FarmSection, WizardDraft};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfoPayload {
    pub first_name: String,
    pub last_name: String,
    pub phone_primary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
}

/// Names go in the plain fields, codes in the `_code` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPayload {
    pub province: String,
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chiefdom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    pub province_code: String,
    pub district_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chiefdom_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerCreatePayload {
    pub personal_info: PersonalInfoPayload,
    pub address: AddressPayload,
    pub farm: FarmSection,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl FarmerCreatePayload {
    pub fn from_draft(draft: &WizardDraft) -> Self {
        let personal = &draft.personal;
        let address = &draft.address;
        Self {
            personal_info: PersonalInfoPayload {
                first_name: personal.first_name.trim().to_string(),
                last_name: personal.last_name.trim().to_string(),
                phone_primary: personal.phone_primary.trim().to_string(),
                nrc: non_blank(&personal.nrc),
                date_of_birth: non_blank(&personal.date_of_birth),
                gender: non_blank(&personal.gender),
                marital_status: non_blank(&personal.marital_status),
                education_level: non_blank(&personal.education_level),
            },
            address: AddressPayload {
                province: address.province_name.clone(),
                district: address.district_name.clone(),
                chiefdom: non_blank(&address.chiefdom_name),
                village: non_blank(&address.village),
                province_code: address.province_code.clone(),
                district_code: address.district_code.clone(),
                chiefdom_code: non_blank(&address.chiefdom_code),
            },
            farm: draft.farm.clone(),
        }
    }
}

/// Supporting documents accepted by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKind {
    Nrc,
    Certificate,
    LandTitle,
    Other(String),
}

impl DocumentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "" => None,
            "nrc" => Some(Self::Nrc),
            "certificate" => Some(Self::Certificate),
            "land_title" | "title_deed" => Some(Self::LandTitle),
            _ => Some(Self::Other(normalized)),
        }
    }

    /// Value of the `document_type` query parameter.
    pub fn wire_name(&self) -> &str {
        match self {
            Self::Nrc => "nrc",
            Self::Certificate => "certificate",
            Self::LandTitle => "land_title",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A file picked for upload, already read into memory.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub stored_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOperator {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_district: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub is_active: bool,
}
