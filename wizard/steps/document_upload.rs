/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 6: supporting documents, one upload per kind at a time.

use agriregistry_core::{ApiError, CreatedFarmer, DocumentKind, UploadFile, UploadReceipt};

use super::check_upload;

pub const DOCUMENT_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedDocument {
    pub kind: DocumentKind,
    pub file_name: String,
    pub receipt: UploadReceipt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUploadPanel {
    pub farmer_id: String,
    pub in_flight: Vec<DocumentKind>,
    pub uploaded: Vec<UploadedDocument>,
    pub error: Option<String>,
}

impl DocumentUploadPanel {
    pub fn open(created: &CreatedFarmer, uploaded: Vec<UploadedDocument>) -> Self {
        Self {
            farmer_id: created.farmer_id.clone(),
            in_flight: Vec::new(),
            uploaded,
            error: None,
        }
    }

    pub fn is_uploading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn begin_upload(&mut self, kind: &DocumentKind, file: &UploadFile) -> Option<()> {
        if self.in_flight.contains(kind) {
            return None;
        }
        if let Err(message) = check_upload(file, &DOCUMENT_MIME_TYPES) {
            self.error = Some(message);
            return None;
        }
        self.in_flight.push(kind.clone());
        self.error = None;
        Some(())
    }

    /// Record the outcome. A re-upload of the same kind replaces the earlier
    /// entry.
    pub fn finish(
        &mut self,
        kind: DocumentKind,
        file_name: String,
        result: Result<UploadReceipt, ApiError>,
    ) {
        self.in_flight.retain(|pending| *pending != kind);
        match result {
            Ok(receipt) => {
                self.uploaded.retain(|doc| doc.kind != kind);
                self.uploaded.push(UploadedDocument {
                    kind,
                    file_name,
                    receipt,
                });
            },
            Err(error) => self.error = Some(format!("{kind}: {error}")),
        }
    }

    pub fn uploaded_kinds(&self) -> Vec<&DocumentKind> {
        self.uploaded.iter().map(|doc| &doc.kind).collect()
    }
}
