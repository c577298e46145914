/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Step 5: optional farmer photo, addressed by the created id.

use agriregistry_core::{ApiError, CreatedFarmer, UploadFile, UploadReceipt};

use super::check_upload;

pub const PHOTO_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoUploadPanel {
    pub farmer_id: String,
    pub uploading: bool,
    pub uploaded: Option<UploadReceipt>,
    pub error: Option<String>,
}

impl PhotoUploadPanel {
    /// Reopen the step, keeping a photo accepted on an earlier visit.
    pub fn open(created: &CreatedFarmer, uploaded: Option<UploadReceipt>) -> Self {
        Self {
            farmer_id: created.farmer_id.clone(),
            uploading: false,
            uploaded,
            error: None,
        }
    }

    /// Validate and claim the upload slot. `None` when a file is already in
    /// flight or the file is rejected (with `error` set).
    pub fn begin_upload(&mut self, file: &UploadFile) -> Option<()> {
        if self.uploading {
            return None;
        }
        if let Err(message) = check_upload(file, &PHOTO_MIME_TYPES) {
            self.error = Some(message);
            return None;
        }
        self.uploading = true;
        self.error = None;
        Some(())
    }

    pub fn finish(&mut self, result: Result<UploadReceipt, ApiError>) {
        self.uploading = false;
        match result {
            Ok(receipt) => self.uploaded = Some(receipt),
            Err(error) => self.error = Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> CreatedFarmer {
        CreatedFarmer {
            farmer_id: "ZM-000001".into(),
            display_name: "Jane Mwale".into(),
        }
    }

    fn file(mime: &str, len: usize) -> UploadFile {
        UploadFile {
            file_name: "jane.jpg".into(),
            mime: mime.into(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn pdf_is_not_a_photo() {
        let mut panel = PhotoUploadPanel::open(&created(), None);
        assert!(panel.begin_upload(&file("application/pdf", 10)).is_none());
        assert!(panel.error.is_some());
        assert!(!panel.uploading);
    }

    #[test]
    fn failed_upload_can_be_retried() {
        let mut panel = PhotoUploadPanel::open(&created(), None);
        assert!(panel.begin_upload(&file("image/jpeg", 10)).is_some());
        assert!(panel.begin_upload(&file("image/jpeg", 10)).is_none());

        panel.finish(Err(ApiError::Network("reset".into())));
        assert_eq!(panel.error.as_deref(), Some("Network error: reset"));

        assert!(panel.begin_upload(&file("image/png", 10)).is_some());
        panel.finish(Ok(UploadReceipt {
            stored_path: Some("/uploads/ZM-000001.png".into()),
        }));
        assert!(panel.uploaded.is_some());
        assert_eq!(panel.error, None);
    }
}
