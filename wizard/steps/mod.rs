/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-step form panels. Each panel is built from its slice of the draft and
//! hands back either a validated section patch or an inline error; none of
//! them reads another section or performs I/O.

pub mod address;
pub mod completion;
pub mod document_upload;
pub mod farm;
pub mod personal;
pub mod photo_upload;
pub mod preview;

use agriregistry_core::UploadFile;

pub use address::{AddressPanel, GeoApplyOutcome, GeoRequest, GeoRequestLedger};
pub use completion::CompletionPanel;
pub use document_upload::{DocumentUploadPanel, UploadedDocument};
pub use farm::{FarmChoiceGroup, FarmPanel, LivestockKind};
pub use personal::PersonalPanel;
pub use photo_upload::PhotoUploadPanel;
pub use preview::{PreviewPanel, PreviewRow};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Presence, type and size checks shared by the upload panels.
pub(crate) fn check_upload(file: &UploadFile, accepted: &[&str]) -> Result<(), String> {
    if file.bytes.is_empty() {
        return Err(format!("{} is empty", file.file_name));
    }
    let mime = file.mime.trim().to_ascii_lowercase();
    if !accepted.contains(&mime.as_str()) {
        return Err(format!(
            "Invalid file type ({}). Allowed: {}",
            file.mime,
            accepted.join(", ")
        ));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(format!(
            "File size exceeds the {} MB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ));
    }
    Ok(())
}

/// The panel rendered for the current step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivePanel {
    Personal(PersonalPanel),
    Address(AddressPanel),
    Farm(FarmPanel),
    Preview(PreviewPanel),
    PhotoUpload(PhotoUploadPanel),
    DocumentUpload(DocumentUploadPanel),
    Completion(CompletionPanel),
}

impl ActivePanel {
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Personal(panel) => panel.error.as_deref(),
            Self::Address(panel) => panel.error.as_deref(),
            Self::Farm(_) | Self::Completion(_) => None,
            Self::Preview(panel) => panel.error.as_deref(),
            Self::PhotoUpload(panel) => panel.error.as_deref(),
            Self::DocumentUpload(panel) => panel.error.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_and_empty_files_are_rejected() {
        let big = UploadFile {
            file_name: "scan.png".into(),
            mime: "image/png".into(),
            bytes: vec![0; MAX_UPLOAD_BYTES + 1],
        };
        assert_eq!(
            check_upload(&big, &["image/png"]).unwrap_err(),
            "File size exceeds the 10 MB limit"
        );

        let empty = UploadFile {
            file_name: "scan.png".into(),
            mime: "IMAGE/PNG".into(),
            bytes: Vec::new(),
        };
        assert!(check_upload(&empty, &["image/png"]).is_err());
    }
}
