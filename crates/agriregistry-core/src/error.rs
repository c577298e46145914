/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;

/// Failure of a call to the external registry API.
///
/// `Display` yields the text shown inline next to the form that issued the
/// call, so server-provided detail is passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InvalidUrl(String),
    Network(String),
    Unauthorized(String),
    Status { code: u16, message: String },
    Decode(String),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(e) => write!(f, "Invalid API address: {e}"),
            Self::Network(e) => write!(f, "Network error: {e}"),
            Self::Unauthorized(message) => f.write_str(message),
            Self::Status { message, .. } => f.write_str(message),
            Self::Decode(e) => write!(f, "Unexpected response from server: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}
