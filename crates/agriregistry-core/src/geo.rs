/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

/// One entry of a geographic select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoOption {
    pub code: String,
    pub name: String,
}

impl GeoOption {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Levels of the location hierarchy that are fetched from the geo service.
/// Villages are free text and never looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoLevel {
    Province,
    District,
    Chiefdom,
}

impl GeoLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::District => "district",
            Self::Chiefdom => "chiefdom",
        }
    }
}

/// Resolve a code to its display name within a loaded option list.
pub fn name_for_code<'a>(options: &'a [GeoOption], code: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| option.code == code)
        .map(|option| option.name.as_str())
}
