/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The admin-only "create operator" form.

use agriregistry_core::{ApiError, NewOperator, OperatorApi};
use log::{info, warn};

use crate::shell::routes::Route;

pub const OPERATOR_ROLE: &str = "OPERATOR";
pub const OPERATOR_REQUIRED_MESSAGE: &str = "First name, last name, email and password are required.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";
pub const OPERATOR_CREATE_FALLBACK: &str = "Failed to create operator";
pub const OPERATOR_STATUS_FALLBACK: &str = "Failed to update operator status";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperatorForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub assigned_province: String,
    pub assigned_district: String,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl OperatorForm {
    /// Validate the form and build the request body.
    pub fn submit(&self) -> Result<NewOperator, String> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.first_name)
            || blank(&self.last_name)
            || blank(&self.email)
            || self.password.is_empty()
        {
            return Err(OPERATOR_REQUIRED_MESSAGE.to_string());
        }
        if self.password != self.confirm_password {
            return Err(PASSWORD_MISMATCH_MESSAGE.to_string());
        }
        Ok(NewOperator {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password.clone(),
            role: OPERATOR_ROLE.to_string(),
            assigned_province: optional(&self.assigned_province),
            assigned_district: optional(&self.assigned_district),
        })
    }
}

/// Validate and send the form. On success the caller navigates to the
/// returned route; on failure the message is shown above the form.
pub async fn create_operator<A: OperatorApi>(api: &A, form: &OperatorForm) -> Result<Route, String> {
    let operator = form.submit()?;
    match api.create_operator(&operator).await {
        Ok(record) => {
            info!("created operator {} <{}>", record.id, record.email);
            Ok(Route::OperatorsManage)
        },
        Err(error) => {
            warn!("operator create failed: {error}");
            Err(shown_error(&error, OPERATOR_CREATE_FALLBACK))
        },
    }
}

/// Activate or deactivate an existing operator account.
pub async fn set_operator_active<A: OperatorApi>(
    api: &A,
    operator_id: &str,
    active: bool,
) -> Result<(), String> {
    let operator_id = operator_id.trim();
    if operator_id.is_empty() {
        return Err(OPERATOR_STATUS_FALLBACK.to_string());
    }
    match api.set_operator_active(operator_id, active).await {
        Ok(()) => {
            info!("operator {operator_id} active={active}");
            Ok(())
        },
        Err(error) => {
            warn!("operator {operator_id} status change failed: {error}");
            Err(shown_error(&error, OPERATOR_STATUS_FALLBACK))
        },
    }
}

fn shown_error(error: &ApiError, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
