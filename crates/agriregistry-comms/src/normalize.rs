/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Response-shape adapter.
//!
//! The registry API is not consistent about field names (`_id` vs `id`,
//! `full_name` vs `name`, bare arrays vs `{ items: [...] }`). Every response
//! passes through one of these functions and leaves in a single canonical
//! shape; nothing past this module looks at alternate spellings.

use agriregistry_core::{
    ApiError, AuthGrant, GeoLevel, GeoOption, OperatorRecord, RoleSet, UploadReceipt, User,
};
use serde_json::Value;

const LIST_ENVELOPE_KEYS: [&str; 3] = ["items", "data", "results"];

/// First present, non-blank value among `keys`, accepting strings and numbers.
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn list_items(value: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(items) = value {
        return Some(items);
    }
    LIST_ENVELOPE_KEYS
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
}

pub fn user_from_value(value: &Value) -> Result<User, ApiError> {
    let id = string_field(value, &["id", "_id", "user_id"])
        .ok_or_else(|| ApiError::Decode("user without id".into()))?;
    let email = string_field(value, &["email"]);

    let display_name = string_field(value, &["full_name", "name", "display_name"])
        .or_else(|| {
            let first = string_field(value, &["first_name"]).unwrap_or_default();
            let last = string_field(value, &["last_name"]).unwrap_or_default();
            let joined = format!("{first} {last}").trim().to_string();
            (!joined.is_empty()).then_some(joined)
        })
        .or_else(|| email.clone())
        .unwrap_or_default();

    let roles = match value.get("roles") {
        Some(Value::Array(roles)) => RoleSet::parse(roles.iter().filter_map(Value::as_str)),
        Some(Value::String(role)) => RoleSet::single(role),
        _ => value
            .get("role")
            .and_then(Value::as_str)
            .map(RoleSet::single)
            .unwrap_or_default(),
    };

    Ok(User {
        id,
        display_name,
        email,
        roles,
    })
}

pub fn grant_from_login(value: &Value) -> Result<AuthGrant, ApiError> {
    let token = string_field(value, &["access_token", "token"])
        .ok_or_else(|| ApiError::Decode("login response without token".into()))?;
    let user = value
        .get("user")
        .ok_or_else(|| ApiError::Decode("login response without user".into()))
        .and_then(user_from_value)?;
    Ok(AuthGrant { token, user })
}

fn level_code_keys(level: GeoLevel) -> &'static [&'static str] {
    match level {
        GeoLevel::Province => &["code", "province_code", "province_id", "id", "_id"],
        GeoLevel::District => &["code", "district_code", "district_id", "id", "_id"],
        GeoLevel::Chiefdom => &["code", "chiefdom_code", "chiefdom_id", "camp_id", "id", "_id"],
    }
}

/// Entries without a code are dropped; an entry without a name shows its code.
pub fn geo_options(value: &Value, level: GeoLevel) -> Result<Vec<GeoOption>, ApiError> {
    let items = list_items(value)
        .ok_or_else(|| ApiError::Decode(format!("{} list is not an array", level.label())))?;
    Ok(items
        .iter()
        .filter_map(|item| {
            let code = string_field(item, level_code_keys(level))?;
            let name = string_field(item, &["name", "label"]).unwrap_or_else(|| code.clone());
            Some(GeoOption { code, name })
        })
        .collect())
}

pub fn created_farmer_id(value: &Value) -> Result<String, ApiError> {
    string_field(value, &["farmer_id", "id", "_id"])
        .or_else(|| value.get("data").and_then(|data| string_field(data, &["farmer_id", "id", "_id"])))
        .ok_or_else(|| ApiError::Decode("create response without farmer id".into()))
}

pub fn upload_receipt(value: &Value) -> UploadReceipt {
    UploadReceipt {
        stored_path: string_field(value, &["photo_path", "file_path", "path"]),
    }
}

pub fn operator_record(value: &Value) -> Result<OperatorRecord, ApiError> {
    let user = user_from_value(value)?;
    Ok(OperatorRecord {
        id: user.id,
        display_name: user.display_name,
        email: user.email.unwrap_or_default(),
        is_active: value
            .get("is_active")
            .and_then(Value::as_bool)
            .unwrap_or(true),
    })
}

pub fn operator_records(value: &Value) -> Result<Vec<OperatorRecord>, ApiError> {
    let items =
        list_items(value).ok_or_else(|| ApiError::Decode("operator list is not an array".into()))?;
    items.iter().map(operator_record).collect()
}

/// Human-readable message for a failed call: the server's `detail` or
/// `message` when present, otherwise the status line.
pub fn error_message(status: u16, body: Option<&Value>) -> String {
    let detail = body.and_then(|body| match body.get("detail") {
        Some(Value::String(detail)) => Some(detail.clone()),
        Some(Value::Array(errors)) => {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        },
        _ => body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    });
    detail.unwrap_or_else(|| format!("Request failed with status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_accepts_mongo_style_user() {
        let grant = grant_from_login(&json!({
            "access_token": "abc",
            "token_type": "bearer",
            "user": {"_id": "507f", "email": "admin@agri.zm", "roles": ["ADMIN"], "is_active": true}
        }))
        .unwrap();

        assert_eq!(grant.token, "abc");
        assert_eq!(grant.user.id, "507f");
        assert_eq!(grant.user.display_name, "admin@agri.zm");
        assert!(grant.user.roles.is_admin());
    }

    #[test]
    fn login_accepts_token_and_single_role_string() {
        let grant = grant_from_login(&json!({
            "token": "t",
            "user": {"id": 7, "first_name": "Chanda", "last_name": "Banda", "role": "Operator"}
        }))
        .unwrap();

        assert_eq!(grant.user.id, "7");
        assert_eq!(grant.user.display_name, "Chanda Banda");
        assert!(grant.user.roles.contains("operator"));
    }

    #[test]
    fn login_without_token_is_a_decode_error() {
        let err = grant_from_login(&json!({"user": {"id": "1"}})).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn geo_lists_accept_bare_arrays_and_envelopes() {
        let bare = geo_options(
            &json!([{"code": "P05", "name": "Lusaka"}, {"name": "no code"}]),
            GeoLevel::Province,
        )
        .unwrap();
        assert_eq!(bare, vec![GeoOption::new("P05", "Lusaka")]);

        let wrapped = geo_options(
            &json!({"items": [{"district_id": 501, "name": "Chongwe"}]}),
            GeoLevel::District,
        )
        .unwrap();
        assert_eq!(wrapped, vec![GeoOption::new("501", "Chongwe")]);
    }

    #[test]
    fn geo_list_that_is_not_a_list_is_rejected() {
        assert!(geo_options(&json!({"detail": "oops"}), GeoLevel::Chiefdom).is_err());
    }

    #[test]
    fn created_id_found_at_top_level_or_nested() {
        assert_eq!(created_farmer_id(&json!({"farmer_id": "ZM-001"})).unwrap(), "ZM-001");
        assert_eq!(created_farmer_id(&json!({"data": {"_id": "abc"}})).unwrap(), "abc");
        assert!(created_farmer_id(&json!({"ok": true})).is_err());
    }

    #[test]
    fn error_message_prefers_detail_then_message_then_status() {
        assert_eq!(
            error_message(409, Some(&json!({"detail": "NRC already registered"}))),
            "NRC already registered"
        );
        assert_eq!(
            error_message(
                422,
                Some(&json!({"detail": [{"msg": "field required"}, {"msg": "bad email"}]}))
            ),
            "field required; bad email"
        );
        assert_eq!(error_message(500, Some(&json!({"message": "boom"}))), "boom");
        assert_eq!(error_message(502, None), "Request failed with status 502");
    }

    #[test]
    fn upload_receipt_reads_either_path_key() {
        assert_eq!(
            upload_receipt(&json!({"photo_path": "/uploads/x.jpg"})).stored_path.as_deref(),
            Some("/uploads/x.jpg")
        );
        assert_eq!(upload_receipt(&json!({})).stored_path, None);
    }
}
