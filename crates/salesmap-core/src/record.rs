//! Domain records for the store dataset and the salesperson roster.
//!
//! The persisted JSON keeps the Korean field keys of the existing dataset, and
//! several columns arrive as either strings or numbers depending on which tool
//! last exported the file. Those columns are held as [`serde_json::Value`] and
//! normalized through accessors, so `save(load())` re-emits every field
//! byte-for-byte. Keys this crate does not model are captured by
//! `#[serde(flatten)]` and carried through unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Trim a loosely-typed source value to a string. Nulls become the empty
/// string; numbers and booleans are rendered in their JSON form.
#[must_use]
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// One retail/business location as stored in the dataset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Store display name.
    #[serde(rename = "거래처명", default)]
    pub store_name: String,

    /// Business-registration number. May be a string, a number, null, or the
    /// literal string `"null"` — all but the first two mean "absent".
    #[serde(rename = "사업자번호", default, skip_serializing_if = "Value::is_null")]
    pub business_number: Value,

    /// Registered address.
    #[serde(rename = "기본주소(사업자기준)", default)]
    pub address: String,

    /// RTM channel classification tag.
    #[serde(rename = "RTM 채널", default, skip_serializing_if = "Option::is_none")]
    pub rtm_channel: Option<String>,

    /// Latitude, as a number or numeric string.
    #[serde(rename = "위도", default, skip_serializing_if = "Value::is_null")]
    pub latitude: Value,

    /// Longitude, as a number or numeric string.
    #[serde(rename = "경도", default, skip_serializing_if = "Value::is_null")]
    pub longitude: Value,

    /// Assigned employee number; the join key against the roster.
    #[serde(rename = "담당 사번", default, skip_serializing_if = "Value::is_null")]
    pub employee_number: Value,

    /// Assigned salesperson name.
    #[serde(
        rename = "담당 영업사원",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub salesperson: Option<String>,

    /// ISO-8601 timestamp of the last edit, stamped by the editor.
    #[serde(rename = "최종수정일시", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Every key this struct does not model, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoreRecord {
    /// The assigned employee number as a trimmed string; empty when unset.
    #[must_use]
    pub fn employee_no(&self) -> String {
        normalize_value(&self.employee_number)
    }

    /// The business-registration number, when actually present. The source
    /// data uses both JSON `null` and the literal string `"null"` for absent.
    #[must_use]
    pub fn business_no(&self) -> Option<String> {
        let normalized = normalize_value(&self.business_number);
        if normalized.is_empty() || normalized == "null" {
            None
        } else {
            Some(normalized)
        }
    }

    /// The salesperson name as a trimmed string; empty when unset.
    #[must_use]
    pub fn salesperson_name(&self) -> String {
        self.salesperson
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }

    #[must_use]
    pub fn latitude_f64(&self) -> Option<f64> {
        value_as_f64(&self.latitude)
    }

    #[must_use]
    pub fn longitude_f64(&self) -> Option<f64> {
        value_as_f64(&self.longitude)
    }

    /// Whether both coordinates are present and parse to finite numbers.
    /// Records failing this are excluded from the geo-enabled working set.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude_f64().is_some() && self.longitude_f64().is_some()
    }
}

/// One roster entry: who an employee number belongs to and where they sit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalespersonRecord {
    /// Employee number; uniquely identifies a roster entry for join purposes.
    #[serde(rename = "담당 사번", default, skip_serializing_if = "Value::is_null")]
    pub employee_number: Value,

    /// Salesperson name. Not unique — see the same-name tie-break in the
    /// editor.
    #[serde(rename = "담당 영업사원", default)]
    pub name: String,

    /// Branch (지사): top-level region grouping offices.
    #[serde(rename = "지사", default)]
    pub branch: String,

    /// Office (지점): sub-unit of a branch.
    #[serde(rename = "지점", default)]
    pub office: String,

    /// Administrative district code, zero-padded to 8 chars on load.
    #[serde(rename = "ADM_CD", default, skip_serializing_if = "Value::is_null")]
    pub admin_code: Value,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SalespersonRecord {
    #[must_use]
    pub fn employee_no(&self) -> String {
        normalize_value(&self.employee_number)
    }

    #[must_use]
    pub fn name_normalized(&self) -> String {
        self.name.trim().to_string()
    }

    #[must_use]
    pub fn branch_normalized(&self) -> String {
        self.branch.trim().to_string()
    }

    #[must_use]
    pub fn office_normalized(&self) -> String {
        self.office.trim().to_string()
    }

    /// Normalize the administrative code to a fixed-width, zero-padded
    /// string. Idempotent: an already-padded code is returned unchanged.
    #[must_use]
    pub fn padded_admin_code(&self) -> String {
        pad_admin_code(&self.admin_code)
    }
}

/// Zero-pad an administrative code to 8 characters; absent codes become
/// `"00000000"`.
#[must_use]
pub fn pad_admin_code(code: &Value) -> String {
    let normalized = normalize_value(code);
    if normalized.is_empty() {
        return "0".repeat(8);
    }
    if normalized.len() >= 8 {
        return normalized;
    }
    format!("{normalized:0>8}")
}

/// A store record carrying its matched roster entry, or `None` when the
/// store's employee number has no roster match. This is also the persisted
/// record shape: store fields at the top level plus a nested `salesInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedRecord {
    #[serde(flatten)]
    pub store: StoreRecord,

    /// `null` is serialized explicitly; the dataset distinguishes "never
    /// joined" files (no key) from "joined, unmatched" records.
    #[serde(rename = "salesInfo", default)]
    pub sales_info: Option<SalespersonRecord>,
}

impl JoinedRecord {
    #[must_use]
    pub fn branch(&self) -> Option<String> {
        self.sales_info
            .as_ref()
            .map(SalespersonRecord::branch_normalized)
            .filter(|b| !b.is_empty())
    }

    #[must_use]
    pub fn office(&self) -> Option<String> {
        self.sales_info
            .as_ref()
            .map(SalespersonRecord::office_normalized)
            .filter(|o| !o.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_value_handles_null_string_and_number() {
        assert_eq!(normalize_value(&Value::Null), "");
        assert_eq!(normalize_value(&json!("  1001 ")), "1001");
        assert_eq!(normalize_value(&json!(1001)), "1001");
        assert_eq!(normalize_value(&json!(37.55)), "37.55");
    }

    #[test]
    fn business_no_treats_null_literal_as_absent() {
        let mut record: StoreRecord = serde_json::from_value(json!({
            "거래처명": "ABC Mart",
            "기본주소(사업자기준)": "1 Main St"
        }))
        .unwrap();

        record.business_number = json!("null");
        assert!(record.business_no().is_none());

        record.business_number = Value::Null;
        assert!(record.business_no().is_none());

        record.business_number = json!("");
        assert!(record.business_no().is_none());

        record.business_number = json!(1_234_567_890_i64);
        assert_eq!(record.business_no().as_deref(), Some("1234567890"));
    }

    #[test]
    fn coordinates_accept_numbers_and_numeric_strings() {
        let record: StoreRecord = serde_json::from_value(json!({
            "거래처명": "ABC Mart",
            "위도": "37.5665",
            "경도": 126.978
        }))
        .unwrap();
        assert!(record.has_valid_coordinates());
        assert!((record.latitude_f64().unwrap() - 37.5665).abs() < 1e-9);
    }

    #[test]
    fn coordinates_reject_missing_and_non_numeric() {
        let missing: StoreRecord = serde_json::from_value(json!({
            "거래처명": "ABC Mart",
            "위도": 37.5
        }))
        .unwrap();
        assert!(!missing.has_valid_coordinates());

        let garbage: StoreRecord = serde_json::from_value(json!({
            "거래처명": "ABC Mart",
            "위도": "n/a",
            "경도": "126.9"
        }))
        .unwrap();
        assert!(!garbage.has_valid_coordinates());
    }

    #[test]
    fn pad_admin_code_is_idempotent() {
        assert_eq!(pad_admin_code(&json!("1101053")), "01101053");
        assert_eq!(pad_admin_code(&json!("01101053")), "01101053");
        assert_eq!(pad_admin_code(&json!(1_101_053)), "01101053");
        assert_eq!(pad_admin_code(&Value::Null), "00000000");

        let once = pad_admin_code(&json!("42"));
        let twice = pad_admin_code(&Value::String(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_keys_round_trip_through_extra() {
        let source = json!({
            "거래처명": "ABC Mart",
            "기본주소(사업자기준)": "1 Main St",
            "시군구": "Jongno-gu",
            "담당 사번": 1001,
            "salesInfo": null
        });
        let record: JoinedRecord = serde_json::from_value(source.clone()).unwrap();
        assert_eq!(
            record.store.extra.get("시군구"),
            Some(&json!("Jongno-gu"))
        );

        let emitted = serde_json::to_value(&record).unwrap();
        assert_eq!(emitted["시군구"], json!("Jongno-gu"));
        assert_eq!(emitted["담당 사번"], json!(1001));
        assert!(emitted["salesInfo"].is_null());
    }
}
