//! Registry response mapping
//!
//! The registry broker has shipped two naming schemes for the same fields
//! (e.g. `registration_status` vs `status`). The first name wins; the second
//! is the fallback.

use serde_json::{Map, Value};

use crate::types::{VehicleRecord, WOVR_NOT_LISTED};

/// Map a registry response body into a [`VehicleRecord`].
///
/// Returns `None` when the body is not a JSON object. `plate` fills in the
/// plate number when the body omits it.
pub fn map_vehicle(body: &Value, plate: &str) -> Option<VehicleRecord> {
    let obj = body.as_object()?;

    Some(VehicleRecord {
        plate: text(obj, "registration_number", "plate").unwrap_or_else(|| plate.to_string()),
        state: text(obj, "jurisdiction", "state"),
        rego_status: text(obj, "registration_status", "status"),
        rego_expiry: text(obj, "registration_expiry", "expiry"),
        make: field(obj, "make"),
        model: field(obj, "model"),
        year: year(obj),
        colour: text(obj, "colour", "color"),
        body_type: field(obj, "body_type"),
        vin: field(obj, "vin"),
        engine_number: field(obj, "engine_number"),
        stolen: obj.get("stolen_flag") == Some(&Value::Bool(true)) || is_yes(obj.get("stolen")),
        stolen_jurisdiction: field(obj, "stolen_jurisdiction"),
        stolen_date: field(obj, "stolen_date"),
        wovr_status: field(obj, "wovr_status").unwrap_or_else(|| WOVR_NOT_LISTED.to_string()),
        wovr_type: field(obj, "wovr_type"),
        ppsr_encumbered: obj.get("ppsr_encumbered") == Some(&Value::Bool(true))
            || is_yes(obj.get("ppsr")),
    })
}

/// Non-empty string value of `key`
fn field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text(obj: &Map<String, Value>, primary: &str, fallback: &str) -> Option<String> {
    field(obj, primary).or_else(|| field(obj, fallback))
}

fn is_yes(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str) == Some("Y")
}

/// Null, `""` and `0` do not count as a value, so the fallback name is tried.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Year of manufacture as an integer, a whole float or a numeric string.
/// Anything else → `None`.
fn year(obj: &Map<String, Value>) -> Option<i32> {
    let present = |key: &str| obj.get(key).filter(|v| !is_blank(v));
    let raw = present("year_of_manufacture").or_else(|| present("year"))?;

    match raw {
        Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .or_else(|| n.as_f64().and_then(whole_year)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_year))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn whole_year(y: f64) -> Option<i32> {
    let in_range = y.is_finite() && y.fract() == 0.0 && y.abs() <= f64::from(i32::MAX);
    in_range.then(|| y as i32)
}
