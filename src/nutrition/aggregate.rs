//! Turns stored completion texts into totals and display-ready entries.
//!
//! Stored results come from an external model and are treated as untrusted:
//! a record that does not parse is logged and skipped, never fatal.

use serde::Serialize;
use serde_json::{Map, Value};
use time::{macros::format_description, Duration, OffsetDateTime, UtcOffset};
use tracing::warn;

use super::repo_types::HistoryRecord;

/// Keys every complete estimate carries, each as `{value, unit}`.
pub const MACRO_KEYS: [&str; 6] = [
    "calories",
    "protein",
    "carbohydrates",
    "fats",
    "sugars",
    "fibre",
];

pub const RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub calories: i64,
    pub protein: i64,
    pub carbohydrates: i64,
    pub fats: i64,
    pub sugars: i64,
    pub fibre: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEntry {
    pub food_name: String,
    pub timestamp: String,
    pub calories: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DaySummary {
    pub totals: Totals,
    /// Records that reported calories.
    pub total_count: usize,
    pub recent_entries: Vec<RecentEntry>,
}

/// Start and end (exclusive) of the calendar day containing `now` at `offset`.
pub fn day_bounds(now: OffsetDateTime, offset: UtcOffset) -> (OffsetDateTime, OffsetDateTime) {
    let start = now.to_offset(offset).date().midnight().assume_offset(offset);
    (start, start + Duration::days(1))
}

/// Parses a stored result; anything but a JSON object is rejected.
pub fn parse_result(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(_) => None,
    }
}

/// `data[key].value` as a number, zero when missing or not numeric.
pub fn macro_value(data: &Map<String, Value>, key: &str) -> f64 {
    data.get(key)
        .and_then(|v| v.get("value"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// Every macro key that is present holds an object.
fn macros_well_formed(data: &Map<String, Value>) -> bool {
    MACRO_KEYS
        .iter()
        .filter_map(|key| data.get(*key))
        .all(Value::is_object)
}

pub fn format_timestamp(at: OffsetDateTime, offset: UtcOffset) -> String {
    at.to_offset(offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_default()
}

pub fn summarize_day(records: &[HistoryRecord], offset: UtcOffset) -> DaySummary {
    let mut ordered: Vec<&HistoryRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut sums = [0.0_f64; MACRO_KEYS.len()];
    let mut total_count = 0;
    let mut recent_entries = Vec::new();

    for record in ordered {
        let Some(data) = parse_result(&record.nutrition_result) else {
            warn!(record_id = %record.id, "skipping unparsable nutrition result");
            continue;
        };
        if !macros_well_formed(&data) {
            warn!(record_id = %record.id, "skipping nutrition result with malformed macros");
            continue;
        }
        for (sum, key) in sums.iter_mut().zip(MACRO_KEYS) {
            *sum += macro_value(&data, key);
        }
        if data.contains_key("calories") {
            total_count += 1;
            if recent_entries.len() < RECENT_LIMIT {
                recent_entries.push(RecentEntry {
                    food_name: record.food_name.clone(),
                    timestamp: format_timestamp(record.created_at, offset),
                    calories: macro_value(&data, "calories"),
                });
            }
        }
    }

    let [calories, protein, carbohydrates, fats, sugars, fibre] = sums.map(|s| s.round() as i64);
    DaySummary {
        totals: Totals {
            calories,
            protein,
            carbohydrates,
            fats,
            sugars,
            fibre,
        },
        total_count,
        recent_entries,
    }
}

/// All-time calorie sum for the profile page.
pub fn total_calories(records: &[HistoryRecord]) -> f64 {
    records
        .iter()
        .filter_map(|r| parse_result(&r.nutrition_result))
        .map(|data| macro_value(&data, "calories"))
        .sum()
}

/// `[{name, value, unit}, ..]` becomes `{name: {value, unit}, ..}`.
/// Anything else is returned as is.
/// List items without a string `name` are dropped.
pub fn reshape_named_values(value: Value) -> Value {
    let Value::Array(items) = value else {
        return value;
    };
    let mut out = Map::new();
    for item in items {
        let Some(name) = item.get("name").and_then(Value::as_str) else {
            continue;
        };
        let mut entry = Map::new();
        entry.insert("value".into(), item.get("value").cloned().unwrap_or(Value::Null));
        entry.insert("unit".into(), item.get("unit").cloned().unwrap_or(Value::Null));
        out.insert(name.to_string(), Value::Object(entry));
    }
    Value::Object(out)
}

/// Parsed and reshaped result for the history view, or `None` unless all macro keys are present.
pub fn display_result(raw: &str) -> Option<Value> {
    let mut data = parse_result(raw)?;
    if !MACRO_KEYS.iter().all(|k| data.contains_key(*k)) {
        return None;
    }
    for key in ["vitamins", "minerals"] {
        if let Some(v) = data.remove(key) {
            data.insert(key.to_string(), reshape_named_values(v));
        }
    }
    Some(Value::Object(data))
}
