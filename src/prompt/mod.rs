use serde_json::Value;

use crate::wire::Prompt;

/// Normalize every element of a raw prompt array.
pub fn normalize_all(raw: &[Value]) -> Vec<Prompt> {
    raw.iter().map(normalize).collect()
}

/// Turn one backend record into a canonical `Prompt`.
///
/// Accepts both the current payload (`delta`, `choices` as array) and the
/// legacy admin shape (`price_delta_cents`, `choices_csv` as a `;` list).
/// Never fails: anything malformed falls back to an empty name, `single`
/// kind, zero delta and no choices.
pub fn normalize(raw: &Value) -> Prompt {
    let name = raw.get("name").map(coerce_string).unwrap_or_default().trim().to_string();

    let kind = match raw.get("kind") {
        None | Some(Value::Null) => "single".to_string(),
        Some(v) => coerce_string(v).trim().to_lowercase(),
    };

    let required = raw.get("required").map(truthy).unwrap_or(false);

    let delta = match raw.get("delta") {
        Some(v) if !v.is_null() => cents_from_value(v),
        _ => raw.get("price_delta_cents").map(cents_from_value).unwrap_or(0),
    };

    Prompt { name, kind, required, delta, choices: choices_of(raw) }
}

fn choices_of(raw: &Value) -> Vec<String> {
    if let Some(Value::Array(items)) = raw.get("choices") {
        return items
            .iter()
            .map(|c| coerce_string(c).trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
    }
    let csv = match (raw.get("choices"), raw.get("choices_csv")) {
        (Some(Value::String(s)), _) => s.as_str(),
        (_, Some(Value::String(s))) => s.as_str(),
        _ => return Vec::new(),
    };
    split_choices(csv)
}

/// `"S; M ;;L"` -> `["S", "M", "L"]`
pub fn split_choices(csv: &str) -> Vec<String> {
    csv.split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Leading-integer parse: optional sign then base-10 digits, trailing junk
/// ignored. No digits means 0.
pub fn parse_cents(s: &str) -> i64 {
    let t = s.trim_start();
    let (neg, digits) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        n = n.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if neg { -n } else { n }
}

fn cents_from_value(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_cents(s),
        _ => 0,
    }
}

fn coerce_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
