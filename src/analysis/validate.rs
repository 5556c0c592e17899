use serde_json::Value;

use crate::models::Category;

/// Coerces a raw score into a number. Numeric values pass through; strings
/// yield the first signed decimal found in them ("7.5/10" scores as 7.5).
/// Anything else is NaN.
pub fn normalize_score(raw: &Value) -> f64 {
    match raw {
        Value::Number(number) => number.as_f64().filter(|v| v.is_finite()).unwrap_or(f64::NAN),
        Value::String(text) => extract_decimal(text).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn extract_decimal(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let at_digit = bytes[i].is_ascii_digit();
        let at_signed = bytes[i] == b'-'
            && bytes.get(i + 1).map(|b| b.is_ascii_digit()).unwrap_or(false);
        if !at_digit && !at_signed {
            i += 1;
            continue;
        }

        let start = i;
        if at_signed {
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        // Fractional part only counts when digits follow the dot.
        if i < bytes.len()
            && bytes[i] == b'.'
            && bytes.get(i + 1).map(|b| b.is_ascii_digit()).unwrap_or(false)
        {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        return text[start..i].parse().ok();
    }
    None
}

/// Structural validation of a raw analysis payload. Each required category's
/// score is coerced in place to its normalized numeric form; the payload is
/// rejected if any category is missing, non-numeric, or outside [0, 10].
///
/// A `false` here is a fatal per-frame error, handled the same way as a
/// transport failure and never retried for this frame.
pub fn validate(analysis: &mut Value) -> bool {
    if !analysis.is_object() {
        return false;
    }

    Category::ALL.iter().all(|category| {
        let score = analysis
            .get(category.as_str())
            .and_then(|entry| entry.get("score"))
            .map(normalize_score)
            .unwrap_or(f64::NAN);

        if score.is_finite() {
            if let Some(entry) = analysis
                .get_mut(category.as_str())
                .and_then(Value::as_object_mut)
            {
                if let Some(number) = serde_json::Number::from_f64(score) {
                    entry.insert("score".to_string(), Value::Number(number));
                }
            }
        }

        score.is_finite() && (0.0..=10.0).contains(&score)
    })
}
