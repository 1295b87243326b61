//! Reusable field validators for the common constraints.

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::model::FieldValue;

pub fn length(
    min: Option<usize>,
    max: Option<usize>,
) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static {
    move |v: &FieldValue| {
        let Some(s) = v.as_str() else {
            return Ok(());
        };
        let n = s.trim().chars().count();
        if let Some(minl) = min {
            if n < minl {
                return Err(format!("Must be at least {minl} characters"));
            }
        }
        if let Some(maxl) = max {
            if n > maxl {
                return Err(format!("Must be at most {maxl} characters"));
            }
        }
        Ok(())
    }
}

/// Empty strings pass; pair with `required` to forbid them.
pub fn pattern(re: Regex) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static {
    move |v: &FieldValue| match v.as_str() {
        Some(s) if !s.trim().is_empty() && !re.is_match(s.trim()) => {
            Err("Does not match required pattern".into())
        }
        _ => Ok(()),
    }
}

pub fn range(
    min: Option<i64>,
    max: Option<i64>,
) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static {
    move |v: &FieldValue| {
        let Some(n) = v.as_i64() else {
            return Ok(());
        };
        if let Some(m) = min {
            if n < m {
                return Err(format!("Must be >= {m}"));
            }
        }
        if let Some(m) = max {
            if n > m {
                return Err(format!("Must be <= {m}"));
            }
        }
        Ok(())
    }
}

/// Membership check for choice inputs. Lists (multi-select, checkbox) must
/// contain only allowed values.
pub fn one_of(
    allowed: Vec<JsonValue>,
) -> impl Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static {
    move |v: &FieldValue| {
        let ok = match v {
            FieldValue::Raw(JsonValue::Null) => true,
            FieldValue::Raw(JsonValue::Array(items)) => items.iter().all(|i| allowed.contains(i)),
            FieldValue::Raw(other) => allowed.contains(other),
            FieldValue::Int(n) => allowed.contains(&JsonValue::from(*n)),
            FieldValue::File(_) => true,
        };
        if ok {
            Ok(())
        } else {
            Err("Not one of the offered options".into())
        }
    }
}
