//! Canonicalizes option and button lists.
//!
//! Accepted declaration shapes for each item:
//! - mapping: `{value, label, [selected], [disabled], ...}`
//! - positional: `(value, label, [selected], [disabled])`, or
//!   `(value, label, [disabled])` for buttons
//! - bare scalar: used as both value and label

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::SpecificationError;
use crate::model::{ButtonItem, OptionItem};

const OPTION_KEYS: [&str; 4] = ["value", "label", "selected", "disabled"];
const BUTTON_KEYS: [&str; 3] = ["value", "label", "disabled"];

/// One option or button as the caller wrote it.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionDecl {
    Map(JsonMap<String, JsonValue>),
    Seq(Vec<JsonValue>),
    Scalar(JsonValue),
}

impl From<JsonValue> for OptionDecl {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Object(m) => OptionDecl::Map(m),
            JsonValue::Array(a) => OptionDecl::Seq(a),
            other => OptionDecl::Scalar(other),
        }
    }
}

impl From<&str> for OptionDecl {
    fn from(s: &str) -> Self {
        OptionDecl::Scalar(JsonValue::String(s.to_string()))
    }
}

impl From<String> for OptionDecl {
    fn from(s: String) -> Self {
        OptionDecl::Scalar(JsonValue::String(s))
    }
}

impl From<i64> for OptionDecl {
    fn from(n: i64) -> Self {
        OptionDecl::Scalar(JsonValue::from(n))
    }
}

impl<V: Into<JsonValue>, L: Into<JsonValue>> From<(V, L)> for OptionDecl {
    fn from((v, l): (V, L)) -> Self {
        OptionDecl::Seq(vec![v.into(), l.into()])
    }
}

impl<V: Into<JsonValue>, L: Into<JsonValue>> From<(V, L, bool)> for OptionDecl {
    fn from((v, l, a): (V, L, bool)) -> Self {
        OptionDecl::Seq(vec![v.into(), l.into(), JsonValue::Bool(a)])
    }
}

impl<V: Into<JsonValue>, L: Into<JsonValue>> From<(V, L, bool, bool)> for OptionDecl {
    fn from((v, l, s, d): (V, L, bool, bool)) -> Self {
        OptionDecl::Seq(vec![v.into(), l.into(), JsonValue::Bool(s), JsonValue::Bool(d)])
    }
}

impl From<OptionItem> for OptionDecl {
    fn from(item: OptionItem) -> Self {
        match serde_json::to_value(item) {
            Ok(JsonValue::Object(m)) => OptionDecl::Map(m),
            _ => OptionDecl::Map(JsonMap::new()),
        }
    }
}

impl From<ButtonItem> for OptionDecl {
    fn from(item: ButtonItem) -> Self {
        match serde_json::to_value(item) {
            Ok(JsonValue::Object(m)) => OptionDecl::Map(m),
            _ => OptionDecl::Map(JsonMap::new()),
        }
    }
}

/// Label text for a scalar; strings are taken verbatim.
pub(crate) fn scalar_label(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_record(
    decl: OptionDecl,
    index: usize,
    what: &'static str,
    keys: &[&'static str],
) -> Result<JsonMap<String, JsonValue>, SpecificationError> {
    match decl {
        OptionDecl::Map(m) => {
            if m.contains_key("value") && m.contains_key("label") {
                Ok(m)
            } else {
                Err(SpecificationError::OptionMissingKey { what, index })
            }
        }
        OptionDecl::Seq(items) => {
            if items.len() < 2 || items.len() > keys.len() {
                return Err(SpecificationError::OptionArity {
                    what,
                    index,
                    len: items.len(),
                    max: keys.len(),
                });
            }
            Ok(keys
                .iter()
                .zip(items)
                .map(|(k, v)| (k.to_string(), v))
                .collect())
        }
        OptionDecl::Scalar(v) => {
            let mut m = JsonMap::new();
            m.insert("value".into(), v.clone());
            m.insert("label".into(), v);
            Ok(m)
        }
    }
}

fn take_flag(
    rec: &mut JsonMap<String, JsonValue>,
    key: &'static str,
    index: usize,
    what: &'static str,
) -> Result<Option<bool>, SpecificationError> {
    match rec.remove(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(SpecificationError::OptionFlag { what, index, key }),
    }
}

pub fn normalize_options<I, D>(decls: I) -> Result<Vec<OptionItem>, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    decls
        .into_iter()
        .enumerate()
        .map(|(index, decl)| {
            let mut rec = to_record(decl.into(), index, "options", &OPTION_KEYS)?;
            let selected = take_flag(&mut rec, "selected", index, "options")?;
            let disabled = take_flag(&mut rec, "disabled", index, "options")?;
            let value = rec.remove("value").unwrap_or(JsonValue::Null);
            let label = rec
                .remove("label")
                .map(|l| scalar_label(&l))
                .unwrap_or_default();
            Ok(OptionItem {
                value,
                label,
                selected,
                disabled,
                extra: rec,
            })
        })
        .collect()
}

pub fn normalize_buttons<I, D>(decls: I) -> Result<Vec<ButtonItem>, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    decls
        .into_iter()
        .enumerate()
        .map(|(index, decl)| {
            let mut rec = to_record(decl.into(), index, "buttons", &BUTTON_KEYS)?;
            let disabled = take_flag(&mut rec, "disabled", index, "buttons")?;
            let value = rec.remove("value").unwrap_or(JsonValue::Null);
            let label = rec
                .remove("label")
                .map(|l| scalar_label(&l))
                .unwrap_or_default();
            Ok(ButtonItem {
                value,
                label,
                disabled,
                extra: rec,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn normalizes_every_declaration_shape() {
        let opts = normalize_options(vec![
            json!({"value": "b", "label": "Blue", "selected": true}),
            json!(["g", "Green"]),
            json!(["r", "Red", false, true]),
            json!("plain"),
            json!(7),
        ])
        .unwrap();
        assert_eq!(opts.len(), 5);
        assert_eq!(opts[0].value, json!("b"));
        assert_eq!(opts[0].label, "Blue");
        assert_eq!(opts[0].selected, Some(true));
        assert_eq!(opts[1].label, "Green");
        assert_eq!(opts[1].selected, None);
        assert_eq!(opts[2].disabled, Some(true));
        assert_eq!(opts[3].value, json!("plain"));
        assert_eq!(opts[3].label, "plain");
        assert_eq!(opts[4].value, json!(7));
        assert_eq!(opts[4].label, "7");
    }

    #[test]
    fn typed_tuples_convert_like_positional_lists() {
        let opts = normalize_options(vec![
            OptionDecl::from(("a", "Alpha")),
            OptionDecl::from(("b", "Bravo", true)),
            OptionDecl::from("c"),
        ])
        .unwrap();
        assert_eq!(opts[1].selected, Some(true));
        assert_eq!(opts[2].label, "c");
    }

    #[test]
    fn mapping_without_label_is_rejected() {
        let err = normalize_options(vec![json!("ok"), json!({"value": 1})]).unwrap_err();
        assert_eq!(
            err,
            SpecificationError::OptionMissingKey {
                what: "options",
                index: 1
            }
        );
    }

    #[test]
    fn positional_arity_is_bounded() {
        assert!(matches!(
            normalize_options(vec![json!(["only"])]),
            Err(SpecificationError::OptionArity { len: 1, max: 4, .. })
        ));
        assert!(matches!(
            normalize_options(vec![json!([1, 2, true, false, 5])]),
            Err(SpecificationError::OptionArity { len: 5, .. })
        ));
        // buttons carry no `selected`, so four elements is one too many
        assert!(matches!(
            normalize_buttons(vec![json!(["v", "V", false, false])]),
            Err(SpecificationError::OptionArity { len: 4, max: 3, .. })
        ));
    }

    #[test]
    fn button_third_position_is_disabled() {
        let b = normalize_buttons(vec![json!(["cancel", "Cancel", true])]).unwrap();
        assert_eq!(b[0].disabled, Some(true));
        assert_eq!(b[0].label, "Cancel");
    }

    #[test]
    fn non_boolean_flag_is_rejected() {
        let err = normalize_options(vec![json!(["v", "V", "yes"])]).unwrap_err();
        assert!(matches!(
            err,
            SpecificationError::OptionFlag {
                key: "selected",
                ..
            }
        ));
    }

    #[test]
    fn extra_mapping_keys_pass_through() {
        let opts =
            normalize_options(vec![json!({"value": 1, "label": "one", "title": "hint"})]).unwrap();
        assert_eq!(opts[0].extra.get("title"), Some(&json!("hint")));
    }

    fn scalar() -> impl Strategy<Value = JsonValue> {
        prop_oneof![
            "[a-z]{0,8}".prop_map(JsonValue::from),
            any::<i64>().prop_map(JsonValue::from),
            any::<bool>().prop_map(JsonValue::from),
        ]
    }

    fn decl() -> impl Strategy<Value = JsonValue> {
        prop_oneof![
            scalar(),
            (scalar(), "[A-Za-z ]{1,10}").prop_map(|(v, l)| json!([v, l])),
            (scalar(), "[A-Za-z ]{1,10}", any::<bool>()).prop_map(|(v, l, s)| json!([v, l, s])),
            (scalar(), "[A-Za-z ]{1,10}", any::<bool>(), any::<bool>())
                .prop_map(|(v, l, s, d)| json!({"value": v, "label": l, "selected": s, "disabled": d})),
        ]
    }

    proptest! {
        #[test]
        fn every_shape_exposes_value_and_label(decls in proptest::collection::vec(decl(), 0..8)) {
            let opts = normalize_options(decls.clone()).unwrap();
            prop_assert_eq!(opts.len(), decls.len());
            for (d, o) in decls.iter().zip(&opts) {
                let (value, label) = match d {
                    JsonValue::Array(a) => (a[0].clone(), scalar_label(&a[1])),
                    JsonValue::Object(m) => (m["value"].clone(), scalar_label(&m["label"])),
                    other => (other.clone(), scalar_label(other)),
                };
                prop_assert_eq!(&o.value, &value);
                prop_assert_eq!(&o.label, &label);
            }
        }

        #[test]
        fn renormalizing_is_idempotent(decls in proptest::collection::vec(decl(), 0..8)) {
            let once = normalize_options(decls).unwrap();
            let twice = normalize_options(once.clone()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
