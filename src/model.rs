use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::str::FromStr;

use crate::error::SpecificationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Password,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Actions,
    File,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Password => "password",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Actions => "actions",
            FieldKind::File => "file",
        }
    }

    /// Kinds that take keyboard focus by default inside a group.
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            FieldKind::Text | FieldKind::Number | FieldKind::Password | FieldKind::Select
        )
    }
}

impl FromStr for FieldKind {
    type Err = SpecificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "text" => FieldKind::Text,
            "number" => FieldKind::Number,
            "password" => FieldKind::Password,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "actions" => FieldKind::Actions,
            "file" => FieldKind::File,
            _ => return Err(SpecificationError::UnsupportedKind(s.to_string())),
        })
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical option of a select, checkbox or radio input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionItem {
    pub value: JsonValue,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    // Keys beyond the canonical ones are passed through to the renderer
    #[serde(flatten)]
    pub extra: JsonMap<String, JsonValue>,
}

/// Canonical button of an actions input. Buttons never carry `selected`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ButtonItem {
    pub value: JsonValue,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(flatten)]
    pub extra: JsonMap<String, JsonValue>,
}

/// Immutable description of one input widget as sent to the renderer.
///
/// Every optional parameter distinguishes "absent" (`None`, left out of the
/// wire form entirely) from an explicit value. `extra` holds raw attributes
/// and is merged last, so its keys win over named parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub label: String,
    pub value: Option<JsonValue>,
    pub placeholder: Option<String>,
    pub required: Option<bool>,
    pub readonly: Option<bool>,
    pub disabled: Option<bool>,
    pub help_text: Option<String>,
    pub auto_focus: Option<bool>,
    pub minlength: Option<usize>,
    pub maxlength: Option<usize>,
    pub rows: Option<u32>,
    pub code: Option<JsonValue>,
    pub multiple: Option<bool>,
    pub inline: Option<bool>,
    pub accept: Option<Vec<String>>,
    pub options: Option<Vec<OptionItem>>,
    pub buttons: Option<Vec<ButtonItem>>,
    pub extra: JsonMap<String, JsonValue>,
}

/// Attributes that must be booleans wherever they are given.
pub const FLAG_ATTRS: [&str; 6] = [
    "required",
    "readonly",
    "disabled",
    "auto_focus",
    "multiple",
    "inline",
];

fn put<T: Serialize>(obj: &mut JsonMap<String, JsonValue>, key: &str, v: &Option<T>) {
    if let Some(v) = v {
        if let Ok(j) = serde_json::to_value(v) {
            obj.insert(key.to_string(), j);
        }
    }
}

impl FieldSpec {
    /// The merged attribute object the renderer receives.
    pub fn to_json(&self) -> JsonValue {
        let mut obj = JsonMap::new();
        obj.insert("name".into(), JsonValue::String(self.name.clone()));
        obj.insert("type".into(), JsonValue::String(self.kind.as_str().into()));
        obj.insert("label".into(), JsonValue::String(self.label.clone()));
        put(&mut obj, "value", &self.value);
        put(&mut obj, "placeholder", &self.placeholder);
        put(&mut obj, "required", &self.required);
        put(&mut obj, "readonly", &self.readonly);
        put(&mut obj, "disabled", &self.disabled);
        put(&mut obj, "help_text", &self.help_text);
        put(&mut obj, "auto_focus", &self.auto_focus);
        put(&mut obj, "minlength", &self.minlength);
        put(&mut obj, "maxlength", &self.maxlength);
        put(&mut obj, "rows", &self.rows);
        put(&mut obj, "code", &self.code);
        put(&mut obj, "multiple", &self.multiple);
        put(&mut obj, "inline", &self.inline);
        put(&mut obj, "accept", &self.accept);
        put(&mut obj, "options", &self.options);
        put(&mut obj, "buttons", &self.buttons);
        for (k, v) in &self.extra {
            obj.insert(k.clone(), v.clone());
        }
        JsonValue::Object(obj)
    }

    // Extra attributes win when boolean; null leaves the named parameter in charge.
    fn flag(&self, key: &str, named: Option<bool>) -> Option<bool> {
        match self.extra.get(key) {
            Some(JsonValue::Bool(b)) => Some(*b),
            _ => named,
        }
    }

    /// First boolean attribute given a non-boolean, non-null value in `extra`.
    pub fn invalid_flag(&self) -> Option<&'static str> {
        FLAG_ATTRS.iter().copied().find(|key| {
            !matches!(
                self.extra.get(*key),
                None | Some(JsonValue::Null) | Some(JsonValue::Bool(_))
            )
        })
    }

    /// Whether the caller said anything about auto focus, true or false.
    pub fn declares_auto_focus(&self) -> bool {
        self.auto_focus.is_some() || matches!(self.extra.get("auto_focus"), Some(JsonValue::Bool(_)))
    }

    pub fn has_auto_focus(&self) -> bool {
        self.flag("auto_focus", self.auto_focus).unwrap_or(false)
    }

    pub fn is_required(&self) -> bool {
        self.flag("required", self.required).unwrap_or(false)
    }

    pub fn is_multiple(&self) -> bool {
        self.flag("multiple", self.multiple).unwrap_or(false)
    }
}

impl Serialize for FieldSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Error annotation attached to a re-displayed form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub name: String,
    pub message: String,
}

impl FieldError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormSpec {
    pub label: String,
    pub inputs: Vec<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FieldError>,
}

impl FormSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.inputs.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldSpec> {
        self.inputs.iter_mut().find(|f| f.name == name)
    }
}

/// A decoded file upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(serialize_with = "serialize_base64")]
    pub content: Vec<u8>,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// A submitted value after its field's preprocessing transform.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    File(UploadedFile),
    Raw(JsonValue),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Raw(v) => v.as_i64(),
            FieldValue::File(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Raw(v) => v.as_str(),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            FieldValue::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Raw(JsonValue::Null))
    }
}

impl From<JsonValue> for FieldValue {
    fn from(v: JsonValue) -> Self {
        FieldValue::Raw(v)
    }
}

/// Resolved values of an input group, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    entries: Vec<(String, FieldValue)>,
}

impl FormData {
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_parameters_are_left_out_of_the_wire_form() {
        let spec = FieldSpec {
            name: "age".into(),
            kind: FieldKind::Number,
            label: "Age".into(),
            required: Some(false),
            ..Default::default()
        };
        let j = spec.to_json();
        let obj = j.as_object().unwrap();
        assert_eq!(obj.get("type"), Some(&json!("number")));
        assert_eq!(obj.get("required"), Some(&json!(false)));
        assert!(!obj.contains_key("placeholder"));
        assert!(!obj.contains_key("value"));
    }

    #[test]
    fn explicit_null_value_is_kept_apart_from_absent() {
        let spec = FieldSpec {
            name: "n".into(),
            value: Some(JsonValue::Null),
            ..Default::default()
        };
        assert_eq!(spec.to_json().get("value"), Some(&JsonValue::Null));
    }

    #[test]
    fn extra_attributes_override_named_parameters() {
        let mut extra = JsonMap::new();
        extra.insert("placeholder".into(), json!("from attrs"));
        extra.insert("autocomplete".into(), json!("off"));
        let spec = FieldSpec {
            name: "n".into(),
            placeholder: Some("named".into()),
            extra,
            ..Default::default()
        };
        let j = spec.to_json();
        assert_eq!(j["placeholder"], json!("from attrs"));
        assert_eq!(j["autocomplete"], json!("off"));
    }

    #[test]
    fn flags_consult_extra_attributes_first() {
        let mut extra = JsonMap::new();
        extra.insert("required".into(), json!(true));
        let spec = FieldSpec {
            name: "n".into(),
            required: Some(false),
            extra,
            ..Default::default()
        };
        assert!(spec.is_required());
        assert!(!spec.declares_auto_focus());
    }

    #[test]
    fn null_flag_attribute_counts_as_absent() {
        let mut extra = JsonMap::new();
        extra.insert("auto_focus".into(), JsonValue::Null);
        extra.insert("required".into(), JsonValue::Null);
        let spec = FieldSpec {
            name: "n".into(),
            required: Some(true),
            extra,
            ..Default::default()
        };
        assert!(!spec.declares_auto_focus());
        assert!(!spec.has_auto_focus());
        assert!(spec.is_required());
        assert_eq!(spec.invalid_flag(), None);
    }

    #[test]
    fn non_boolean_flag_attribute_is_reported() {
        let mut extra = JsonMap::new();
        extra.insert("required".into(), json!("false"));
        let spec = FieldSpec {
            name: "n".into(),
            extra,
            ..Default::default()
        };
        assert_eq!(spec.invalid_flag(), Some("required"));
        assert!(!spec.is_required());
    }

    #[test]
    fn kind_parses_known_names_only() {
        assert_eq!("Number".parse::<FieldKind>().unwrap(), FieldKind::Number);
        let err = "date".parse::<FieldKind>().unwrap_err();
        assert_eq!(err, SpecificationError::UnsupportedKind("date".into()));
    }

    #[test]
    fn form_data_serializes_in_declaration_order() {
        let mut data = FormData::default();
        data.insert("name", FieldValue::Raw(json!("Jo")));
        data.insert("age", FieldValue::Int(5));
        let s = serde_json::to_string(&data).unwrap();
        assert_eq!(s, r#"{"name":"Jo","age":5}"#);
    }

    #[test]
    fn uploaded_file_content_serializes_as_base64() {
        let v = FieldValue::File(UploadedFile {
            filename: "a.txt".into(),
            mime: None,
            content: b"hello".to_vec(),
        });
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"filename": "a.txt", "content": "aGVsbG8="})
        );
    }
}
