//! Input groups declared in YAML.
//!
//! ```yaml
//! label: Basic info
//! confirm: [password, password2]
//! inputs:
//!   - { name: name, label: Your name, required: true, checks: { max_len: 6 } }
//!   - { name: age, label: Your age, type: number, checks: { min: 0 } }
//!   - { name: color, type: select, options: [red, [g, Green], {value: b, label: Blue}] }
//! ```
//!
//! Keys that are not builder parameters become extra attributes.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fs;
use std::path::Path;

use crate::error::SpecificationError;
use crate::input::{self, checks, input_group, FieldInput, InputGroup};
use crate::model::{FieldError, FieldKind};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FormDecl {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub inputs: Vec<InputDecl>,
    // Second field must repeat the first one
    #[serde(default)]
    pub confirm: Option<(String, String)>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChecksDecl {
    #[serde(default)]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub max_len: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub one_of: Option<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct InputDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    // `value: null` is an explicit null, a missing key is absent
    #[serde(default, deserialize_with = "explicit")]
    pub value: Option<JsonValue>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub readonly: Option<bool>,
    #[serde(default)]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub auto_focus: Option<bool>,
    #[serde(default)]
    pub minlength: Option<usize>,
    #[serde(default)]
    pub maxlength: Option<usize>,
    #[serde(default)]
    pub rows: Option<u32>,
    #[serde(default)]
    pub code: Option<JsonValue>,
    #[serde(default)]
    pub multiple: Option<bool>,
    #[serde(default)]
    pub inline: Option<bool>,
    #[serde(default)]
    pub accept: Option<OneOrMany>,
    #[serde(default)]
    pub options: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub buttons: Option<Vec<JsonValue>>,
    #[serde(default)]
    pub checks: Option<ChecksDecl>,
    #[serde(flatten)]
    pub attrs: JsonMap<String, JsonValue>,
}

fn default_kind() -> String {
    "text".to_string()
}

fn explicit<'de, D: Deserializer<'de>>(d: D) -> Result<Option<JsonValue>, D::Error> {
    JsonValue::deserialize(d).map(Some)
}

fn attach_checks(
    mut field: FieldInput,
    name: &str,
    c: ChecksDecl,
) -> Result<FieldInput, SpecificationError> {
    if c.min_len.is_some() || c.max_len.is_some() {
        field = field.validate(checks::length(c.min_len, c.max_len));
    }
    if let Some(pat) = c.pattern {
        let re = Regex::new(&pat).map_err(|e| SpecificationError::InvalidPattern {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        field = field.validate(checks::pattern(re));
    }
    if c.min.is_some() || c.max.is_some() {
        field = field.validate(checks::range(c.min, c.max));
    }
    if let Some(allowed) = c.one_of {
        field = field.validate(checks::one_of(allowed));
    }
    Ok(field)
}

pub fn build_input(decl: InputDecl) -> Result<FieldInput, SpecificationError> {
    let kind: FieldKind = decl.kind.parse()?;
    let label = decl.label;
    let mut field = match kind {
        FieldKind::Textarea => input::textarea(label),
        FieldKind::Text | FieldKind::Number | FieldKind::Password => input::input(label, kind)?,
        FieldKind::Select => input::select(label, decl.options.unwrap_or_default())?,
        FieldKind::Checkbox => input::checkbox(label, decl.options.unwrap_or_default())?,
        FieldKind::Radio => input::radio(label, decl.options.unwrap_or_default())?,
        FieldKind::Actions => input::actions(label, decl.buttons.unwrap_or_default())?,
        FieldKind::File => input::file_upload(label),
    };
    if let Some(name) = decl.name {
        field = field.name(name);
    }
    if let Some(v) = decl.value {
        field = field.value(v);
    }
    if let Some(v) = decl.placeholder {
        field = field.placeholder(v);
    }
    if let Some(v) = decl.required {
        field = field.required(v);
    }
    if let Some(v) = decl.readonly {
        field = field.readonly(v);
    }
    if let Some(v) = decl.disabled {
        field = field.disabled(v);
    }
    if let Some(v) = decl.help_text {
        field = field.help_text(v);
    }
    if let Some(v) = decl.auto_focus {
        field = field.auto_focus(v);
    }
    if let Some(v) = decl.minlength {
        field = field.minlength(v);
    }
    if let Some(v) = decl.maxlength {
        field = field.maxlength(v);
    }
    if let Some(v) = decl.rows {
        field = field.rows(v);
    }
    if let Some(v) = decl.code {
        field = field.code(v);
    }
    if let Some(v) = decl.multiple {
        field = field.multiple(v);
    }
    if let Some(v) = decl.inline {
        field = field.inline(v);
    }
    if let Some(v) = decl.accept {
        field = field.accept(v.into_vec());
    }
    field = field.attrs(decl.attrs);
    if let Some(c) = decl.checks {
        let name = field.spec().name.clone();
        field = attach_checks(field, &name, c)?;
    }
    Ok(field)
}

pub fn build_group(decl: FormDecl) -> Result<InputGroup, SpecificationError> {
    let inputs = decl
        .inputs
        .into_iter()
        .map(build_input)
        .collect::<Result<Vec<_>, _>>()?;
    let group = input_group(decl.label, inputs)?;
    if let Some((first, second)) = &decl.confirm {
        for name in [first, second] {
            if group.spec().field(name).is_none() {
                return Err(SpecificationError::UnknownField(name.clone()));
            }
        }
    }
    Ok(match decl.confirm {
        Some((first, second)) => group.validate(move |data| {
            if data.get(&first) == data.get(&second) {
                Ok(())
            } else {
                Err(FieldError::new(second.clone(), "Values do not match"))
            }
        }),
        None => group,
    })
}

pub fn parse_form(yaml: &str) -> Result<InputGroup> {
    let decl: FormDecl = serde_yaml::from_str(yaml).with_context(|| "parsing form declaration")?;
    let group = build_group(decl)?;
    Ok(group)
}

pub fn load_form(path: &Path) -> Result<InputGroup> {
    let s = fs::read_to_string(path).with_context(|| format!("reading form: {path:?}"))?;
    parse_form(&s).with_context(|| format!("loading form: {path:?}"))
}
