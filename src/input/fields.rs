//! Per-widget constructors. Each returns a [`FieldInput`]: the field's
//! specification, its preprocessing transform and its validator, not yet
//! shown to anyone. Pass it to [`crate::input::input_group`] or suspend on it
//! directly with [`crate::protocol::session::Session::input`].

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::SpecificationError;
use crate::input::options::{normalize_buttons, normalize_options, OptionDecl};
use crate::input::preprocess::Preprocess;
use crate::model::{FieldKind, FieldSpec, FieldValue};

pub type FieldValidator = Box<dyn Fn(&FieldValue) -> Result<(), String> + Send + Sync>;

/// Name used when the caller does not give one.
pub const DEFAULT_NAME: &str = "data";

pub struct FieldInput {
    pub(crate) spec: FieldSpec,
    pub(crate) preprocess: Preprocess,
    pub(crate) validator: Option<FieldValidator>,
}

impl std::fmt::Debug for FieldInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldInput")
            .field("spec", &self.spec)
            .field("preprocess", &self.preprocess)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl FieldInput {
    fn new(kind: FieldKind, label: impl Into<String>, preprocess: Preprocess) -> Self {
        Self {
            spec: FieldSpec {
                name: DEFAULT_NAME.to_string(),
                kind,
                label: label.into(),
                ..Default::default()
            },
            preprocess,
            validator: None,
        }
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn preprocess(&self) -> Preprocess {
        self.preprocess
    }

    /// Run the attached validator; no validator means always valid.
    pub fn validate_value(&self, value: &FieldValue) -> Result<(), String> {
        match &self.validator {
            Some(check) => check(value),
            None => Ok(()),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec.name = name.into();
        self
    }

    /// Initial value. `JsonValue::Null` is kept as an explicit null.
    pub fn value(mut self, value: impl Into<JsonValue>) -> Self {
        self.spec.value = Some(value.into());
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.spec.placeholder = Some(text.into());
        self
    }

    pub fn required(mut self, on: bool) -> Self {
        self.spec.required = Some(on);
        self
    }

    pub fn readonly(mut self, on: bool) -> Self {
        self.spec.readonly = Some(on);
        self
    }

    pub fn disabled(mut self, on: bool) -> Self {
        self.spec.disabled = Some(on);
        self
    }

    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.spec.help_text = Some(text.into());
        self
    }

    pub fn auto_focus(mut self, on: bool) -> Self {
        self.spec.auto_focus = Some(on);
        self
    }

    pub fn minlength(mut self, n: usize) -> Self {
        self.spec.minlength = Some(n);
        self
    }

    pub fn maxlength(mut self, n: usize) -> Self {
        self.spec.maxlength = Some(n);
        self
    }

    pub fn rows(mut self, n: u32) -> Self {
        self.spec.rows = Some(n);
        self
    }

    /// Code-editor styling for a textarea, e.g. `{"mode": "python"}`.
    pub fn code(mut self, config: JsonValue) -> Self {
        self.spec.code = Some(config);
        self
    }

    pub fn multiple(mut self, on: bool) -> Self {
        self.spec.multiple = Some(on);
        self
    }

    pub fn inline(mut self, on: bool) -> Self {
        self.spec.inline = Some(on);
        self
    }

    /// Accepted file types: extensions like `.png` or MIME types like `image/*`.
    pub fn accept<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.accept = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Raw attribute merged over the named parameters.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.spec.extra.insert(key.into(), value.into());
        self
    }

    pub fn attrs(mut self, attrs: JsonMap<String, JsonValue>) -> Self {
        self.spec.extra.extend(attrs);
        self
    }

    /// Attach a validator. A second call chains after the first one.
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&FieldValue) -> Result<(), String> + Send + Sync + 'static,
    {
        let chained: FieldValidator = match self.validator.take() {
            None => Box::new(check),
            Some(prev) => Box::new(move |v: &FieldValue| {
                prev(v)?;
                check(v)
            }),
        };
        self.validator = Some(chained);
        self
    }

    /// Declaration checks that depend on the full set of parameters.
    pub fn check(&self) -> Result<(), SpecificationError> {
        if self.spec.name.trim().is_empty() {
            return Err(SpecificationError::MissingName);
        }
        if let Some(key) = self.spec.invalid_flag() {
            return Err(SpecificationError::AttrFlag {
                name: self.spec.name.clone(),
                key: key.to_string(),
            });
        }
        let single_choice = matches!(self.spec.kind, FieldKind::Radio)
            || (self.spec.kind == FieldKind::Select && !self.spec.is_multiple());
        if single_choice {
            let picked = self
                .spec
                .options
                .iter()
                .flatten()
                .filter(|o| o.selected == Some(true))
                .count();
            if picked > 1 {
                return Err(SpecificationError::MultipleSelected(self.spec.name.clone()));
            }
        }
        Ok(())
    }
}

/// Text-like input. Only `Text`, `Number`, `Password` and `Textarea` are
/// allowed here; choice widgets have their own constructors.
pub fn input(label: impl Into<String>, kind: FieldKind) -> Result<FieldInput, SpecificationError> {
    let preprocess = match kind {
        FieldKind::Number => Preprocess::Integer,
        FieldKind::Textarea => return Ok(textarea(label)),
        FieldKind::Text | FieldKind::Password => Preprocess::Text,
        other => return Err(SpecificationError::UnsupportedKind(other.to_string())),
    };
    Ok(FieldInput::new(kind, label, preprocess))
}

pub fn text(label: impl Into<String>) -> FieldInput {
    FieldInput::new(FieldKind::Text, label, Preprocess::Text)
}

pub fn number(label: impl Into<String>) -> FieldInput {
    FieldInput::new(FieldKind::Number, label, Preprocess::Integer)
}

pub fn password(label: impl Into<String>) -> FieldInput {
    FieldInput::new(FieldKind::Password, label, Preprocess::Text)
}

pub fn textarea(label: impl Into<String>) -> FieldInput {
    FieldInput::new(FieldKind::Textarea, label, Preprocess::Text).rows(6)
}

fn choice<I, D>(
    kind: FieldKind,
    label: impl Into<String>,
    options: I,
) -> Result<FieldInput, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    let mut field = FieldInput::new(kind, label, Preprocess::Identity);
    field.spec.options = Some(normalize_options(options)?);
    Ok(field)
}

/// Drop-down select. Single selection unless `.multiple(true)`.
pub fn select<I, D>(label: impl Into<String>, options: I) -> Result<FieldInput, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    choice(FieldKind::Select, label, options)
}

pub fn checkbox<I, D>(label: impl Into<String>, options: I) -> Result<FieldInput, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    choice(FieldKind::Checkbox, label, options)
}

pub fn radio<I, D>(label: impl Into<String>, options: I) -> Result<FieldInput, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    choice(FieldKind::Radio, label, options)
}

/// Row of buttons; clicking one submits the form with its value.
pub fn actions<I, D>(label: impl Into<String>, buttons: I) -> Result<FieldInput, SpecificationError>
where
    I: IntoIterator<Item = D>,
    D: Into<OptionDecl>,
{
    let mut field = FieldInput::new(FieldKind::Actions, label, Preprocess::Identity);
    field.spec.buttons = Some(normalize_buttons(buttons)?);
    Ok(field)
}

/// File picker. Resolves to an [`crate::model::UploadedFile`].
pub fn file_upload(label: impl Into<String>) -> FieldInput {
    FieldInput::new(FieldKind::File, label, Preprocess::DataUrl).placeholder("Choose file")
}
