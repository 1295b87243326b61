use serde_json::Value as JsonValue;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::error::SpecificationError;
use crate::input::{apply_default_focus, preserve_entry, run_field, FieldInput};
use crate::model::{FieldError, FormData, FormSpec};
use crate::protocol::{PayloadShape, PendingRequest, Resolve, Verdict};

/// Whole-form check run after every field passed. The error names the field
/// to flag.
pub type FormValidator = Box<dyn Fn(&FormData) -> Result<(), FieldError> + Send + Sync>;

/// Several fields shown and submitted as one form.
pub struct InputGroup {
    form: FormSpec,
    fields: Vec<FieldInput>,
    validator: Option<FormValidator>,
}

impl std::fmt::Debug for InputGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputGroup")
            .field("form", &self.form)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Combine fields into one form. Names must be unique and at most one field
/// may ask for auto focus; if none says anything about it, the first
/// text-like field gets it.
pub fn input_group(
    label: impl Into<String>,
    inputs: Vec<FieldInput>,
) -> Result<InputGroup, SpecificationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut focused: Option<&str> = None;
    for field in &inputs {
        field.check()?;
        let name = field.spec.name.as_str();
        if !seen.insert(name) {
            return Err(SpecificationError::DuplicateName(name.to_string()));
        }
        if field.spec.has_auto_focus() {
            if let Some(first) = focused {
                return Err(SpecificationError::MultipleAutoFocus {
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
            focused = Some(name);
        }
    }

    let mut specs: Vec<_> = inputs.iter().map(|f| f.spec.clone()).collect();
    apply_default_focus(&mut specs);
    Ok(InputGroup {
        form: FormSpec {
            label: label.into(),
            inputs: specs,
            error: None,
        },
        fields: inputs,
        validator: None,
    })
}

impl InputGroup {
    /// Attach the whole-form validator.
    pub fn validate<F>(mut self, check: F) -> Self
    where
        F: Fn(&FormData) -> Result<(), FieldError> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(check));
        self
    }

    pub fn spec(&self) -> &FormSpec {
        &self.form
    }

    pub fn into_request(self) -> PendingRequest<Self> {
        PendingRequest::new(self)
    }

    fn redisplay(&self, shown: &FormSpec, raws: &[(String, JsonValue)], err: FieldError) -> FormSpec {
        let mut form = shown.clone();
        for (name, raw) in raws {
            if let Some(spec) = form.field_mut(name) {
                preserve_entry(spec, raw);
            }
        }
        form.error = Some(err);
        form
    }
}

impl Resolve for InputGroup {
    type Output = FormData;

    fn shape(&self) -> PayloadShape {
        PayloadShape::Mapping
    }

    fn form(&self) -> FormSpec {
        self.form.clone()
    }

    fn resolve(&mut self, shown: &FormSpec, payload: JsonValue) -> Verdict<FormData> {
        let mut submitted = match payload {
            JsonValue::Object(m) => m,
            _ => Default::default(),
        };

        let mut data = FormData::default();
        let mut raws = Vec::with_capacity(self.fields.len());
        let mut failure: Option<FieldError> = None;
        for field in &self.fields {
            let name = &field.spec.name;
            let raw = submitted.remove(name).unwrap_or(JsonValue::Null);
            // first failure in declaration order wins; later fields are only collected
            if failure.is_none() {
                match run_field(field, raw.clone()) {
                    Ok(value) => data.insert(name.clone(), value),
                    Err(message) => failure = Some(FieldError::new(name.clone(), message)),
                }
            }
            raws.push((name.clone(), raw));
        }
        for key in submitted.keys() {
            trace!(key = %key, "ignoring value for unknown input");
        }

        if let Some(err) = failure {
            debug!(field = %err.name, message = %err.message, "field check failed");
            return Verdict::Reject(self.redisplay(shown, &raws, err));
        }

        if let Some(check) = &self.validator {
            if let Err(err) = check(&data) {
                if shown.field(&err.name).is_none() {
                    warn!(field = %err.name, "form validator flagged an unknown input");
                }
                debug!(field = %err.name, message = %err.message, "form check failed");
                return Verdict::Reject(self.redisplay(shown, &raws, err));
            }
        }

        Verdict::Accept(data)
    }
}

#[cfg(test)]
mod tests;
