use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::SpecificationError;
use crate::input::{apply_default_focus, preserve_entry, run_field, FieldInput};
use crate::model::{FieldError, FieldValue, FormSpec};
use crate::protocol::{PayloadShape, PendingRequest, Resolve, Verdict};

/// One field suspended on its own. The submission is the bare raw value.
#[derive(Debug)]
pub struct SingleInput {
    field: FieldInput,
}

impl SingleInput {
    pub fn new(field: FieldInput) -> Result<Self, SpecificationError> {
        field.check()?;
        Ok(Self { field })
    }

    pub fn field(&self) -> &FieldInput {
        &self.field
    }

    pub fn into_request(self) -> PendingRequest<Self> {
        PendingRequest::new(self)
    }
}

impl Resolve for SingleInput {
    type Output = FieldValue;

    fn shape(&self) -> PayloadShape {
        PayloadShape::Value
    }

    fn form(&self) -> FormSpec {
        let mut inputs = vec![self.field.spec.clone()];
        apply_default_focus(&mut inputs);
        FormSpec {
            label: String::new(),
            inputs,
            error: None,
        }
    }

    fn resolve(&mut self, shown: &FormSpec, payload: JsonValue) -> Verdict<FieldValue> {
        let name = &self.field.spec.name;
        match run_field(&self.field, payload.clone()) {
            Ok(value) => Verdict::Accept(value),
            Err(message) => {
                debug!(field = %name, %message, "single input rejected");
                let mut form = shown.clone();
                if let Some(spec) = form.field_mut(name) {
                    preserve_entry(spec, &payload);
                }
                form.error = Some(FieldError::new(name.clone(), message));
                Verdict::Reject(form)
            }
        }
    }
}
