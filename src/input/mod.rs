pub mod checks;
pub mod fields;
pub mod group;
pub mod options;
pub mod preprocess;
pub mod single;

pub use fields::{
    actions, checkbox, file_upload, input, number, password, radio, select, text, textarea,
    FieldInput, FieldValidator,
};
pub use group::{input_group, FormValidator, InputGroup};
pub use single::SingleInput;

use serde_json::Value as JsonValue;

use crate::model::{FieldKind, FieldSpec, FieldValue};

pub const REQUIRED_MESSAGE: &str = "This field is required";

fn is_blank(raw: &JsonValue) -> bool {
    match raw {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Required check, transform, then validator. Conversion failures come back
/// as the message to show, same as validator failures.
pub(crate) fn run_field(field: &FieldInput, raw: JsonValue) -> Result<FieldValue, String> {
    if field.spec.is_required() && is_blank(&raw) {
        return Err(REQUIRED_MESSAGE.to_string());
    }
    let value = field.preprocess.apply(raw).map_err(|e| e.to_string())?;
    field.validate_value(&value)?;
    Ok(value)
}

/// Keep what the user entered as the field's new default. File inputs cannot
/// be pre-filled and nothing submitted keeps the previous default.
pub(crate) fn preserve_entry(spec: &mut FieldSpec, raw: &JsonValue) {
    if spec.kind == FieldKind::File || raw.is_null() {
        return;
    }
    spec.extra.remove("value");
    spec.value = Some(raw.clone());
}

/// Focus the first text-like field unless some field already says anything
/// about auto focus.
pub(crate) fn apply_default_focus(specs: &mut [FieldSpec]) {
    if specs.iter().any(|s| s.declares_auto_focus()) {
        return;
    }
    if let Some(first) = specs.iter_mut().find(|s| s.kind.is_text_like()) {
        first.auto_focus = Some(true);
    }
}
