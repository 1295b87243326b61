use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde_json::{json, Value as JsonValue};
use std::sync::OnceLock;

use crate::error::ConversionError;
use crate::model::{FieldValue, UploadedFile};

/// Raw-value to typed-value conversion applied before a field's validator.
///
/// `null` (nothing submitted) passes through every transform unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preprocess {
    #[default]
    Identity,
    /// Scalar literal to its string form; text inputs always resolve to strings.
    Text,
    /// String or numeric literal to `i64`.
    Integer,
    /// `{filename, dataurl}` payload to decoded file bytes.
    DataUrl,
}

impl Preprocess {
    pub fn apply(self, raw: JsonValue) -> Result<FieldValue, ConversionError> {
        if raw.is_null() {
            return Ok(FieldValue::Raw(raw));
        }
        match self {
            Preprocess::Identity => Ok(FieldValue::Raw(raw)),
            Preprocess::Text => to_text(raw).map(FieldValue::Raw),
            Preprocess::Integer => parse_integer(&raw).map(FieldValue::Int),
            Preprocess::DataUrl => read_file(&raw).map(FieldValue::File),
        }
    }
}

fn to_text(raw: JsonValue) -> Result<JsonValue, ConversionError> {
    match raw {
        JsonValue::String(_) => Ok(raw),
        JsonValue::Number(n) => Ok(JsonValue::String(n.to_string())),
        JsonValue::Bool(b) => Ok(JsonValue::String(b.to_string())),
        _ => Err(ConversionError::TypeConversion("Expected text".into())),
    }
}

fn parse_integer(raw: &JsonValue) -> Result<i64, ConversionError> {
    let invalid = || ConversionError::TypeConversion("Invalid integer".into());
    match raw {
        JsonValue::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(invalid()),
            }
        }
        JsonValue::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn data_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^data:(?P<mime>[^;,]*)(?P<params>(?:;[^;,]*)*),(?P<data>.*)$")
            .expect("data URL pattern")
    })
}

/// Split a base64 data URL into its media type and decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(Option<String>, Vec<u8>), ConversionError> {
    let caps = data_url_re()
        .captures(url.trim())
        .ok_or_else(|| ConversionError::Decode("Malformed data URL".into()))?;
    let is_base64 = caps["params"]
        .split(';')
        .any(|p| p.eq_ignore_ascii_case("base64"));
    if !is_base64 {
        return Err(ConversionError::Decode(
            "Only base64 data URLs are supported".into(),
        ));
    }
    let mime = Some(caps["mime"].to_string()).filter(|m| !m.is_empty());
    let content = STANDARD
        .decode(caps["data"].trim())
        .map_err(|e| ConversionError::Decode(format!("Invalid base64 payload: {e}")))?;
    Ok((mime, content))
}

pub fn encode_data_url(mime: &str, content: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(content))
}

/// Build the payload a browser sends for an uploaded file.
pub fn file_payload(filename: &str, mime: &str, content: &[u8]) -> JsonValue {
    json!({"filename": filename, "dataurl": encode_data_url(mime, content)})
}

fn read_file(raw: &JsonValue) -> Result<UploadedFile, ConversionError> {
    let url = raw
        .get("dataurl")
        .and_then(|s| s.as_str())
        .ok_or_else(|| ConversionError::Decode("File payload has no data URL".into()))?;
    let filename = raw
        .get("filename")
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string();
    let (mime, content) = parse_data_url(url)?;
    Ok(UploadedFile {
        filename,
        mime,
        content,
    })
}
