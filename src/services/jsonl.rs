//! JSON-lines transport.
//!
//! Every outbound line is a `{"type": ..., "data": ...}` envelope. Inbound
//! lines are either full submissions or shorthand answering the last form
//! shown:
//!
//! ```text
//! {"request":3,"revision":0,"payload":{"age":"17"}}
//! {"age":"17"}
//! name=Ada age=17 doc=@./notes.txt
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::debug;

use crate::input::preprocess::file_payload;
use crate::model::{FieldKind, FormSpec};
use crate::protocol::session::Transport;
use crate::protocol::{Emission, PayloadShape, Submission};
use crate::render::render_to_string;
use crate::theme::Theme;

struct Preview {
    width: u16,
    theme: Theme,
    out: Box<dyn Write>,
}

pub struct JsonLines<R, W> {
    reader: R,
    writer: W,
    last: Option<Emission>,
    preview: Option<Preview>,
}

impl<R: BufRead, W: Write> JsonLines<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            last: None,
            preview: None,
        }
    }

    /// Also draw every form shown into `out` as plain text.
    pub fn with_preview(mut self, width: u16, theme: Theme, out: Box<dyn Write>) -> Self {
        self.preview = Some(Preview { width, theme, out });
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn envelope<T: Serialize>(&mut self, typ: &str, data: &T) -> Result<()> {
        let line = serde_json::to_string(&json!({"type": typ, "data": data}))?;
        writeln!(self.writer, "{line}").with_context(|| format!("writing {typ} envelope"))?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_result<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.envelope("result", value)
    }

    pub fn write_error(&mut self, message: &str) -> Result<()> {
        self.envelope("error", &json!({ "message": message }))
    }

    fn parse_line(&self, line: &str) -> Result<Submission> {
        if line.starts_with(['{', '[', '"']) {
            let v: JsonValue =
                serde_json::from_str(line).with_context(|| "parsing submission JSON")?;
            if v.get("request").is_some() {
                return serde_json::from_value(v).with_context(|| "reading submission");
            }
            return self.answer(v);
        }
        let last = self.shown()?;
        let payload = match last.expects {
            PayloadShape::Value => shorthand_scalar(line)?,
            PayloadShape::Mapping => {
                let mut entered = shorthand_mapping(line)?;
                keep_prefilled(&last.form, &mut entered);
                JsonValue::Object(entered)
            }
        };
        self.answer(payload)
    }

    fn shown(&self) -> Result<&Emission> {
        self.last
            .as_ref()
            .ok_or_else(|| anyhow!("no form has been shown yet"))
    }

    fn answer(&self, payload: JsonValue) -> Result<Submission> {
        Ok(Submission::answering(self.shown()?, payload))
    }
}

impl<R: BufRead, W: Write> Transport for JsonLines<R, W> {
    fn show(&mut self, emission: &Emission) -> Result<()> {
        self.last = Some(emission.clone());
        self.envelope("form", emission)?;
        if let Some(p) = self.preview.as_mut() {
            let text = render_to_string(&emission.form, p.width, &p.theme);
            p.out.write_all(text.as_bytes())?;
            p.out.flush()?;
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Submission> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = self
                .reader
                .read_line(&mut buf)
                .with_context(|| "reading submission")?;
            if n == 0 {
                return Err(anyhow!("input closed before the form was submitted"));
            }
            let line = buf.trim();
            if line.is_empty() {
                continue;
            }
            debug!(line, "submission line");
            return self.parse_line(line);
        }
    }
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn read_upload(path: &str) -> Result<JsonValue> {
    let p = Path::new(path);
    let content = std::fs::read(p).with_context(|| format!("reading upload {p:?}"))?;
    let filename = p
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    Ok(file_payload(filename, guess_mime(p), &content))
}

fn shorthand_scalar(text: &str) -> Result<JsonValue> {
    if let Some(path) = text.strip_prefix('@') {
        return read_upload(path);
    }
    Ok(serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string())))
}

fn shorthand_mapping(line: &str) -> Result<JsonMap<String, JsonValue>> {
    let parts = shlex::split(line).ok_or_else(|| anyhow!("Failed to parse submission line"))?;
    let mut obj = JsonMap::new();
    for part in parts {
        let (name, value) = part
            .split_once('=')
            .ok_or_else(|| anyhow!("expected name=value, got {part:?}"))?;
        obj.insert(name.to_string(), shorthand_scalar(value)?);
    }
    Ok(obj)
}

/// Inputs left out of a shorthand line resubmit the value they show, the way
/// a browser posts pre-filled fields. File inputs are never pre-filled.
fn keep_prefilled(form: &FormSpec, entered: &mut JsonMap<String, JsonValue>) {
    for fld in &form.inputs {
        if fld.kind == FieldKind::File || entered.contains_key(&fld.name) {
            continue;
        }
        if let Some(v) = fld.value.as_ref().filter(|v| !v.is_null()) {
            entered.insert(fld.name.clone(), v.clone());
        }
    }
}
