//! Terminal preview of an emitted form.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use ratatui::Frame;
use serde_json::Value as JsonValue;

use crate::input::options::scalar_label;
use crate::model::{FieldKind, FieldSpec, FormSpec, OptionItem};
use crate::theme::Theme;

fn panel_block<'a>(title: &'a str, errored: bool, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, theme.title_style()))
        .border_style(theme.border(errored))
}

fn shown_value(v: &Option<JsonValue>) -> String {
    match v {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::Array(items)) => items.iter().map(scalar_label).collect::<Vec<_>>().join(", "),
        Some(other) => scalar_label(other),
    }
}

fn is_chosen(fld: &FieldSpec, opt: &OptionItem) -> bool {
    if opt.selected == Some(true) {
        return true;
    }
    match &fld.value {
        Some(JsonValue::Array(items)) => items.contains(&opt.value),
        Some(v) => *v == opt.value,
        None => false,
    }
}

fn field_lines(fld: &FieldSpec, theme: &Theme, lines: &mut Vec<Line<'static>>) {
    let focused = fld.has_auto_focus();
    let sel = if focused { '›' } else { ' ' };
    let req = if fld.is_required() { " *" } else { "" };
    let label = if fld.label.is_empty() { &fld.name } else { &fld.label };
    let head = format!("{sel} {label}{req}: ");
    let head_style = if focused {
        theme.text_focused_bold()
    } else {
        theme.text_label()
    };
    let placeholder = || {
        Span::styled(
            fld.placeholder.clone().unwrap_or_default(),
            theme.text_muted(),
        )
    };

    match fld.kind {
        FieldKind::Text | FieldKind::Number => {
            let val = shown_value(&fld.value);
            let body = if val.is_empty() {
                placeholder()
            } else {
                Span::styled(val, theme.text_value())
            };
            lines.push(Line::from(vec![Span::styled(head, head_style), body]));
        }
        FieldKind::Password => {
            let n = shown_value(&fld.value).chars().count();
            let body = if n == 0 {
                placeholder()
            } else {
                Span::styled("•".repeat(n), theme.text_value())
            };
            lines.push(Line::from(vec![Span::styled(head, head_style), body]));
        }
        FieldKind::Textarea => {
            lines.push(Line::from(Span::styled(head.trim_end().to_string(), head_style)));
            let val = shown_value(&fld.value);
            if val.is_empty() {
                lines.push(Line::from(vec![Span::raw("    "), placeholder()]));
            }
            for l in val.lines() {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(l.to_string(), theme.text_value()),
                ]));
            }
        }
        FieldKind::Select | FieldKind::Radio | FieldKind::Checkbox => {
            lines.push(Line::from(Span::styled(head.trim_end().to_string(), head_style)));
            let boxed = fld.kind == FieldKind::Checkbox
                || (fld.kind == FieldKind::Select && fld.is_multiple());
            let opts = fld.options.as_deref().unwrap_or_default();
            let mut row: Vec<Span<'static>> = Vec::new();
            for opt in opts {
                let on = is_chosen(fld, opt);
                let mark = match (boxed, on) {
                    (true, true) => "[x]",
                    (true, false) => "[ ]",
                    (false, true) => "(•)",
                    (false, false) => "( )",
                };
                let style = if opt.disabled == Some(true) {
                    theme.text_muted()
                } else if on {
                    theme.text_value()
                } else {
                    Style::default()
                };
                let span = Span::styled(format!("{mark} {}", opt.label), style);
                if fld.inline == Some(true) {
                    if row.is_empty() {
                        row.push(Span::raw("    "));
                    } else {
                        row.push(Span::raw("  "));
                    }
                    row.push(span);
                } else {
                    lines.push(Line::from(vec![Span::raw("    "), span]));
                }
            }
            if !row.is_empty() {
                lines.push(Line::from(row));
            }
        }
        FieldKind::Actions => {
            let mut row = vec![Span::styled(head, head_style)];
            for b in fld.buttons.as_deref().unwrap_or_default() {
                let style = if b.disabled == Some(true) {
                    theme.text_muted()
                } else {
                    theme.text_value()
                };
                row.push(Span::styled(format!("[ {} ] ", b.label), style));
            }
            lines.push(Line::from(row));
        }
        FieldKind::File => {
            let mut row = vec![
                Span::styled(head, head_style),
                Span::styled(
                    format!("[{}]", fld.placeholder.as_deref().unwrap_or("Choose file")),
                    theme.text_value(),
                ),
            ];
            if let Some(types) = &fld.accept {
                row.push(Span::styled(
                    format!(" ({})", types.join(", ")),
                    theme.text_muted(),
                ));
            }
            lines.push(Line::from(row));
        }
    }

    if let Some(help) = &fld.help_text {
        lines.push(Line::from(Span::styled(
            format!("    {help}"),
            theme.text_muted(),
        )));
    }
}

/// One styled line per row of the preview, without the frame.
pub fn form_lines(form: &FormSpec, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut flagged = false;
    for fld in &form.inputs {
        field_lines(fld, theme, &mut lines);
        if let Some(err) = form.error.as_ref().filter(|e| e.name == fld.name) {
            lines.push(Line::from(Span::styled(
                format!("  ! {}", err.message),
                theme.text_error(),
            )));
            flagged = true;
        }
    }
    if let (Some(err), false) = (&form.error, flagged) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  ! {err}"),
            theme.text_error(),
        )));
    }
    lines
}

fn paragraph<'a>(form: &'a FormSpec, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(form_lines(form, theme))
        .style(theme.base_style())
        .block(panel_block(&form.label, form.error.is_some(), theme))
        .wrap(Wrap { trim: false })
}

pub fn draw_form(f: &mut Frame, area: Rect, form: &FormSpec, theme: &Theme) {
    f.render_widget(paragraph(form, theme), area);
}

/// Render the form into plain text, `width` columns wide, trailing blanks
/// trimmed.
pub fn render_to_string(form: &FormSpec, width: u16, theme: &Theme) -> String {
    let width = width.max(8);
    let inner = usize::from(width - 2);
    let rows: usize = form_lines(form, theme)
        .iter()
        .map(|l| l.width().max(1).div_ceil(inner))
        .sum();
    let height = u16::try_from(rows + 2).unwrap_or(u16::MAX);
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    paragraph(form, theme).render(area, &mut buf);

    let mut out = String::new();
    for y in 0..area.height {
        let mut line = String::new();
        for x in 0..area.width {
            line.push_str(buf[(x, y)].symbol());
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{actions, checkbox, file_upload, input_group, number, password, select, text};
    use crate::model::FieldError;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn sample() -> FormSpec {
        input_group(
            "Basic info",
            vec![
                text("Name").name("name").required(true).value("Ada"),
                number("Age").name("age").placeholder("years"),
                password("Secret").name("pw").value("abc"),
                select("Color", vec![("r", "Red"), ("g", "Green")])
                    .unwrap()
                    .name("color")
                    .value("g"),
                checkbox("Tags", vec!["x", "y"]).unwrap().name("tags").inline(true),
                file_upload("Doc").name("doc").accept(["image/*"]),
                actions("Go", vec!["ok", "cancel"]).unwrap().name("go"),
            ],
        )
        .unwrap()
        .spec()
        .clone()
    }

    #[test]
    fn preview_shows_every_field() {
        let out = render_to_string(&sample(), 48, &Theme::default());
        assert!(out.contains("Basic info"));
        assert!(out.contains("› Name *: Ada"));
        assert!(out.contains("Age: years"));
        assert!(out.contains("Secret: •••"));
        assert!(out.contains("(•) Green"));
        assert!(out.contains("( ) Red"));
        assert!(out.contains("[ ] x  [ ] y"));
        assert!(out.contains("[Choose file] (image/*)"));
        assert!(out.contains("[ ok ]"));
        assert!(!out.contains("abc"));
    }

    #[test]
    fn error_is_shown_under_its_field() {
        let mut form = sample();
        form.error = Some(FieldError::new("age", "Invalid integer"));
        let out = render_to_string(&form, 48, &Theme::default());
        let rows: Vec<&str> = out.lines().collect();
        let age = rows.iter().position(|l| l.contains("Age:")).unwrap();
        assert!(rows[age + 1].contains("! Invalid integer"));
    }

    #[test]
    fn error_for_unknown_field_goes_last() {
        let mut form = sample();
        form.error = Some(FieldError::new("nope", "bad"));
        let lines = form_lines(&form, &Theme::default());
        let last: String = lines
            .last()
            .unwrap()
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(last, "  ! nope: bad");
    }

    #[test]
    fn draws_into_a_frame() {
        let form = sample();
        let backend = TestBackend::new(48, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_form(f, area, &form, &Theme::default());
            })
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        let top: String = (0..buf.area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(top.contains("Basic info"));
        let second: String = (0..buf.area.width)
            .map(|x| buf[(x, 1)].symbol().to_string())
            .collect();
        assert!(second.contains("Name *: Ada"));
    }

    #[test]
    fn multi_select_uses_boxes() {
        let form = input_group(
            "",
            vec![select("Pick", vec!["a", "b"])
                .unwrap()
                .name("p")
                .multiple(true)
                .value(json!(["b"]))],
        )
        .unwrap()
        .spec()
        .clone();
        let out = render_to_string(&form, 30, &Theme::default());
        assert!(out.contains("[ ] a"));
        assert!(out.contains("[x] b"));
    }
}
