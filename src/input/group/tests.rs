use super::*;
use crate::input::{checkbox, input, number, select, text};
use crate::model::{FieldKind, FieldValue};
use crate::protocol::{Emission, Step, Submission};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn expect_display<T: std::fmt::Debug>(step: Step<T>) -> Emission {
    match step {
        Step::Display(e) => e,
        Step::Resolved(v) => panic!("expected re-display, resolved with {v:?}"),
    }
}

fn expect_resolved<T>(step: Step<T>) -> T {
    match step {
        Step::Resolved(v) => v,
        Step::Display(e) => panic!("expected resolution, got error {:?}", e.form.error),
    }
}

#[test]
fn non_numeric_age_is_flagged_then_accepted() {
    let group = input_group(
        "g",
        vec![input("Age", FieldKind::Number).unwrap().name("age")],
    )
    .unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let e1 = expect_display(
        req.deliver(Submission::answering(&e0, json!({"age": "abc"})))
            .unwrap(),
    );
    assert_eq!(e1.form.error, Some(FieldError::new("age", "Invalid integer")));

    let data = expect_resolved(
        req.deliver(Submission::answering(&e1, json!({"age": "17"})))
            .unwrap(),
    );
    assert_eq!(data.get("age"), Some(&FieldValue::Int(17)));
    assert_eq!(data.len(), 1);
}

#[test]
fn form_validator_flags_named_field_and_keeps_values() {
    let group = input_group(
        "Basic info",
        vec![text("Name").name("name"), number("Age").name("age")],
    )
    .unwrap()
    .validate(|data| {
        if data.get("name").and_then(|v| v.as_str()).map(|s| s.len()) > Some(6) {
            return Err(FieldError::new("name", "too long"));
        }
        Ok(())
    });
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let e1 = expect_display(
        req.deliver(Submission::answering(
            &e0,
            json!({"name": "averylongname", "age": 5}),
        ))
        .unwrap(),
    );
    assert_eq!(e1.form.error, Some(FieldError::new("name", "too long")));
    assert_eq!(e1.form.field("age").unwrap().value, Some(json!(5)));
    assert_eq!(
        e1.form.field("name").unwrap().value,
        Some(json!("averylongname"))
    );
}

#[test]
fn missing_required_field_resumes_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let group = input_group(
        "g",
        vec![
            text("Name").name("name").required(true),
            text("City").name("city"),
        ],
    )
    .unwrap()
    .validate(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let e1 = expect_display(
        req.deliver(Submission::answering(&e0, json!({"city": "Oslo"})))
            .unwrap(),
    );
    assert_eq!(
        e1.form.error,
        Some(FieldError::new("name", crate::input::REQUIRED_MESSAGE))
    );
    assert_eq!(e1.form.field("city").unwrap().value, Some(json!("Oslo")));
    // the form validator never runs while a field check fails
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn first_failure_in_declaration_order_wins() {
    let group = input_group(
        "g",
        vec![
            number("A").name("a"),
            number("B").name("b").validate(|_| Err("never".into())),
        ],
    )
    .unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let e1 = expect_display(
        req.deliver(Submission::answering(&e0, json!({"a": "x", "b": "1"})))
            .unwrap(),
    );
    assert_eq!(e1.form.error.as_ref().unwrap().name, "a");
    let e2 = expect_display(
        req.deliver(Submission::answering(&e1, json!({"a": "1", "b": "1"})))
            .unwrap(),
    );
    assert_eq!(e2.form.error, Some(FieldError::new("b", "never")));
    assert_eq!(e2.form.field("a").unwrap().value, Some(json!("1")));
}

#[test]
fn undeclared_option_value_passes_without_validator() {
    let group = input_group(
        "g",
        vec![select("Pick", vec!["A", "B", "C"]).unwrap().name("pick")],
    )
    .unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let data = expect_resolved(
        req.deliver(Submission::answering(&e0, json!({"pick": "Z"})))
            .unwrap(),
    );
    assert_eq!(data.get("pick"), Some(&FieldValue::Raw(json!("Z"))));
}

#[test]
fn auto_focus_defaults_to_first_text_like_field() {
    let group = input_group(
        "g",
        vec![
            checkbox("Tags", vec!["x"]).unwrap().name("tags"),
            number("N").name("n"),
            text("T").name("t"),
        ],
    )
    .unwrap();
    let focused: Vec<_> = group
        .spec()
        .inputs
        .iter()
        .filter(|s| s.has_auto_focus())
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(focused, vec!["n"]);
}

#[test]
fn explicit_auto_focus_gets_no_second_flag() {
    let group = input_group(
        "g",
        vec![text("A").name("a"), text("B").name("b").auto_focus(true)],
    )
    .unwrap();
    let focused: Vec<_> = group
        .spec()
        .inputs
        .iter()
        .filter(|s| s.has_auto_focus())
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(focused, vec!["b"]);
}

#[test]
fn duplicate_names_are_rejected() {
    let err = input_group("g", vec![text("A").name("x"), number("B").name("x")]).unwrap_err();
    assert_eq!(err, SpecificationError::DuplicateName("x".into()));
}

#[test]
fn two_auto_focus_requests_are_rejected() {
    let err = input_group(
        "g",
        vec![
            text("A").name("a").auto_focus(true),
            text("B").name("b").auto_focus(true),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, SpecificationError::MultipleAutoFocus { .. }));
}

#[test]
fn unknown_keys_are_ignored() {
    let group = input_group("g", vec![text("A").name("a")]).unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let data = expect_resolved(
        req.deliver(Submission::answering(&e0, json!({"a": "1", "zzz": 2})))
            .unwrap(),
    );
    assert_eq!(data.len(), 1);
}

#[test]
fn file_field_decodes_data_url() {
    let group = input_group("g", vec![crate::input::file_upload("Doc").name("doc")]).unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let data = expect_resolved(
        req.deliver(Submission::answering(
            &e0,
            json!({"doc": {"filename": "a.txt", "dataurl": "data:text/plain;base64,aGVsbG8="}}),
        ))
        .unwrap(),
    );
    let file = data.get("doc").and_then(|v| v.as_file()).unwrap();
    assert_eq!(file.filename, "a.txt");
    assert_eq!(file.content, b"hello");
}

#[test]
fn numeric_entry_in_text_field_still_meets_length_check() {
    let group = input_group(
        "g",
        vec![text("Name")
            .name("name")
            .validate(crate::input::checks::length(None, Some(6)))],
    )
    .unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let e1 = expect_display(
        req.deliver(Submission::answering(&e0, json!({"name": 1234567890})))
            .unwrap(),
    );
    assert_eq!(
        e1.form.error,
        Some(FieldError::new("name", "Must be at most 6 characters"))
    );
    let data = expect_resolved(
        req.deliver(Submission::answering(&e1, json!({"name": 42})))
            .unwrap(),
    );
    assert_eq!(data.get("name"), Some(&FieldValue::Raw(json!("42"))));
}

#[test]
fn malformed_data_url_redisplays_the_file_field() {
    let group = input_group(
        "g",
        vec![
            text("Title").name("title"),
            crate::input::file_upload("Doc").name("doc"),
        ],
    )
    .unwrap();
    let mut req = group.into_request();
    let e0 = req.present().unwrap();
    let e1 = expect_display(
        req.deliver(Submission::answering(
            &e0,
            json!({"title": "x", "doc": {"filename": "a.txt", "dataurl": "not a data url"}}),
        ))
        .unwrap(),
    );
    assert_eq!(e1.form.error, Some(FieldError::new("doc", "Malformed data URL")));
    assert_eq!(e1.form.field("title").unwrap().value, Some(json!("x")));
    assert_eq!(e1.form.field("doc").unwrap().value, None);
    assert_eq!(req.state(), crate::protocol::RequestState::AwaitingSubmission);
}
