use calmform::prelude::*;
use futures::executor::block_on;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const SCHEMA: &str = r#"{
    "account": {
        "email": {
            "value": "",
            "required": true,
            "validator": { "pattern": "^\\S+@\\S+$", "message": "invalid email" }
        },
        "company": { "value": "" },
        "vat": { "value": "", "dependsOn": "company", "requiredError": "VAT number needed" }
    },
    "confirm": {
        "terms": { "value": false, "required": true }
    }
}"#;

fn english() -> FormOptions {
    FormOptions {
        locale: Locale::Tag("en".to_string()),
        ..FormOptions::default()
    }
}

#[test]
fn wizard_walkthrough_submits_once_every_step_is_valid() {
    let sent = Arc::new(AtomicUsize::new(0));
    let counter = sent.clone();
    let controller = FormController::new(
        FormState::from_json(SCHEMA).expect("schema"),
        english(),
        move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
    );
    let account = Scope::Named("account");
    let confirm = Scope::Named("confirm");

    assert!(controller.is_empty(false, Scope::Flat).expect("empty wizard"));

    controller
        .handle_change(&ChangeEvent::text("email", "someone"), account)
        .expect("email");
    controller
        .handle_change(&ChangeEvent::text("company", "PushGo"), account)
        .expect("company");
    assert!(!controller.validate_all(account).expect("account step"));
    assert_eq!(
        controller.field("email", account).expect("email").error,
        "invalid email"
    );
    assert_eq!(
        controller.field("vat", account).expect("vat").error,
        "VAT number needed"
    );

    controller
        .set_field("someone@pushgo.dev", "email", account)
        .expect("email");
    controller
        .set_field("FR123", "vat", account)
        .expect("vat");
    assert!(controller.validate_all(account).expect("account step"));

    assert!(!controller.validate_all(confirm).expect("confirm step"));
    controller
        .handle_change(&ChangeEvent::checkbox("terms", true), confirm)
        .expect("terms");
    assert!(controller.validate_all(confirm).expect("confirm step"));

    let mut event = FormEvent::new();
    assert!(block_on(controller.submit_async(Some(&mut event), Scope::Flat)).expect("submit"));
    assert!(event.default_prevented());
    assert_eq!(sent.load(Ordering::SeqCst), 1);
    assert!(!controller.is_pristine(Scope::Flat).expect("pristine"));
    assert!(controller.is_pristine(Scope::Named("unknown")).expect("unknown form"));
}

#[test]
fn wizard_root_submit_is_blocked_by_recorded_errors() {
    let sent = Arc::new(AtomicUsize::new(0));
    let counter = sent.clone();
    let controller = FormController::new(
        FormState::from_json(SCHEMA).expect("schema"),
        english(),
        move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
    );

    controller
        .validate_all(Scope::Named("confirm"))
        .expect("confirm step");
    assert!(!block_on(controller.submit_async(None, Scope::Flat)).expect("submit"));
    assert!(controller.form_in_error().expect("flag"));
    assert_eq!(sent.load(Ordering::SeqCst), 0);

    controller.reset(None).expect("reset");
    assert!(!controller.is_in_error(Scope::Flat).expect("errors cleared by reset"));
    assert!(!controller.form_in_error().expect("flag"));
}
