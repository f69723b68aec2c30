use calmform::form::{FieldValue, FormModel, Scope};

#[derive(Clone, Debug, PartialEq, calmform::form::FormModel)]
struct DemoForm {
    #[form(required)]
    email: String,
    #[form(depends_on = "email", required_error = "confirm it")]
    confirm: String,
    subscribed: bool,
}

fn main() {
    let model = DemoForm {
        email: "a@calm.ui".to_string(),
        confirm: String::new(),
        subscribed: true,
    };
    let state = model.to_form_state().expect("derived schema");
    let record = state.field("email", Scope::Flat).expect("email record");
    assert!(record.required);
    assert_eq!(record.value, FieldValue::from("a@calm.ui"));
    assert_eq!(
        state
            .field("confirm", Scope::Flat)
            .expect("confirm record")
            .depends_on
            .as_deref(),
        Some("email")
    );
    assert_eq!(DemoForm::from_form_state(&state).expect("read back"), model);
}
