use super::controller::{FormController, FormResult};
use super::record::{FieldValue, Scope};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InputKind {
    #[default]
    Text,
    Checkbox,
}

impl InputKind {
    /// Maps an input `type` attribute; anything but `checkbox` carries text.
    pub fn from_type(input_type: &str) -> Self {
        if input_type.eq_ignore_ascii_case("checkbox") {
            InputKind::Checkbox
        } else {
            InputKind::Text
        }
    }
}

/// A change notification as delivered by an input element.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChangeEvent {
    pub name: String,
    pub value: String,
    pub kind: InputKind,
    pub checked: bool,
}

impl ChangeEvent {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            kind: InputKind::Checkbox,
            checked,
            ..Self::default()
        }
    }

    pub fn field_value(&self) -> FieldValue {
        match self.kind {
            InputKind::Checkbox => FieldValue::Bool(self.checked),
            InputKind::Text => FieldValue::Text(self.value.clone()),
        }
    }
}

pub trait SubmitEvent {
    fn prevent_default(&mut self);
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FormEvent {
    default_prevented: bool,
}

impl FormEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl SubmitEvent for FormEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

impl FormController {
    pub fn handle_change(&self, event: &ChangeEvent, scope: Scope<'_>) -> FormResult<()> {
        self.set_field(event.field_value(), &event.name, scope)
    }
}
