use super::controller::{FormError, FormResult};
use super::record::{FieldSet, FieldValue, FormState};

/// A Rust type that a single field record can hold.
pub trait FieldType: Sized {
    const KIND: &'static str;

    fn to_field_value(&self) -> FieldValue;
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FieldType for String {
    const KIND: &'static str = "text";

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FieldType for bool {
    const KIND: &'static str = "boolean";

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_bool()
    }
}

/// A struct whose fields map one-to-one onto the records of a flat form.
/// Usually derived with `#[derive(FormModel)]`.
pub trait FormModel: Sized {
    fn field_names() -> &'static [&'static str];

    fn to_fields(&self) -> FormResult<FieldSet>;

    fn from_fields(fields: &FieldSet) -> FormResult<Self>;

    fn to_form_state(&self) -> FormResult<FormState> {
        Ok(FormState::Flat(self.to_fields()?))
    }

    fn from_form_state(state: &FormState) -> FormResult<Self> {
        match state {
            FormState::Flat(fields) => Self::from_fields(fields),
            FormState::Wizard(_) => Err(FormError::FormNameRequired),
        }
    }
}

#[doc(hidden)]
pub fn read_field<T: FieldType>(fields: &FieldSet, name: &str) -> FormResult<T> {
    let record = fields.get(name).ok_or_else(|| FormError::UnknownField {
        form: None,
        field: name.to_string(),
    })?;
    T::from_field_value(&record.value).ok_or_else(|| FormError::TypeMismatch {
        field: name.to_string(),
        expected: T::KIND,
    })
}
