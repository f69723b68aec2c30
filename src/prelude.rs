pub use crate::form::{
    ChangeEvent, FieldRecord, FieldSet, FieldValidator, FieldValue, FormController, FormError,
    FormEvent, FormModel, FormOptions, FormResult, FormState, Scope, SubmitEvent, SubmitState,
    ValidationMode,
};
pub use crate::{I18nManager, Locale};
