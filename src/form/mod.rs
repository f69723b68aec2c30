mod binding;
mod controller;
mod model;
mod record;
mod validation;


pub use binding::{ChangeEvent, FormEvent, InputKind, SubmitEvent};
pub use calmform_derive::FormModel;
pub use controller::{
    BoxedSubmitFuture, FormController, FormError, FormOptions, FormResult, FormSnapshot,
    SubmitState, ValidationMode,
};
pub use model::{FieldType, FormModel};
pub use record::{FieldRecord, FieldSet, FieldValidator, FieldValue, FormState, Scope};
pub use validation::resolve_error;

#[doc(hidden)]
pub mod __private {
    pub use super::model::read_field;
}
