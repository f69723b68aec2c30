use std::sync::Arc;

use super::controller::{FormController, FormError, FormResult, read_lock, write_lock};
use super::record::{FieldRecord, FieldSet, FormState, Scope, unknown_field};

/// Computes the error message for `name` from the values of its own form.
/// An empty string means the field is valid.
pub fn resolve_error(fields: &FieldSet, name: &str, required_message: &str) -> FormResult<String> {
    let record = fields.get(name).ok_or_else(|| missing(name))?;
    let required_error = || {
        record
            .required_error
            .clone()
            .unwrap_or_else(|| required_message.to_string())
    };
    let value_empty = record.value.is_empty();
    let pattern_rejects = record
        .validator
        .as_ref()
        .filter(|validator| !validator.accepts(&record.value));

    if let Some(source) = record.depends_on.as_deref() {
        let source = fields.get(source).ok_or_else(|| missing(source))?;
        if !source.value.is_empty() && value_empty {
            return Ok(required_error());
        }
    } else if record.required && value_empty {
        return Ok(required_error());
    }

    // Required or not, a non-empty value must satisfy its pattern.
    match pattern_rejects {
        Some(validator) if !value_empty => Ok(validator.message().to_string()),
        _ => Ok(String::new()),
    }
}

fn missing(name: &str) -> FormError {
    FormError::UnknownField {
        form: None,
        field: name.to_string(),
    }
}

fn scoped(error: FormError, scope: Scope<'_>) -> FormError {
    match error {
        FormError::UnknownField { form: None, field } => unknown_field(&field, scope),
        other => other,
    }
}

fn has_errors(sets: &[(Option<&str>, &FieldSet)]) -> bool {
    sets.iter()
        .any(|(_, fields)| fields.iter().any(|(_, record)| record.has_error()))
}

impl FormController {
    pub fn validate_field(&self, name: &str, scope: Scope<'_>) -> FormResult<bool> {
        let required_message = self.required_message();
        let mut state = write_lock(&self.state, "validating field")?;
        let error = resolve_error(state.current.field_set(scope)?, name, &required_message)
            .map_err(|error| scoped(error, scope))?;
        let is_valid = error.is_empty();
        Arc::make_mut(&mut state.current)
            .update_field(name, scope, |record| record.with_error(error))?;
        Ok(is_valid)
    }

    /// Validates every field the construction schema declares for `scope` and
    /// records the outcome in the form-level error flag. Returns whether the
    /// form is valid.
    ///
    /// The root of a wizard is not revalidated: its flag reflects the errors
    /// already recorded in the sub-forms.
    pub fn validate_all(&self, scope: Scope<'_>) -> FormResult<bool> {
        let required_message = self.required_message();
        let mut state = write_lock(&self.state, "validating form")?;

        if state.current.is_wizard() && scope == Scope::Flat {
            let in_error = has_errors(&state.current.field_sets(Scope::Flat)?);
            state.form_in_error = in_error;
            return Ok(!in_error);
        }

        let names = self.schema_field_names(&state.current, scope)?;
        let mut resolved = state.current.field_set(scope)?.clone();
        let mut in_error = false;
        for name in &names {
            // Errors never feed back into resolution, so every field sees the same values.
            let error = resolve_error(state.current.field_set(scope)?, name, &required_message)
                .map_err(|error| scoped(error, scope))?;
            in_error |= !error.is_empty();
            let record = resolved
                .get(name)
                .ok_or_else(|| unknown_field(name, scope))?
                .with_error(error);
            resolved.insert(name.clone(), record);
        }

        *Arc::make_mut(&mut state.current).field_set_mut(scope)? = resolved;
        state.form_in_error = in_error;
        if in_error {
            log::debug!("validation left {:?} in error", scope);
        }
        Ok(!in_error)
    }

    pub fn is_in_error(&self, scope: Scope<'_>) -> FormResult<bool> {
        let state = read_lock(&self.state, "checking form errors")?;
        Ok(has_errors(&state.current.field_sets(scope)?))
    }

    /// Whether no field (or, with `required_only`, no required field) in the
    /// targeted set holds a value. Non-required fields are ignored entirely
    /// when `required_only` is set.
    pub fn is_empty(&self, required_only: bool, scope: Scope<'_>) -> FormResult<bool> {
        let state = read_lock(&self.state, "checking form emptiness")?;
        Ok(state
            .current
            .field_sets(scope)?
            .iter()
            .flat_map(|(_, fields)| fields.iter())
            .filter(|(_, record)| !required_only || record.required)
            .all(|(_, record)| record.value.is_empty()))
    }

    /// Compares current values against the pristine snapshot. Fields the
    /// snapshot does not know are not compared; a snapshot field missing from
    /// the current state counts as modified.
    pub fn is_pristine(&self, scope: Scope<'_>) -> FormResult<bool> {
        let state = read_lock(&self.state, "checking pristine state")?;
        let baseline = match state.pristine.field_sets(scope) {
            Ok(sets) => sets,
            Err(FormError::UnknownForm(_)) => return Ok(true),
            Err(error) => return Err(error),
        };
        Ok(baseline.iter().all(|(form, fields)| {
            fields.iter().all(|(name, initial)| {
                state
                    .current
                    .locate(*form, name)
                    .is_some_and(|record: &FieldRecord| record.value == initial.value)
            })
        }))
    }

    /// The construction schema is authoritative for which fields exist; a
    /// scope it cannot address falls back to the current state.
    fn schema_field_names(&self, current: &FormState, scope: Scope<'_>) -> FormResult<Vec<String>> {
        let fields = self
            .schema
            .field_set(scope)
            .or_else(|_| current.field_set(scope))?;
        Ok(fields.names().map(str::to_string).collect())
    }
}
