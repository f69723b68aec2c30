use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::binding::SubmitEvent;
use super::record::{FieldRecord, FieldValue, FormState, Scope};
use crate::i18n::{I18nManager, Locale, REQUIRED_FIELD_KEY, SUBMIT_FAILED_KEY};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationMode {
    #[default]
    Manual,
    OnChange,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
    pub locale: Locale,
    /// Replaces the catalog's default message for empty required fields.
    pub required_message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub state: Arc<FormState>,
    pub pristine: Arc<FormState>,
    pub form_in_error: bool,
    pub is_submitting: bool,
    pub submit_state: SubmitState,
    pub submit_count: u32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    UnknownField {
        form: Option<String>,
        field: String,
    },
    UnknownForm(String),
    FormNameRequired,
    NotAWizard(String),
    InvalidPattern {
        pattern: String,
        reason: String,
    },
    InvalidSchema(String),
    TypeMismatch {
        field: String,
        expected: &'static str,
    },
    InvalidStateTransition {
        from: SubmitState,
        to: SubmitState,
    },
    SubmitFailed(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::UnknownField {
                form: Some(form),
                field,
            } => write!(f, "unknown field `{field}` in form `{form}`"),
            FormError::UnknownField { form: None, field } => write!(f, "unknown field `{field}`"),
            FormError::UnknownForm(name) => write!(f, "unknown form `{name}`"),
            FormError::FormNameRequired => {
                f.write_str("a form name is required to address a field of a wizard")
            }
            FormError::NotAWizard(name) => {
                write!(f, "form `{name}` was requested but the form state is flat")
            }
            FormError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid validator pattern `{pattern}`: {reason}")
            }
            FormError::InvalidSchema(reason) => write!(f, "invalid form schema: {reason}"),
            FormError::TypeMismatch { field, expected } => {
                write!(f, "field `{field}` does not hold a {expected} value")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
            FormError::SubmitFailed(reason) => write!(f, "form submit failed: {reason}"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub type BoxedSubmitFuture = Pin<Box<dyn Future<Output = FormResult<()>> + Send + 'static>>;

pub(super) type SubmitHandlerFn = Arc<dyn Fn() -> BoxedSubmitFuture + Send + Sync>;

pub(super) struct ControllerState {
    pub(super) current: Arc<FormState>,
    pub(super) pristine: Arc<FormState>,
    pub(super) form_in_error: bool,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) submit_pending: bool,
    /// Bumped by `reset`; a callback started before a reset no longer owns the machine.
    pub(super) submit_generation: u64,
    /// Generation of the callback currently running, if any.
    pub(super) submit_in_flight: Option<u64>,
}

#[derive(Clone)]
pub struct FormController {
    pub(super) options: FormOptions,
    pub(super) schema: Arc<FormState>,
    pub(super) i18n: I18nManager,
    pub(super) state: Arc<RwLock<ControllerState>>,
    pub(super) on_submit: SubmitHandlerFn,
}

impl FormController {
    pub fn new<F, Fut>(schema: impl Into<FormState>, options: FormOptions, on_submit: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FormResult<()>> + Send + 'static,
    {
        let schema = Arc::new(schema.into());
        let on_submit: SubmitHandlerFn =
            Arc::new(move || -> BoxedSubmitFuture { Box::pin(on_submit()) });
        Self {
            i18n: I18nManager::with_locale(options.locale.clone()),
            options,
            state: Arc::new(RwLock::new(ControllerState {
                current: schema.clone(),
                pristine: schema.clone(),
                form_in_error: false,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                submit_pending: false,
                submit_generation: 0,
                submit_in_flight: None,
            })),
            schema,
            on_submit,
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn schema(&self) -> &FormState {
        &self.schema
    }

    pub fn i18n(&self) -> &I18nManager {
        &self.i18n
    }

    pub fn required_message(&self) -> String {
        self.options
            .required_message
            .clone()
            .unwrap_or_else(|| self.i18n.t(REQUIRED_FIELD_KEY))
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            state: state.current.clone(),
            pristine: state.pristine.clone(),
            form_in_error: state.form_in_error,
            is_submitting: state.submit_state == SubmitState::Submitting,
            submit_state: state.submit_state,
            submit_count: state.submit_count,
        })
    }

    pub fn state(&self) -> FormResult<Arc<FormState>> {
        Ok(read_lock(&self.state, "reading form state")?.current.clone())
    }

    pub fn form_in_error(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading form error flag")?.form_in_error)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(read_lock(&self.state, "reading submit flag")?.submit_state == SubmitState::Submitting)
    }

    pub fn field(&self, name: &str, scope: Scope<'_>) -> FormResult<FieldRecord> {
        read_lock(&self.state, "reading field")?
            .current
            .field(name, scope)
            .cloned()
    }

    pub fn set_field(
        &self,
        value: impl Into<FieldValue>,
        name: &str,
        scope: Scope<'_>,
    ) -> FormResult<()> {
        let value = value.into();
        {
            let mut state = write_lock(&self.state, "writing field value")?;
            log::trace!("setting `{name}` to `{value}`");
            Arc::make_mut(&mut state.current)
                .update_field(name, scope, |record| record.with_value(value))?;
        }

        if self.options.validate_mode == ValidationMode::OnChange {
            let _ = self.validate_field(name, scope)?;
        }
        Ok(())
    }

    pub fn set_error(
        &self,
        message: impl Into<String>,
        name: &str,
        scope: Scope<'_>,
    ) -> FormResult<()> {
        let message = message.into();
        let mut state = write_lock(&self.state, "writing field error")?;
        Arc::make_mut(&mut state.current)
            .update_field(name, scope, |record| record.with_error(message))
    }

    /// Rebases both the current state and what counts as unmodified.
    pub fn set_initial_state(&self, next: FormState) -> FormResult<()> {
        let next = Arc::new(next);
        let mut state = write_lock(&self.state, "setting initial state")?;
        state.current = next.clone();
        state.pristine = next;
        Ok(())
    }

    /// Restores `schema` (or the construction schema) and clears both flags.
    /// The pristine snapshot is left alone.
    pub fn reset(&self, schema: Option<FormState>) -> FormResult<()> {
        let next = schema.map_or_else(|| self.schema.clone(), Arc::new);
        let mut state = write_lock(&self.state, "resetting form")?;
        state.current = next;
        state.form_in_error = false;
        state.submit_pending = false;
        state.submit_generation = state.submit_generation.wrapping_add(1);
        transition_submit_state(&mut state, SubmitState::Idle)?;
        log::debug!("form reset");
        Ok(())
    }

    /// Records the intent to submit. Validates first when the whole form is
    /// targeted; the callback itself runs in [`FormController::flush_submit`].
    pub fn submit(&self, event: Option<&mut dyn SubmitEvent>, scope: Scope<'_>) -> FormResult<bool> {
        if let Some(event) = event {
            event.prevent_default();
        }
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
        }

        let validated = match scope {
            Scope::Flat => self.validate_all(Scope::Flat).map(drop),
            Scope::Named(_) => Ok(()),
        };

        let mut state = write_lock(&self.state, "finishing submit validation")?;
        if let Err(error) = validated {
            transition_submit_state(&mut state, SubmitState::Idle)?;
            return Err(error);
        }
        if state.form_in_error {
            log::warn!("submit rejected: form is in error");
            transition_submit_state(&mut state, SubmitState::Idle)?;
            return Ok(false);
        }

        transition_submit_state(&mut state, SubmitState::Submitting)?;
        if state.submit_in_flight != Some(state.submit_generation) {
            state.submit_pending = true;
        }
        Ok(true)
    }

    /// Runs the submit callback if a valid submit is pending. Returns whether
    /// the callback was invoked. Callback failures are logged, not returned.
    pub async fn flush_submit(&self) -> FormResult<bool> {
        let (handler, generation) = {
            let mut state = write_lock(&self.state, "starting submit callback")?;
            if state.submit_state != SubmitState::Submitting
                || state.form_in_error
                || !state.submit_pending
            {
                return Ok(false);
            }
            state.submit_pending = false;
            state.submit_in_flight = Some(state.submit_generation);
            (self.on_submit.clone(), state.submit_generation)
        };

        if let Err(error) = handler().await {
            log::error!("{}: {error}", self.i18n.t(SUBMIT_FAILED_KEY));
        }

        let mut state = write_lock(&self.state, "completing submit")?;
        if state.submit_in_flight == Some(generation) {
            state.submit_in_flight = None;
        }
        if state.submit_generation == generation {
            transition_submit_state(&mut state, SubmitState::Idle)?;
        } else {
            log::debug!("submit callback finished after a reset");
        }
        Ok(true)
    }

    pub async fn submit_async(
        &self,
        event: Option<&mut dyn SubmitEvent>,
        scope: Scope<'_>,
    ) -> FormResult<bool> {
        if !self.submit(event, scope)? {
            return Ok(false);
        }
        self.flush_submit().await
    }
}

pub(super) fn transition_submit_state(
    state: &mut ControllerState,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Submitting, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    log::debug!("submit state {current:?} -> {next:?}");
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
