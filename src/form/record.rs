use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::controller::{FormError, FormResult};

/// Addresses either the root of a form state or one wizard sub-form.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Scope<'a> {
    #[default]
    Flat,
    Named(&'a str),
}

impl<'a> Scope<'a> {
    pub fn form_name(self) -> Option<&'a str> {
        match self {
            Scope::Flat => None,
            Scope::Named(name) => Some(name),
        }
    }
}

impl<'a> From<&'a str> for Scope<'a> {
    fn from(value: &'a str) -> Self {
        Scope::Named(value)
    }
}

impl<'a> From<Option<&'a str>> for Scope<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Scope::Flat, Scope::Named)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// Text is empty when it has no characters, a flag when it is unset.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Bool(flag) => !flag,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            FieldValue::Text(_) => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// A pattern that non-empty text values must match, with the message shown otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldValidator {
    #[serde(serialize_with = "serialize_pattern", deserialize_with = "deserialize_pattern")]
    pattern: Regex,
    message: String,
}

impl FieldValidator {
    pub fn new(pattern: &str, message: impl Into<String>) -> FormResult<Self> {
        let pattern = Regex::new(pattern).map_err(|error| FormError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: error.to_string(),
        })?;
        Ok(Self {
            pattern,
            message: message.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Booleans carry no text to match and always pass.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Text(text) => self.pattern.is_match(text),
            FieldValue::Bool(_) => true,
        }
    }
}

impl PartialEq for FieldValidator {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.message == other.message
    }
}

impl Eq for FieldValidator {}

fn serialize_pattern<S>(pattern: &Regex, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(pattern.as_str())
}

fn deserialize_pattern<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Regex::new(&raw).map_err(serde::de::Error::custom)
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldRecord {
    pub value: FieldValue,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<FieldValidator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

impl FieldRecord {
    pub fn new(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn required_error(mut self, message: impl Into<String>) -> Self {
        self.required_error = Some(message.into());
        self
    }

    pub fn validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.depends_on = Some(field.into());
        self
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    pub(super) fn with_value(&self, value: FieldValue) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    pub(super) fn with_error(&self, error: String) -> Self {
        Self {
            error,
            ..self.clone()
        }
    }
}

/// The field records of one form, keyed by field name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet {
    records: BTreeMap<String, FieldRecord>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, record: FieldRecord) -> Self {
        self.records.insert(name.into(), record);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, record: FieldRecord) -> Option<FieldRecord> {
        self.records.insert(name.into(), record)
    }

    pub fn get(&self, name: &str) -> Option<&FieldRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRecord)> {
        self.records
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }

    pub(super) fn replace(&mut self, name: &str, record: FieldRecord) {
        if let Some(slot) = self.records.get_mut(name) {
            *slot = record;
        }
    }
}

impl<K: Into<String>> FromIterator<(K, FieldRecord)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, FieldRecord)>>(iter: I) -> Self {
        Self {
            records: iter
                .into_iter()
                .map(|(name, record)| (name.into(), record))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormState {
    Flat(FieldSet),
    Wizard(BTreeMap<String, FieldSet>),
}

impl Default for FormState {
    fn default() -> Self {
        FormState::Flat(FieldSet::default())
    }
}

impl From<FieldSet> for FormState {
    fn from(value: FieldSet) -> Self {
        FormState::Flat(value)
    }
}

impl FormState {
    pub fn wizard<K, I>(forms: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldSet)>,
    {
        FormState::Wizard(
            forms
                .into_iter()
                .map(|(name, fields)| (name.into(), fields))
                .collect(),
        )
    }

    pub fn from_json(source: &str) -> FormResult<Self> {
        serde_json::from_str(source).map_err(|error| FormError::InvalidSchema(error.to_string()))
    }

    pub fn to_json(&self) -> FormResult<String> {
        serde_json::to_string_pretty(self).map_err(|error| FormError::InvalidSchema(error.to_string()))
    }

    pub fn is_wizard(&self) -> bool {
        matches!(self, FormState::Wizard(_))
    }

    pub fn form_names(&self) -> impl Iterator<Item = &str> {
        let forms = match self {
            FormState::Flat(_) => None,
            FormState::Wizard(forms) => Some(forms.keys().map(String::as_str)),
        };
        forms.into_iter().flatten()
    }

    /// The one field set a single-field operation addresses.
    pub fn field_set(&self, scope: Scope<'_>) -> FormResult<&FieldSet> {
        match (self, scope) {
            (FormState::Flat(fields), Scope::Flat) => Ok(fields),
            (FormState::Flat(_), Scope::Named(name)) => Err(FormError::NotAWizard(name.to_string())),
            (FormState::Wizard(_), Scope::Flat) => Err(FormError::FormNameRequired),
            (FormState::Wizard(forms), Scope::Named(name)) => forms
                .get(name)
                .ok_or_else(|| FormError::UnknownForm(name.to_string())),
        }
    }

    pub(super) fn field_set_mut(&mut self, scope: Scope<'_>) -> FormResult<&mut FieldSet> {
        match (self, scope) {
            (FormState::Flat(fields), Scope::Flat) => Ok(fields),
            (FormState::Flat(_), Scope::Named(name)) => Err(FormError::NotAWizard(name.to_string())),
            (FormState::Wizard(_), Scope::Flat) => Err(FormError::FormNameRequired),
            (FormState::Wizard(forms), Scope::Named(name)) => forms
                .get_mut(name)
                .ok_or_else(|| FormError::UnknownForm(name.to_string())),
        }
    }

    /// Every field set a read operation spans: the root of a wizard covers all its sub-forms.
    pub fn field_sets<'s>(
        &'s self,
        scope: Scope<'s>,
    ) -> FormResult<Vec<(Option<&'s str>, &'s FieldSet)>> {
        match (self, scope) {
            (FormState::Wizard(forms), Scope::Flat) => Ok(forms
                .iter()
                .map(|(name, fields)| (Some(name.as_str()), fields))
                .collect()),
            _ => Ok(vec![(scope.form_name(), self.field_set(scope)?)]),
        }
    }

    pub fn field(&self, name: &str, scope: Scope<'_>) -> FormResult<&FieldRecord> {
        self.field_set(scope)?
            .get(name)
            .ok_or_else(|| unknown_field(name, scope))
    }

    /// Looks up a field by the sub-form it was found in rather than by scope.
    pub(super) fn locate(&self, form: Option<&str>, name: &str) -> Option<&FieldRecord> {
        match (self, form) {
            (FormState::Flat(fields), None) => fields.get(name),
            (FormState::Wizard(forms), Some(form)) => forms.get(form)?.get(name),
            _ => None,
        }
    }

    /// Copies the addressed record, applies `update`, and swaps the copy in.
    pub(super) fn update_field(
        &mut self,
        name: &str,
        scope: Scope<'_>,
        update: impl FnOnce(&FieldRecord) -> FieldRecord,
    ) -> FormResult<()> {
        let fields = self.field_set_mut(scope)?;
        let next = update(fields.get(name).ok_or_else(|| unknown_field(name, scope))?);
        fields.replace(name, next);
        Ok(())
    }
}

pub(super) fn unknown_field(name: &str, scope: Scope<'_>) -> FormError {
    FormError::UnknownField {
        form: scope.form_name().map(str::to_string),
        field: name.to_string(),
    }
}
