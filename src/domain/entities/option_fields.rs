use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::{ValidateLength, ValidationError};

/// Tri-state field for partial updates.
///
/// - `Unchanged` → key absent from the payload
/// - `SetToNull` → explicit `null`
/// - `SetToValue` → set to provided value
///
/// Request structs mark these fields `#[serde(default)]` so an absent key
/// stays `Unchanged`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OptionField<T> {
    #[default]
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => OptionField::SetToValue(value),
            None => OptionField::SetToNull,
        })
    }
}

/// Both `Unchanged` and `SetToNull` serialize as `null`.
impl<T> Serialize for OptionField<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            OptionField::SetToValue(value) => serializer.serialize_some(value),
            _ => serializer.serialize_none(),
        }
    }
}

// ---------------------- Validation support ----------------------

impl<T> ValidateLength<u64> for OptionField<T>
where
    T: ValidateLength<u64>,
{
    fn length(&self) -> Option<u64> {
        match self {
            OptionField::SetToValue(value) => value.length(),
            _ => None,
        }
    }

    fn validate_length(&self, min: Option<u64>, max: Option<u64>, equal: Option<u64>) -> bool {
        match self {
            OptionField::SetToValue(value) => value.validate_length(min, max, equal),
            _ => true,
        }
    }
}

impl<T> OptionField<T> {
    /// Convert to nested option:
    /// - `None` → unchanged
    /// - `Some(None)` → set null
    /// - `Some(Some(T))` → set to value
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::SetToNull => Some(None),
            Self::SetToValue(v) => Some(Some(v)),
        }
    }

    pub fn map_value<U, F: FnOnce(T) -> U>(self, f: F) -> OptionField<U> {
        match self {
            Self::Unchanged => OptionField::Unchanged,
            Self::SetToNull => OptionField::SetToNull,
            Self::SetToValue(v) => OptionField::SetToValue(f(v)),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn value_ref(&self) -> Option<&T> {
        if let Self::SetToValue(v) = self {
            Some(v)
        } else {
            None
        }
    }

    /// Writes the change into `target`, leaving it alone when `Unchanged`.
    pub fn apply_to(&self, target: &mut Option<T>)
    where
        T: Clone,
    {
        if let Some(next) = self.clone().into_option() {
            *target = next;
        }
    }
}

impl OptionField<String> {
    /// Treats a blank string as an explicit clear.
    pub fn blank_as_null(self) -> Self {
        match self {
            OptionField::SetToValue(s) if s.trim().is_empty() => OptionField::SetToNull,
            other => other,
        }
    }

    /// Runs `check` against a provided non-blank value.
    pub fn validate_with(
        &self,
        check: impl Fn(&str) -> Result<(), ValidationError>,
    ) -> Result<(), ValidationError> {
        match self {
            OptionField::SetToValue(s) if !s.trim().is_empty() => check(s),
            _ => Ok(()),
        }
    }
}

impl<T> From<Option<Option<T>>> for OptionField<T> {
    fn from(opt: Option<Option<T>>) -> Self {
        match opt {
            None => OptionField::Unchanged,
            Some(None) => OptionField::SetToNull,
            Some(Some(v)) => OptionField::SetToValue(v),
        }
    }
}

pub type PatchString = OptionField<String>;
