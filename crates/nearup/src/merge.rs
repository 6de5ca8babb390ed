//! Deep merging of JSON documents.
//!
//! Overrides supplied by the user are merged onto the files generated by the
//! node binary. Mappings are always merged key by key; what happens to every
//! other pair of values is decided by a [`MergeStrategy`].

use std::fmt;

use serde_json::Value;

/// How values present in both documents are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// The override value replaces the base value, whatever their kinds.
    Replace,
    /// Like [`MergeStrategy::Replace`], but sequences are concatenated.
    Additive,
    /// The override replaces the base, but a container never replaces a
    /// scalar (or vice versa).
    #[default]
    TypesafeReplace,
    /// [`MergeStrategy::Additive`] with the same kind check as
    /// [`MergeStrategy::TypesafeReplace`].
    TypesafeAdditive,
}

impl MergeStrategy {
    fn is_typesafe(self) -> bool {
        matches!(self, Self::TypesafeReplace | Self::TypesafeAdditive)
    }

    fn is_additive(self) -> bool {
        matches!(self, Self::Additive | Self::TypesafeAdditive)
    }
}

/// The kind of a JSON value, as reported in merge conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Sequence,
            Value::Object(_) => Self::Mapping,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, Self::Sequence | Self::Mapping)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// Errors that may occur when merging two documents.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The base and the override disagree on the kind of value at `path`.
    #[error("type mismatch at `{path}`: cannot merge {overriding} into {base}")]
    TypeConflict {
        path: String,
        base: ValueKind,
        overriding: ValueKind,
    },
}

/// Merge `overrides` into `base` in place.
///
/// On error `base` may have been partially updated; callers abort on failure.
pub fn merge(
    base: &mut Value,
    overrides: &Value,
    strategy: MergeStrategy,
) -> Result<(), MergeError> {
    merge_at(base, overrides, strategy, &mut String::new())
}

fn merge_at(
    base: &mut Value,
    overrides: &Value,
    strategy: MergeStrategy,
    path: &mut String,
) -> Result<(), MergeError> {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => {
                        let len = path.len();
                        if !path.is_empty() {
                            path.push('.');
                        }
                        path.push_str(key);
                        merge_at(existing, value, strategy, path)?;
                        path.truncate(len);
                    }
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
            Ok(())
        }
        (base, overrides) => {
            let base_kind = ValueKind::of(base);
            let override_kind = ValueKind::of(overrides);
            let mismatched = if base_kind.is_container() || override_kind.is_container() {
                base_kind != override_kind
            } else {
                false
            };
            if strategy.is_typesafe() && mismatched {
                return Err(MergeError::TypeConflict {
                    path: if path.is_empty() {
                        "<root>".to_string()
                    } else {
                        path.clone()
                    },
                    base: base_kind,
                    overriding: override_kind,
                });
            }

            match (base, overrides) {
                (Value::Array(items), Value::Array(extra)) if strategy.is_additive() => {
                    items.extend(extra.iter().cloned());
                }
                (base, overrides) => *base = overrides.clone(),
            }
            Ok(())
        }
    }
}
