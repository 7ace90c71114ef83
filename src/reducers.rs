//! Per-field merge policies.
//!
//! Every declared state field carries exactly one [`MergePolicy`], resolved
//! when the field is declared and never inferred from value types at merge
//! time. The policy decides how a node's partial update is folded into the
//! current value of that field.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::state::FieldKind;

/// How a field's partial update combines with its current value.
///
/// # Examples
///
/// ```
/// use relaygraph::reducers::MergePolicy;
/// use serde_json::json;
///
/// let mut transcript = json!(["a1"]);
/// MergePolicy::Append.apply(&mut transcript, json!(["b1"])).unwrap();
/// assert_eq!(transcript, json!(["a1", "b1"]));
///
/// let mut calls = json!(1);
/// MergePolicy::Sum.apply(&mut calls, json!(1)).unwrap();
/// assert_eq!(calls, json!(2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergePolicy {
    /// Concatenate the update sequence after the existing elements,
    /// preserving the order supplied by the node. Accumulating fields only.
    Append,
    /// Overwrite the current value with the update. Scalar default.
    Replace,
    /// Numeric addition of current and update.
    Sum,
    /// Keep the larger of current and update.
    Max,
}

/// Failure while applying a merge policy to a field value.
#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    /// Append was handed something other than a JSON array.
    #[error("append merge requires a sequence, got {got}")]
    #[diagnostic(
        code(relaygraph::reducers::not_a_sequence),
        help("Accumulating fields hold JSON arrays; supply the elements to append as an array.")
    )]
    NotASequence { got: &'static str },

    /// Sum/Max was handed a non-numeric value.
    #[error("{policy:?} merge requires numeric values, got {got}")]
    #[diagnostic(code(relaygraph::reducers::not_a_number))]
    NotANumber {
        policy: MergePolicy,
        got: &'static str,
    },
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl MergePolicy {
    /// Returns true if this policy is valid for fields of `kind`.
    #[must_use]
    pub fn supports(&self, kind: FieldKind) -> bool {
        match self {
            MergePolicy::Append => kind == FieldKind::Accumulating,
            MergePolicy::Replace | MergePolicy::Sum | MergePolicy::Max => {
                kind == FieldKind::Scalar
            }
        }
    }

    /// The initial value a freshly created state assigns to a field governed
    /// by this policy.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        match self {
            MergePolicy::Append => Value::Array(Vec::new()),
            MergePolicy::Sum => Value::from(0),
            MergePolicy::Replace | MergePolicy::Max => Value::Null,
        }
    }

    /// Folds `update` into `current` according to this policy.
    ///
    /// Deterministic and order-preserving: `Append` places the update's
    /// elements after the existing ones in the order the node supplied them.
    pub fn apply(&self, current: &mut Value, update: Value) -> Result<(), MergeError> {
        match self {
            MergePolicy::Append => {
                let Value::Array(additions) = update else {
                    return Err(MergeError::NotASequence {
                        got: type_name(&update),
                    });
                };
                let Value::Array(existing) = current else {
                    return Err(MergeError::NotASequence {
                        got: type_name(current),
                    });
                };
                existing.extend(additions);
                Ok(())
            }
            MergePolicy::Replace => {
                *current = update;
                Ok(())
            }
            MergePolicy::Sum => {
                let sum = match (current.as_i64(), update.as_i64()) {
                    // Integral addition widens to f64 on overflow instead of
                    // panicking or wrapping.
                    (Some(a), Some(b)) => match a.checked_add(b) {
                        Some(total) => Value::from(total),
                        None => Value::from(a as f64 + b as f64),
                    },
                    _ => {
                        let a = numeric(self, current)?;
                        let b = numeric(self, &update)?;
                        Value::from(a + b)
                    }
                };
                *current = sum;
                Ok(())
            }
            MergePolicy::Max => {
                if current.is_null() {
                    numeric(self, &update)?;
                    *current = update;
                    return Ok(());
                }
                let a = numeric(self, current)?;
                let b = numeric(self, &update)?;
                if b > a {
                    *current = update;
                }
                Ok(())
            }
        }
    }
}

fn numeric(policy: &MergePolicy, v: &Value) -> Result<f64, MergeError> {
    v.as_f64().ok_or(MergeError::NotANumber {
        policy: *policy,
        got: type_name(v),
    })
}
