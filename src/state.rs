//! Shared-state model: declared fields, merge policies, and partial updates.
//!
//! State is a mapping from declared field name to a JSON value. Fields come in
//! two kinds: *accumulating* fields hold an ordered sequence merged by
//! concatenation, *scalar* fields hold a single value merged by a configurable
//! policy. The schema is fixed before compilation; the executor owns the state
//! for the lifetime of one run and applies every node's [`StatePartial`]
//! through [`State::merge`].
//!
//! # Examples
//!
//! ```
//! use relaygraph::reducers::MergePolicy;
//! use relaygraph::state::{State, StateSchema, StatePartial};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     StateSchema::builder()
//!         .accumulating("transcript")
//!         .scalar("calls", MergePolicy::Sum)
//!         .unwrap()
//!         .build(),
//! );
//!
//! let mut state = State::new(schema);
//! let update = StatePartial::new()
//!     .with_field("transcript", json!(["a1"]))
//!     .with_field("calls", json!(1));
//! state.merge(&update).unwrap();
//!
//! assert_eq!(state.get("transcript"), Some(&json!(["a1"])));
//! assert_eq!(state.get("calls"), Some(&json!(1)));
//! ```

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::reducers::{MergeError, MergePolicy};

/// The two supported field kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Ordered sequence; partial updates supply elements to append.
    Accumulating,
    /// Single value; partial updates supply a replacement candidate.
    Scalar,
}

/// Declared shape of one state field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub policy: MergePolicy,
}

/// Error raised while declaring schema fields.
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    /// A field was redeclared with a different kind.
    #[error("field `{field}` is already declared as {existing:?}, cannot redeclare as {requested:?}")]
    #[diagnostic(
        code(relaygraph::state::kind_conflict),
        help("Declare each field once; the kind is fixed for the lifetime of the schema.")
    )]
    KindConflict {
        field: String,
        existing: FieldKind,
        requested: FieldKind,
    },

    /// The merge policy does not apply to the field kind.
    #[error("merge policy {policy:?} is not valid for {kind:?} field `{field}`")]
    #[diagnostic(
        code(relaygraph::state::policy_unsupported),
        help("Accumulating fields take Append; scalar fields take Replace, Sum, or Max.")
    )]
    PolicyUnsupported {
        field: String,
        kind: FieldKind,
        policy: MergePolicy,
    },
}

/// Error raised while merging a partial update into state.
#[derive(Debug, Error, Diagnostic)]
pub enum StateError {
    /// The partial update referenced a field the schema never declared.
    #[error("unknown state field `{field}`")]
    #[diagnostic(
        code(relaygraph::state::unknown_field),
        help("Every field a node writes must be declared in the schema before compilation.")
    )]
    UnknownField { field: String },

    /// The field's merge policy rejected the update value.
    #[error("merge failed for field `{field}`")]
    #[diagnostic(code(relaygraph::state::merge))]
    Merge {
        field: String,
        #[source]
        source: MergeError,
    },
}

/// The declared field set with per-field merge policies.
///
/// Immutable once shared with a graph; declaration happens up front, either
/// via [`StateSchema::declare`] or the fluent [`SchemaBuilder`].
#[derive(Clone, Debug, Default)]
pub struct StateSchema {
    fields: FxHashMap<String, FieldSpec>,
    order: Vec<String>,
}

impl StateSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent construction; see [`SchemaBuilder`].
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Registers a field with its kind and merge policy.
    ///
    /// Redeclaring a field with the same kind overwrites its policy;
    /// redeclaring with a different kind fails with
    /// [`SchemaError::KindConflict`]. Policies that do not apply to the kind
    /// fail with [`SchemaError::PolicyUnsupported`].
    pub fn declare(
        &mut self,
        field: impl Into<String>,
        kind: FieldKind,
        policy: MergePolicy,
    ) -> Result<&mut Self, SchemaError> {
        let field = field.into();
        if !policy.supports(kind) {
            return Err(SchemaError::PolicyUnsupported {
                field,
                kind,
                policy,
            });
        }
        if let Some(existing) = self.fields.get(&field) {
            if existing.kind != kind {
                return Err(SchemaError::KindConflict {
                    field,
                    existing: existing.kind,
                    requested: kind,
                });
            }
        } else {
            self.order.push(field.clone());
        }
        self.fields.insert(field, FieldSpec { kind, policy });
        Ok(self)
    }

    /// Looks up the spec for a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.order
    }
}

/// Fluent schema construction.
///
/// ```
/// use relaygraph::reducers::MergePolicy;
/// use relaygraph::state::StateSchema;
///
/// let schema = StateSchema::builder()
///     .accumulating("transcript")
///     .scalar("calls", MergePolicy::Sum)
///     .unwrap()
///     .build();
/// assert!(schema.contains("transcript"));
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: StateSchema,
}

impl SchemaBuilder {
    /// Declares an accumulating field (always `Append`).
    #[must_use]
    pub fn accumulating(mut self, field: impl Into<String>) -> Self {
        // Append on an accumulating field cannot fail validation.
        self.schema
            .declare(field, FieldKind::Accumulating, MergePolicy::Append)
            .expect("append is valid for accumulating fields");
        self
    }

    /// Declares a scalar field with an explicit policy.
    pub fn scalar(
        mut self,
        field: impl Into<String>,
        policy: MergePolicy,
    ) -> Result<Self, SchemaError> {
        self.schema.declare(field, FieldKind::Scalar, policy)?;
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> StateSchema {
        self.schema
    }
}

/// Partial state update returned by node execution.
///
/// Only the fields a node wants to change are present; the executor merges
/// each one according to its declared policy.
#[derive(Clone, Debug, Default)]
pub struct StatePartial {
    fields: FxHashMap<String, Value>,
}

impl StatePartial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or overwrites) one field update.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Field names referenced by this update, sorted for deterministic
    /// processing.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// The shared state for one execution.
///
/// Created once per run with initial values supplied by the caller, mutated
/// only through [`State::merge`], and returned to the caller when the schedule
/// is exhausted.
#[derive(Clone, Debug)]
pub struct State {
    values: FxHashMap<String, Value>,
    schema: Arc<StateSchema>,
}

impl State {
    /// Creates a state with every declared field at its policy's initial
    /// value (`Append` -> empty array, `Sum` -> 0, otherwise null).
    #[must_use]
    pub fn new(schema: Arc<StateSchema>) -> Self {
        let mut values = FxHashMap::default();
        for name in schema.field_names() {
            let spec = schema.field(name).expect("declared field has a spec");
            values.insert(name.clone(), spec.policy.initial_value());
        }
        Self { values, schema }
    }

    /// Seeds one field with a caller-supplied initial value.
    pub fn with_value(
        mut self,
        field: impl Into<String>,
        value: Value,
    ) -> Result<Self, StateError> {
        let field = field.into();
        if !self.schema.contains(&field) {
            return Err(StateError::UnknownField { field });
        }
        self.values.insert(field, value);
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<StateSchema> {
        &self.schema
    }

    /// Current values, keyed by field name.
    #[must_use]
    pub fn values(&self) -> &FxHashMap<String, Value> {
        &self.values
    }

    /// Applies every field present in `partial` using that field's declared
    /// merge policy. Fields are processed in sorted-name order so error
    /// surfaces are deterministic.
    pub fn merge(&mut self, partial: &StatePartial) -> Result<(), StateError> {
        for field in partial.field_names() {
            let update = partial
                .get(field)
                .expect("field_names lists only present fields")
                .clone();
            let Some(spec) = self.schema.field(field) else {
                return Err(StateError::UnknownField {
                    field: field.to_string(),
                });
            };
            let current = self
                .values
                .entry(field.to_string())
                .or_insert_with(|| spec.policy.initial_value());
            spec.policy
                .apply(current, update)
                .map_err(|source| StateError::Merge {
                    field: field.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl PartialEq for State {
    /// Two states are equal when their field values are equal; the schema
    /// handle is intentionally ignored.
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}
