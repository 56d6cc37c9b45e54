/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Task descriptors and their building blocks.
//!
//! A [`TaskDescriptor`] is the unit a workflow graph is assembled from: a
//! name unique within its graph, an [`ActionRef`] naming the connector
//! operation the external engine should invoke, and an ordered map of
//! scalar parameters. Descriptors carry no behavior of their own; once a
//! graph is registered, the engine owns them.
//!
//! ## Action Reference Format
//!
//! Action references are dot-separated paths into the engine's connector
//! catalog, validated at construction:
//!
//! ```rust
//! use trestle::ActionRef;
//!
//! let action = ActionRef::new("warehouse.load").unwrap();
//! assert_eq!(action.to_string(), "warehouse.load");
//!
//! assert!(ActionRef::new("warehouse..load").is_err());
//! assert!(ActionRef::new("").is_err());
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Reference to a connector operation supplied by the external engine.
///
/// The crate never resolves these; it only guarantees they are well formed
/// (one or more non-empty segments of alphanumerics, `_` or `-`, joined by
/// dots) so a malformed reference fails at assembly time instead of at the
/// engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionRef(String);

impl ActionRef {
    /// Parse and validate an action reference.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidActionRef`] if the path is empty or
    /// any segment is empty or contains characters outside
    /// `[A-Za-z0-9_-]`.
    pub fn new(path: &str) -> Result<Self, WorkflowError> {
        let valid = !path.is_empty()
            && path.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            });

        if valid {
            Ok(Self(path.to_string()))
        } else {
            Err(WorkflowError::InvalidActionRef(path.to_string()))
        }
    }

    /// The full dotted path.
    pub fn path(&self) -> &str {
        &self.0
    }

    /// Path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl Display for ActionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActionRef {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A scalar task parameter value.
///
/// Parameters are intentionally restricted to scalars; structured inputs
/// belong to the connector's own configuration, not the graph definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// A named unit of work plus its action reference and parameters.
///
/// Descriptors are immutable once added to a [`Workflow`](crate::Workflow);
/// the fluent [`with_param`](TaskDescriptor::with_param) style is the
/// intended way to build them up front.
///
/// # Examples
///
/// ```rust
/// use trestle::{ActionRef, TaskDescriptor};
///
/// let task = TaskDescriptor::new("load_events", ActionRef::new("warehouse.load")?)
///     .with_param("table", "events")
///     .with_param("partition", "2021-01-01");
///
/// assert_eq!(task.name(), "load_events");
/// assert_eq!(task.param("table").map(|v| v.to_string()), Some("events".to_string()));
/// # Ok::<(), trestle::WorkflowError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    name: String,
    action: ActionRef,
    params: IndexMap<String, ParamValue>,
}

impl TaskDescriptor {
    /// Create a descriptor with no parameters.
    pub fn new(name: &str, action: ActionRef) -> Self {
        Self {
            name: name.to_string(),
            action,
            params: IndexMap::new(),
        }
    }

    /// Attach a parameter, replacing any previous value for the key.
    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// The descriptor's name, unique within its graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The connector operation this descriptor points at.
    pub fn action(&self) -> &ActionRef {
        &self.action
    }

    /// All parameters in declaration order.
    pub fn params(&self) -> &IndexMap<String, ParamValue> {
        &self.params
    }

    /// Look up a single parameter.
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }
}
