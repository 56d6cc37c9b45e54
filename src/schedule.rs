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

//! Schedule cadence metadata for workflow graphs.
//!
//! A [`Cadence`] is graph-level metadata handed to the external engine at
//! registration; this crate never evaluates it. Expressions are validated
//! with `croner` at construction so a bad cron string fails during
//! assembly, not at engine time.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use croner::Cron;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// How often the external engine should run a graph.
///
/// Holds a validated five-field cron expression. The conventional `@`
/// presets are accepted as input and normalized to their cron equivalents.
///
/// # Examples
///
/// ```rust
/// use trestle::Cadence;
///
/// assert_eq!(Cadence::daily().expression(), "0 0 * * *");
/// assert_eq!("@hourly".parse::<Cadence>()?.expression(), "0 * * * *");
/// assert!(Cadence::cron("not a cron").is_err());
/// # Ok::<(), trestle::ScheduleError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cadence {
    expression: String,
}

impl Cadence {
    /// Validate and wrap a cron expression.
    pub fn cron(expression: &str) -> Result<Self, ScheduleError> {
        Cron::new(expression)
            .parse()
            .map_err(|source| ScheduleError::InvalidCron {
                pattern: expression.to_string(),
                source,
            })?;
        Ok(Self {
            expression: expression.to_string(),
        })
    }

    /// Every hour, on the hour.
    pub fn hourly() -> Self {
        Self {
            expression: "0 * * * *".to_string(),
        }
    }

    /// Every day at midnight.
    pub fn daily() -> Self {
        Self {
            expression: "0 0 * * *".to_string(),
        }
    }

    /// Every Sunday at midnight.
    pub fn weekly() -> Self {
        Self {
            expression: "0 0 * * 0".to_string(),
        }
    }

    /// The first of every month at midnight.
    pub fn monthly() -> Self {
        Self {
            expression: "0 0 1 * *".to_string(),
        }
    }

    /// The underlying cron expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl Display for Cadence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.expression)
    }
}

impl FromStr for Cadence {
    type Err = ScheduleError;

    /// Accepts either an `@` preset or a raw cron expression.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "@hourly" => Ok(Self::hourly()),
            "@daily" | "@midnight" => Ok(Self::daily()),
            "@weekly" => Ok(Self::weekly()),
            "@monthly" => Ok(Self::monthly()),
            preset if preset.starts_with('@') => {
                Err(ScheduleError::UnknownPreset(preset.to_string()))
            }
            expression => Self::cron(expression),
        }
    }
}
