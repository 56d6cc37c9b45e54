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

//! Typed command templating for shell-style task parameters.
//!
//! Per-branch commands (file transfers, load statements) are built from a
//! [`CommandTemplate`] rather than ad-hoc string interpolation: the template
//! is validated once at parse time, and rendering fails loudly when a
//! placeholder has no matching parameter.
//!
//! ```rust
//! use trestle::{CommandTemplate, ParamValue};
//! use indexmap::IndexMap;
//!
//! let template = CommandTemplate::parse("transfer -f {local_dir}{file} {remote_dir}{channel}/")?;
//! assert_eq!(template.placeholders(), vec!["local_dir", "file", "remote_dir", "channel"]);
//!
//! let mut params: IndexMap<String, ParamValue> = IndexMap::new();
//! params.insert("local_dir".into(), "/tmp/".into());
//! params.insert("file".into(), "in_alpha_2021-01-01.csv".into());
//! params.insert("remote_dir".into(), "/stage/".into());
//! params.insert("channel".into(), "in_alpha".into());
//!
//! let command = template.render(&params)?;
//! assert_eq!(command, "transfer -f /tmp/in_alpha_2021-01-01.csv /stage/in_alpha/");
//! # Ok::<(), trestle::TemplateError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::IndexMap;

use crate::error::TemplateError;
use crate::task::ParamValue;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A command string with `{name}` placeholders, validated at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    /// Parse a template, rejecting malformed placeholder syntax.
    ///
    /// # Errors
    ///
    /// * [`TemplateError::UnterminatedPlaceholder`] for a `{` with no `}`
    /// * [`TemplateError::EmptyPlaceholder`] for `{}`
    /// * [`TemplateError::UnmatchedClose`] for a stray `}`
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(TemplateError::UnterminatedPlaceholder {
                                    position: inner_pos,
                                })
                            }
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnterminatedPlaceholder { position: pos });
                    }
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder { position: pos });
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(TemplateError::UnmatchedClose { position: pos }),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Placeholder names in first-appearance order, deduplicated.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !seen.contains(&name.as_str()) {
                    seen.push(name.as_str());
                }
            }
        }
        seen
    }

    /// Substitute every placeholder from `params`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingParam`] for the first placeholder
    /// with no matching key. Extra parameters are ignored.
    pub fn render(&self, params: &IndexMap<String, ParamValue>) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| TemplateError::MissingParam(name.clone()))?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}

impl Display for CommandTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.raw)
    }
}
