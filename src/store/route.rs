//! Route templates: compile a path pattern once, render node paths from it.
//!
//! # Syntax
//!
//! A template is a `/`-delimited list of segments. A segment is either
//! static text or a named param:
//!
//! | Segment         | Meaning                                                  |
//! |-----------------|----------------------------------------------------------|
//! | `blog`          | static text, kept verbatim                               |
//! | `:title`        | field `title`, slugified                                 |
//! | `:title_raw`    | field `title`, percent-encoded verbatim                  |
//! | `:author__name` | nested field `author.name`                               |
//! | `:tags+`        | list field expanded into segments, must be non-empty     |
//! | `:tags*`        | list field expanded into segments, may be empty          |
//! | `:year` `:month` `:day` | parts of the configured date field, in UTC       |
//!
//! `:slug` falls back to `title` when a node has no `slug` field, and
//! reference values render as the referenced id.
//!
//! # Example
//!
//! ```text
//! /:year/:month/:day/:slug
//!     date  = "2018-09-04T23:20:33.918Z"
//!     title = "Lorem Ipsum"
//!   → /2018/09/04/lorem-ipsum
//! ```

use super::value::{FieldMap, Reference};
use super::node::lookup_path;
use crate::utils::date::{date_parts, parse_date_value};
use crate::utils::slug::{encode_raw, slugify};
use rustc_hash::FxHashMap;
use serde_json::Value;
use smallvec::SmallVec;
use thiserror::Error;

const RAW_SUFFIX: &str = "_raw";
const NESTED_SEPARATOR: &str = "__";

/// Route template errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("param name is empty")]
    EmptyParam,

    #[error("invalid param segment `{0}`")]
    InvalidParam(String),

    #[error("param `{0}` must not be empty")]
    EmptyRepeat(String),
}

/// How many path segments a param produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Exactly one segment
    One,
    /// `+`: one or more
    OneOrMore,
    /// `*`: zero or more
    ZeroOrMore,
}

/// A named param of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Param name without `_raw` or repeat suffix
    pub name: String,
    /// Field path (`author__name` -> `["author", "name"]`)
    pub field_path: SmallVec<[String; 2]>,
    pub raw: bool,
    pub repeat: Repeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(Param),
}

/// Unformatted param values, keyed by param name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

pub type RouteParams = FxHashMap<String, ParamValue>;

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    template: String,
    segments: SmallVec<[Segment; 4]>,
}

impl RouteTemplate {
    /// Compile a template string.
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let segments: SmallVec<[Segment; 4]> = template
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(parse_segment)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            template: template.to_owned(),
            segments,
        })
    }

    /// The source template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Params of this template, in order.
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(param) => Some(param),
            Segment::Static(_) => None,
        })
    }

    /// Collect param values for a node.
    ///
    /// Values are unformatted: slug/raw formatting happens in [`Self::to_path`].
    pub fn resolve_params(&self, id: &str, fields: &FieldMap, date_field: &str) -> RouteParams {
        let date = fields.get(date_field).and_then(parse_date_value).map(|d| date_parts(&d));

        self.params()
            .map(|param| {
                let value = match (param.name.as_str(), &date) {
                    ("year", Some(parts)) => ParamValue::Single(parts.year.clone()),
                    ("month", Some(parts)) => ParamValue::Single(parts.month.clone()),
                    ("day", Some(parts)) => ParamValue::Single(parts.day.clone()),
                    ("year" | "month" | "day", None) => ParamValue::List(Vec::new()),
                    _ => field_param(param, id, fields),
                };
                (param.name.clone(), value)
            })
            .collect()
    }

    /// Render a path from param values.
    ///
    /// Missing single params render as empty segments, which are dropped.
    /// A `+` param with no values fails.
    pub fn to_path(&self, params: &RouteParams) -> Result<String, RouteError> {
        let mut parts: Vec<String> = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            let param = match segment {
                Segment::Static(text) => {
                    parts.push(text.clone());
                    continue;
                }
                Segment::Param(param) => param,
            };

            let render = |value: &str| {
                if param.raw {
                    encode_raw(value)
                } else {
                    slugify(value)
                }
            };

            match (params.get(&param.name), param.repeat) {
                (Some(ParamValue::Single(value)), _) => parts.push(render(value.as_str())),
                (Some(ParamValue::List(values)), Repeat::One) => {
                    if let Some(first) = values.first() {
                        parts.push(render(first.as_str()));
                    }
                }
                (Some(ParamValue::List(values)), repeat) => {
                    let formatted: Vec<String> = values
                        .iter()
                        .map(|value| render(value.as_str()))
                        .filter(|value| !value.is_empty())
                        .collect();
                    if formatted.is_empty() && repeat == Repeat::OneOrMore {
                        return Err(RouteError::EmptyRepeat(param.name.clone()));
                    }
                    parts.extend(formatted);
                }
                (None, Repeat::OneOrMore) => {
                    return Err(RouteError::EmptyRepeat(param.name.clone()));
                }
                (None, _) => {}
            }
        }

        let path = parts
            .iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/");
        Ok(format!("/{path}"))
    }

    /// Compute the path of a node.
    pub fn path_for(&self, id: &str, fields: &FieldMap, date_field: &str) -> Result<String, RouteError> {
        self.to_path(&self.resolve_params(id, fields, date_field))
    }
}

/// Normalize an explicit path: one leading slash, no trailing slash.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push('/');

    let mut last_was_slash = true;
    for c in trimmed.chars() {
        if c == '/' {
            if !last_was_slash {
                normalized.push(c);
            }
            last_was_slash = true;
        } else {
            normalized.push(c);
            last_was_slash = false;
        }
    }
    normalized
}

/// Append a trailing slash unless the path already ends with one.
pub fn with_trailing_slash(mut path: String) -> String {
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

fn parse_segment(segment: &str) -> Result<Segment, RouteError> {
    let Some(spec) = segment.strip_prefix(':') else {
        if segment.contains(':') {
            return Err(RouteError::InvalidParam(segment.to_owned()));
        }
        return Ok(Segment::Static(segment.to_owned()));
    };

    let (spec, repeat) = match spec.as_bytes().last() {
        Some(b'+') => (&spec[..spec.len() - 1], Repeat::OneOrMore),
        Some(b'*') => (&spec[..spec.len() - 1], Repeat::ZeroOrMore),
        _ => (spec, Repeat::One),
    };

    if spec.is_empty() {
        return Err(RouteError::EmptyParam);
    }
    if !spec.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RouteError::InvalidParam(segment.to_owned()));
    }

    let (name, raw) = match spec.strip_suffix(RAW_SUFFIX) {
        Some(name) if !name.is_empty() => (name, true),
        _ => (spec, false),
    };

    let field_path: SmallVec<[String; 2]> = name.split(NESTED_SEPARATOR).map(str::to_owned).collect();
    if field_path.iter().any(String::is_empty) {
        return Err(RouteError::InvalidParam(segment.to_owned()));
    }

    Ok(Segment::Param(Param {
        name: name.to_owned(),
        field_path,
        raw,
        repeat,
    }))
}

fn field_param(param: &Param, id: &str, fields: &FieldMap) -> ParamValue {
    let value = match param.field_path.as_slice() {
        [single] if single == "id" => return ParamValue::Single(id.to_owned()),
        [single] if single == "slug" => fields
            .get("slug")
            .filter(|value| !value.is_null())
            .or_else(|| fields.get("title")),
        path => lookup_path(fields, path.iter().map(String::as_str)),
    };

    match value {
        None | Some(Value::Null) => ParamValue::List(Vec::new()),
        Some(Value::Array(items)) => ParamValue::List(items.iter().flat_map(scalar_strings).collect()),
        Some(value) => {
            let mut strings = scalar_strings(value);
            match (strings.len(), param.repeat) {
                (1, Repeat::One) => ParamValue::Single(strings.remove(0)),
                _ => ParamValue::List(strings),
            }
        }
    }
}

/// Render a scalar (or reference) as path text.
fn scalar_strings(value: &Value) -> Vec<String> {
    if let Some(reference) = Reference::from_value(value) {
        return reference.ids.into_vec();
    }

    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        _ => Vec::new(),
    }
}
