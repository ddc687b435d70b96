//! Country code extraction and validation
//!
//! A request can carry the code as the last path segment (`/api/us`) or as
//! the `code` query parameter (`/api?code=us`). Both sources are collected
//! into a [`CodeParam`] first, so absent and multi-valued input are rejected
//! before any length check or path construction happens.

use std::path::{Component, Path};

/// Name of the query parameter carrying the code
pub const CODE_PARAM: &str = "code";

/// Required code length in UTF-16 code units
pub const CODE_LEN: usize = 2;

/// Raw `code` input as found in the request, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeParam {
    Absent,
    One(String),
    /// More than one value was supplied (count of values)
    Many(usize),
    /// Query string or path segment could not be decoded
    Malformed,
}

/// Why a [`CodeParam`] was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("code parameter is missing")]
    Missing,
    #[error("code parameter given {0} times")]
    MultipleValues(usize),
    #[error("code parameter could not be decoded")]
    Malformed,
    #[error("code must be 2 characters, got {0}")]
    Length(usize),
    #[error("code '{0}' is not a plain file name")]
    UnsafeName(String),
}

impl CodeParam {
    /// Collect every `code` value from the path segment and the query string.
    ///
    /// An empty path segment counts as no value.
    pub fn from_request(path_segment: Option<&str>, query: Option<&str>) -> Self {
        let mut values = Vec::new();

        if let Some(segment) = path_segment.filter(|s| !s.is_empty()) {
            match decode_path_segment(segment) {
                Some(value) => values.push(value),
                None => return Self::Malformed,
            }
        }

        if let Some(query) = query.filter(|q| !q.is_empty()) {
            let Ok(pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(query) else {
                return Self::Malformed;
            };
            values.extend(
                pairs
                    .into_iter()
                    .filter(|(key, _)| key == CODE_PARAM)
                    .map(|(_, value)| value),
            );
        }

        match values.len() {
            0 => Self::Absent,
            1 => values.pop().map_or(Self::Absent, Self::One),
            n => Self::Many(n),
        }
    }
}

/// Percent-decode a single path segment.
///
/// Reuses the form decoder; characters that carry meaning in a form body
/// (`+`, `&`, `=`) are escaped first so they survive literally.
fn decode_path_segment(segment: &str) -> Option<String> {
    let escaped = segment
        .replace('+', "%2B")
        .replace('&', "%26")
        .replace('=', "%3D");
    let mut pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(&format!("{CODE_PARAM}={escaped}")).ok()?;
    pairs.pop().map(|(_, value)| value)
}

/// A validated, uppercased country code that is safe to use as a file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagCode(String);

impl FlagCode {
    /// Validate a raw parameter.
    ///
    /// Length is checked before uppercasing, and the uppercase form must be a
    /// single normal path component. Both happen before any path is built.
    pub fn parse(param: CodeParam) -> Result<Self, CodeError> {
        let raw = match param {
            CodeParam::Absent => return Err(CodeError::Missing),
            CodeParam::Many(n) => return Err(CodeError::MultipleValues(n)),
            CodeParam::Malformed => return Err(CodeError::Malformed),
            CodeParam::One(raw) => raw,
        };

        let len = raw.encode_utf16().count();
        if len != CODE_LEN {
            return Err(CodeError::Length(len));
        }

        let upper = raw.to_uppercase();
        if !is_plain_file_name(&upper) {
            return Err(CodeError::UnsafeName(upper));
        }

        Ok(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_plain_file_name(name: &str) -> bool {
    if name.contains('\0') {
        return false;
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(first)), None) => first == name,
        _ => false,
    }
}
