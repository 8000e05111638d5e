//! Applies extraction patterns to response bodies

use crate::{
    Result,
    error::{DecodeError, TpiError},
};

use super::{
    pattern::{ExtractionPattern, FieldKind, FieldSpec, pattern_for},
    types::ObjectKind,
};

/// Prefix the receiver puts on every rejected command
pub const ERROR_PREFIX: &str = "ERROR:";

/// A typed field value captured from a body
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    List(Vec<String>),
    /// An optional field that did not appear in the body
    Absent,
}

/// One decoded record: each declared field of the pattern, in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(&'static str, FieldValue)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    fn required(&self, name: &'static str) -> core::result::Result<&FieldValue, DecodeError> {
        match self.get(name) {
            None | Some(FieldValue::Absent) => Err(DecodeError::MissingField(name)),
            Some(value) => Ok(value),
        }
    }

    pub fn integer(&self, name: &'static str) -> core::result::Result<i64, DecodeError> {
        match self.required(name)? {
            FieldValue::Integer(v) => Ok(*v),
            other => Err(mismatch(name, other)),
        }
    }

    /// Integer field narrowed to `T`; out-of-range values are invalid
    pub fn integer_as<T: TryFrom<i64>>(
        &self,
        name: &'static str,
    ) -> core::result::Result<T, DecodeError> {
        let value = self.integer(name)?;
        T::try_from(value).map_err(|_| DecodeError::InvalidField {
            field: name,
            value: value.to_string(),
        })
    }

    pub fn decimal(&self, name: &'static str) -> core::result::Result<f64, DecodeError> {
        match self.required(name)? {
            FieldValue::Decimal(v) => Ok(*v),
            other => Err(mismatch(name, other)),
        }
    }

    pub fn text(&self, name: &'static str) -> core::result::Result<&str, DecodeError> {
        match self.required(name)? {
            FieldValue::Text(v) => Ok(v),
            other => Err(mismatch(name, other)),
        }
    }

    /// Text field that may be absent
    pub fn opt_text(&self, name: &'static str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn list(&self, name: &'static str) -> core::result::Result<&[String], DecodeError> {
        match self.required(name)? {
            FieldValue::List(v) => Ok(v),
            other => Err(mismatch(name, other)),
        }
    }
}

fn mismatch(field: &'static str, value: &FieldValue) -> DecodeError {
    DecodeError::InvalidField {
        field,
        value: format!("{:?}", value),
    }
}

/// Rejects empty bodies and receiver error lines
///
/// Leading whitespace before the `ERROR:` prefix is ignored.
pub fn check_body(body: &str) -> Result<&str> {
    if body.trim().is_empty() || body.trim_start().starts_with(ERROR_PREFIX) {
        return Err(TpiError::Protocol(body.to_string()));
    }
    Ok(body)
}

/// Decodes a body into zero or more records using the object's pattern
///
/// Objects without a pattern decode to no records once the body passed
/// [`check_body`].
pub fn decode(kind: ObjectKind, body: &str) -> Result<Vec<Record>> {
    let body = check_body(body)?;
    match pattern_for(kind) {
        None => Ok(Vec::new()),
        Some(pattern) => Ok(apply(pattern, body)?),
    }
}

/// Applies one pattern to a body that is already known not to be an error
pub fn apply(
    pattern: &ExtractionPattern,
    body: &str,
) -> core::result::Result<Vec<Record>, DecodeError> {
    match pattern {
        ExtractionPattern::Records { regex, fields } => regex
            .captures_iter(body)
            .map(|caps| {
                let fields = fields
                    .iter()
                    .map(|spec| {
                        let raw = caps.name(spec.name).map(|m| m.as_str());
                        Ok((spec.name, convert(spec, raw)?))
                    })
                    .collect::<core::result::Result<Vec<_>, DecodeError>>()?;
                Ok(Record { fields })
            })
            .collect(),
        ExtractionPattern::Labeled { fields } => {
            let mut record = Record::default();
            for field in fields {
                let raw = field
                    .regex
                    .captures(body)
                    .and_then(|caps| caps.name("value"))
                    .map(|m| m.as_str());
                if raw.is_none() && !field.spec.optional {
                    return Ok(Vec::new());
                }
                record
                    .fields
                    .push((field.spec.name, convert(&field.spec, raw)?));
            }
            Ok(vec![record])
        }
    }
}

fn convert(spec: &FieldSpec, raw: Option<&str>) -> core::result::Result<FieldValue, DecodeError> {
    let Some(raw) = raw else {
        return if spec.optional {
            Ok(FieldValue::Absent)
        } else {
            Err(DecodeError::MissingField(spec.name))
        };
    };

    let invalid = || DecodeError::InvalidField {
        field: spec.name,
        value: raw.to_string(),
    };

    match spec.kind {
        FieldKind::Integer => parse_integer(raw).map(FieldValue::Integer).ok_or_else(invalid),
        FieldKind::Decimal => parse_decimal(raw).map(FieldValue::Decimal).ok_or_else(invalid),
        FieldKind::Text => Ok(FieldValue::Text(unquote(raw).to_string())),
        FieldKind::List => Ok(FieldValue::List(
            unquote(raw)
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect(),
        )),
    }
}

fn split_sign(raw: &str) -> &str {
    raw.strip_prefix(['+', '-']).unwrap_or(raw)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Optional sign followed by digits
pub fn parse_integer(raw: &str) -> Option<i64> {
    if !all_digits(split_sign(raw)) {
        return None;
    }
    raw.parse().ok()
}

/// Optional sign, digits, optional `.digits`
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let unsigned = split_sign(raw);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    if !all_digits(whole) || fraction.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    raw.parse().ok()
}

fn unquote(raw: &str) -> &str {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}
