use std::collections::HashMap;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::node::{Node, NodeKind, NodeValue, UserValue};
use crate::{
    ConstructorError, Mark, BINARY_TAG, BOOL_TAG, FLOAT_TAG, INT_TAG, MERGE_TAG, NULL_TAG,
    STR_TAG, TIMESTAMP_TAG, VALUE_TAG,
};

/// A constructor hook: turns a composed node into a user value.
pub type ConstructFn = Box<dyn Fn(&Node) -> Result<Box<dyn UserValue>, ConstructorError>>;

/// User-defined constructions, keyed by node kind and resolved tag.
///
/// The composer consults the registry after resolution for tags without a
/// default construction; hook failures are surfaced with the position of the
/// triggering event.
#[derive(Default)]
pub struct ConstructorRegistry {
    hooks: HashMap<(NodeKind, String), ConstructFn>,
}

impl ConstructorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: NodeKind, tag: &str, hook: ConstructFn) {
        self.hooks.insert((kind, String::from(tag)), hook);
    }

    pub(crate) fn get(&self, kind: NodeKind, tag: &str) -> Option<&ConstructFn> {
        self.hooks.get(&(kind, String::from(tag)))
    }
}

fn error<T>(tag: &str, problem: impl Into<String>, mark: Mark) -> Result<T, ConstructorError> {
    Err(ConstructorError {
        tag: String::from(tag),
        problem: problem.into(),
        mark,
    })
}

/// Construct the typed value for a scalar with one of the core tags.
///
/// Returns `None` for tags the core does not construct; the caller keeps the
/// scalar as a tagged string (or hands it to a registered hook).
pub(crate) fn construct_scalar(
    tag: &str,
    value: &str,
    mark: Mark,
) -> Result<Option<NodeValue>, ConstructorError> {
    match tag {
        NULL_TAG => Ok(Some(NodeValue::Null)),
        BOOL_TAG => construct_bool(value, mark).map(Some),
        INT_TAG => construct_int(value, mark).map(Some),
        FLOAT_TAG => construct_float(value, mark).map(Some),
        STR_TAG | MERGE_TAG | VALUE_TAG => Ok(Some(NodeValue::String(String::from(value)))),
        TIMESTAMP_TAG => construct_timestamp(value, mark).map(Some),
        BINARY_TAG => construct_binary(value, mark).map(Some),
        _ => Ok(None),
    }
}

fn construct_bool(value: &str, mark: Mark) -> Result<NodeValue, ConstructorError> {
    match value {
        "yes" | "Yes" | "YES" | "true" | "True" | "TRUE" | "on" | "On" | "ON" => {
            Ok(NodeValue::Bool(true))
        }
        "no" | "No" | "NO" | "false" | "False" | "FALSE" | "off" | "Off" | "OFF" => {
            Ok(NodeValue::Bool(false))
        }
        _ => error(BOOL_TAG, format!("invalid boolean {value:?}"), mark),
    }
}

fn construct_int(value: &str, mark: Mark) -> Result<NodeValue, ConstructorError> {
    let cleaned: String = value.chars().filter(|ch| *ch != '_').collect();
    let (negative, digits) = if let Some(rest) = cleaned.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = cleaned.strip_prefix('+') {
        (false, rest)
    } else {
        (false, cleaned.as_str())
    };
    let parsed: Result<i64, std::num::ParseIntError> = if digits == "0" {
        Ok(0)
    } else if let Some(rest) = digits.strip_prefix("0b") {
        i64::from_str_radix(rest, 2)
    } else if let Some(rest) = digits.strip_prefix("0x") {
        i64::from_str_radix(rest, 16)
    } else if digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8)
    } else if digits.contains(':') {
        // Sexagesimal: 190:20:30 == 190*3600 + 20*60 + 30.
        let mut total: i64 = 0;
        for part in digits.split(':') {
            match part.parse::<i64>() {
                Ok(part) => total = total * 60 + part,
                Err(_) => {
                    return error(INT_TAG, format!("invalid integer {value:?}"), mark);
                }
            }
        }
        Ok(total)
    } else {
        digits.parse()
    };
    match parsed {
        Ok(magnitude) => Ok(NodeValue::Int(if negative { -magnitude } else { magnitude })),
        Err(_) => error(INT_TAG, format!("invalid integer {value:?}"), mark),
    }
}

fn construct_float(value: &str, mark: Mark) -> Result<NodeValue, ConstructorError> {
    let cleaned: String = value.chars().filter(|ch| *ch != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    if lower == ".inf" || lower == "+.inf" {
        return Ok(NodeValue::Float(f64::INFINITY));
    }
    if lower == "-.inf" {
        return Ok(NodeValue::Float(f64::NEG_INFINITY));
    }
    if lower == ".nan" {
        return Ok(NodeValue::Float(f64::NAN));
    }
    if cleaned.contains(':') {
        let (negative, digits) = if let Some(rest) = cleaned.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = cleaned.strip_prefix('+') {
            (false, rest)
        } else {
            (false, cleaned.as_str())
        };
        let mut total: f64 = 0.0;
        for part in digits.split(':') {
            match part.parse::<f64>() {
                Ok(part) => total = total * 60.0 + part,
                Err(_) => {
                    return error(FLOAT_TAG, format!("invalid float {value:?}"), mark);
                }
            }
        }
        return Ok(NodeValue::Float(if negative { -total } else { total }));
    }
    match cleaned.parse::<f64>() {
        Ok(parsed) => Ok(NodeValue::Float(parsed)),
        Err(_) => error(FLOAT_TAG, format!("invalid float {value:?}"), mark),
    }
}

fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            "^(?P<year>[0-9][0-9][0-9][0-9])-(?P<month>[0-9][0-9]?)-(?P<day>[0-9][0-9]?)\
             (?:(?:[Tt]|[ \\t]+)\
             (?P<hour>[0-9][0-9]?):(?P<minute>[0-9][0-9]):(?P<second>[0-9][0-9])\
             (?:\\.(?P<fraction>[0-9]*))?\
             (?:[ \\t]*(?:(?P<z>Z)|(?P<tz_sign>[-+])(?P<tz_hour>[0-9][0-9]?)\
             (?::(?P<tz_minute>[0-9][0-9]))?))?)?$",
        )
        .expect("timestamp pattern compiles")
    })
}

fn construct_timestamp(value: &str, mark: Mark) -> Result<NodeValue, ConstructorError> {
    let Some(captures) = timestamp_pattern().captures(value) else {
        return error(TIMESTAMP_TAG, format!("invalid timestamp {value:?}"), mark);
    };
    let number = |name: &str| -> u32 {
        captures
            .name(name)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    let date = NaiveDate::from_ymd_opt(number("year") as i32, number("month"), number("day"));
    let Some(date) = date else {
        return error(TIMESTAMP_TAG, format!("invalid date in {value:?}"), mark);
    };
    let nanos = captures.name("fraction").map_or(0, |m| {
        let digits: String = m.as_str().chars().take(9).collect();
        let value: u64 = digits.parse().unwrap_or(0);
        (value * 10u64.pow(9 - digits.len() as u32)) as u32
    });
    let time = NaiveTime::from_hms_nano_opt(number("hour"), number("minute"), number("second"), nanos);
    let Some(time) = time else {
        return error(TIMESTAMP_TAG, format!("invalid time in {value:?}"), mark);
    };
    let offset_seconds = if captures.name("z").is_some() {
        0
    } else if captures.name("tz_hour").is_some() {
        let magnitude = (number("tz_hour") * 3600 + number("tz_minute") * 60) as i32;
        if captures.name("tz_sign").map(|m| m.as_str()) == Some("-") {
            -magnitude
        } else {
            magnitude
        }
    } else {
        0
    };
    let Some(offset) = FixedOffset::east_opt(offset_seconds) else {
        return error(TIMESTAMP_TAG, format!("invalid offset in {value:?}"), mark);
    };
    let datetime = NaiveDateTime::new(date, time);
    let Some(datetime) = datetime.and_local_timezone(offset).single() else {
        return error(TIMESTAMP_TAG, format!("invalid timestamp {value:?}"), mark);
    };
    Ok(NodeValue::Timestamp(datetime))
}

fn construct_binary(value: &str, mark: Mark) -> Result<NodeValue, ConstructorError> {
    let cleaned: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    match BASE64.decode(cleaned.as_bytes()) {
        Ok(bytes) => Ok(NodeValue::Bytes(bytes)),
        Err(err) => error(BINARY_TAG, format!("invalid base64 data: {err}"), mark),
    }
}
