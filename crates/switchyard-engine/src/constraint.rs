use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};
use semver::{BuildMetadata, Version};
use switchyard_core::context::Context;
use switchyard_core::feature::{Constraint, Operator};

/// True when every constraint holds for `context`.
pub fn all_hold<'a>(constraints: impl IntoIterator<Item = &'a Constraint>, context: &Context) -> bool {
    constraints.into_iter().all(|c| holds(c, context))
}

/// Evaluate a single constraint, applying `inverted`.
pub fn holds(constraint: &Constraint, context: &Context) -> bool {
    let result = evaluate(constraint, context);
    if constraint.inverted {
        !result
    } else {
        result
    }
}

fn evaluate(constraint: &Constraint, context: &Context) -> bool {
    let field = context.by_name(&constraint.context_name);
    let field = field.as_deref();
    match &constraint.operator {
        Operator::In => is_in(constraint, field),
        Operator::NotIn => !is_in(constraint, field),
        Operator::StrContains => string_match(constraint, field, |c, v| c.contains(v)),
        Operator::StrStartsWith => string_match(constraint, field, |c, v| c.starts_with(v)),
        Operator::StrEndsWith => string_match(constraint, field, |c, v| c.ends_with(v)),
        Operator::NumEq
        | Operator::NumGt
        | Operator::NumGte
        | Operator::NumLt
        | Operator::NumLte => numeric(constraint, field),
        Operator::DateAfter | Operator::DateBefore => date(constraint, field),
        Operator::SemverEq | Operator::SemverGt | Operator::SemverLt => semver(constraint, field),
        Operator::Unknown(name) => {
            tracing::debug!("Constraint on {} uses unsupported operator {name}", constraint.context_name);
            false
        }
    }
}

fn is_in(constraint: &Constraint, field: Option<&str>) -> bool {
    let Some(field) = field else {
        return false;
    };
    let field = field.trim();
    constraint.values.iter().any(|v| {
        if constraint.case_insensitive {
            v.to_lowercase() == field.to_lowercase()
        } else {
            v == field
        }
    })
}

fn string_match(constraint: &Constraint, field: Option<&str>, op: impl Fn(&str, &str) -> bool) -> bool {
    let Some(field) = field else {
        return false;
    };
    if constraint.case_insensitive {
        let field = field.to_lowercase();
        constraint.values.iter().any(|v| op(&field, &v.to_lowercase()))
    } else {
        constraint.values.iter().any(|v| op(field, v))
    }
}

/// `value` followed by `values`; numeric and date operators match any of them.
fn operands(constraint: &Constraint) -> impl Iterator<Item = &str> {
    constraint
        .value
        .as_deref()
        .into_iter()
        .chain(constraint.values.iter().map(String::as_str))
}

fn numeric(constraint: &Constraint, field: Option<&str>) -> bool {
    let Some(actual) = field.and_then(|f| f.trim().parse::<f64>().ok()) else {
        return false;
    };
    operands(constraint)
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .any(|expected| match constraint.operator {
            Operator::NumEq => actual == expected,
            Operator::NumGt => actual > expected,
            Operator::NumGte => actual >= expected,
            Operator::NumLt => actual < expected,
            Operator::NumLte => actual <= expected,
            _ => false,
        })
}

/// Parse an RFC 3339 timestamp, or a naive ISO date-time taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn date(constraint: &Constraint, field: Option<&str>) -> bool {
    let actual = match field {
        Some(raw) => match parse_date(raw) {
            Some(dt) => dt,
            None => return false,
        },
        None => Utc::now(),
    };
    operands(constraint)
        .filter_map(parse_date)
        .any(|expected| match constraint.operator {
            Operator::DateAfter => actual > expected,
            Operator::DateBefore => actual < expected,
            _ => false,
        })
}

fn parse_semver(value: &str) -> Option<Version> {
    let mut version = Version::parse(value.trim()).ok()?;
    version.build = BuildMetadata::EMPTY;
    Some(version)
}

fn semver(constraint: &Constraint, field: Option<&str>) -> bool {
    let Some(raw) = field else {
        return false;
    };
    let Some(actual) = parse_semver(raw) else {
        tracing::info!("Couldn't parse version [{raw}] from context");
        return false;
    };
    let expected = constraint
        .value
        .as_deref()
        .or_else(|| constraint.values.first().map(String::as_str))
        .and_then(parse_semver);
    let Some(expected) = expected else {
        return false;
    };
    let ordering = actual.cmp(&expected);
    match constraint.operator {
        Operator::SemverEq => ordering == Ordering::Equal,
        Operator::SemverGt => ordering == Ordering::Greater,
        Operator::SemverLt => ordering == Ordering::Less,
        _ => false,
    }
}
