//! Maps arbitrarily-shaped uploaded rows onto the canonical [`Employee`].
//!
//! Column names are matched case- and separator-insensitively against a fixed
//! alias list per field. Anything that cannot be resolved is filled in, so
//! normalization never fails.

use std::collections::HashMap;

use rand::Rng;
use serde_json::Value;

use crate::models::{Employee, RawRecord};

/// Default used when a field is absent from the record.
#[derive(Debug, Clone, Copy)]
enum Missing {
    Fixed(f64),
    /// Whole number drawn from `[low, high]`.
    WholeInclusive(i64, i64),
    /// Whole number drawn from `[low, high)`.
    WholeExclusive(i64, i64),
    /// Real number drawn from `[low, high)`.
    Real(f64, f64),
}

impl Missing {
    fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Missing::Fixed(value) => value,
            Missing::WholeInclusive(low, high) => rng.gen_range(low..=high) as f64,
            Missing::WholeExclusive(low, high) => rng.gen_range(low..high) as f64,
            Missing::Real(low, high) => rng.gen_range(low..high),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NumericField {
    aliases: &'static [&'static str],
    missing: Missing,
    /// Used when a value is present but does not parse as a number.
    unparseable: f64,
    whole: bool,
}

const PERFORMANCE: NumericField = NumericField {
    aliases: &["performancescore", "performance", "score", "performancerating"],
    missing: Missing::WholeExclusive(50, 90),
    unparseable: 70.0,
    whole: true,
};

const SATISFACTION: NumericField = NumericField {
    aliases: &["satisfactionscore", "satisfaction", "employeesatisfaction"],
    missing: Missing::Real(3.0, 5.0),
    unparseable: 3.5,
    whole: false,
};

const TRAINING_HOURS: NumericField = NumericField {
    aliases: &["traininghours", "training", "traininghoursperyear"],
    missing: Missing::WholeInclusive(20, 60),
    unparseable: 30.0,
    whole: true,
};

const YEARS_AT_COMPANY: NumericField = NumericField {
    aliases: &["yearsatcompany", "tenure", "years"],
    missing: Missing::WholeInclusive(1, 11),
    unparseable: 3.0,
    whole: true,
};

const WORK_HOURS: NumericField = NumericField {
    aliases: &["workhoursperweek", "workhours", "hoursperweek"],
    missing: Missing::Fixed(40.0),
    unparseable: 40.0,
    whole: true,
};

const OVERTIME_HOURS: NumericField = NumericField {
    aliases: &["overtimehours", "overtime"],
    missing: Missing::Fixed(0.0),
    unparseable: 0.0,
    whole: true,
};

const SICK_DAYS: NumericField = NumericField {
    aliases: &["sickdays", "absences"],
    missing: Missing::Fixed(0.0),
    unparseable: 0.0,
    whole: true,
};

const ID_ALIASES: &[&str] = &["id", "employeeid"];
const NAME_ALIASES: &[&str] = &["name", "employeename", "fullname"];
const DEPARTMENT_ALIASES: &[&str] = &["department", "dept"];
const DEFAULT_DEPARTMENT: &str = "General";

/// Lowercases a column name and strips whitespace, underscores and hyphens.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalizes one raw row. `position` is the 1-based row number used for
/// synthesized ids and names.
pub fn normalize<R: Rng + ?Sized>(raw: &RawRecord, position: usize, rng: &mut R) -> Employee {
    let index = KeyIndex::build(raw);

    let id = index
        .text(ID_ALIASES)
        .unwrap_or_else(|| format!("emp-{position}"));
    let name = index
        .text(NAME_ALIASES)
        .unwrap_or_else(|| format!("Employee {position}"));
    let department = index
        .text(DEPARTMENT_ALIASES)
        .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string());

    let performance_score = index.number(&PERFORMANCE, rng);
    let satisfaction_score = index.number(&SATISFACTION, rng);
    let training_hours = index.number(&TRAINING_HOURS, rng);
    let years_at_company = index.number(&YEARS_AT_COMPANY, rng);
    let work_hours_per_week = index.number(&WORK_HOURS, rng);
    let overtime_hours = index.number(&OVERTIME_HOURS, rng);
    let sick_days = index.number(&SICK_DAYS, rng);

    Employee::new(
        id,
        name,
        department,
        satisfaction_score,
        training_hours,
        years_at_company,
        work_hours_per_week,
        overtime_hours,
        sick_days,
        performance_score,
    )
}

struct KeyIndex<'a> {
    values: HashMap<String, &'a Value>,
}

impl<'a> KeyIndex<'a> {
    fn build(raw: &'a RawRecord) -> Self {
        let mut values = HashMap::with_capacity(raw.len());
        // Colliding keys: the later key in the record's own order wins.
        for (key, value) in raw {
            values.insert(normalize_key(key), value);
        }
        Self { values }
    }

    fn lookup(&self, aliases: &[&str]) -> Option<&'a Value> {
        aliases
            .iter()
            .filter_map(|alias| self.values.get(*alias).copied())
            .find(|value| !value.is_null())
    }

    fn text(&self, aliases: &[&str]) -> Option<String> {
        self.lookup(aliases).map(value_to_text)
    }

    fn number<R: Rng + ?Sized>(&self, field: &NumericField, rng: &mut R) -> f64 {
        match self.lookup(field.aliases) {
            None => field.missing.draw(rng),
            Some(value) => coerce_number(value, field.whole).unwrap_or(field.unparseable),
        }
    }
}

fn coerce_number(value: &Value, whole: bool) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(text, whole),
        _ => None,
    }
}

/// Lenient numeric parse: reads the longest numeric prefix after leading
/// whitespace, so `"85 pts"` yields 85. With `whole` set only the integer
/// part is read.
pub(crate) fn leading_number(text: &str, whole: bool) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;

    if !whole {
        if end < bytes.len() && bytes[end] == b'.' {
            let fraction_start = end + 1;
            let mut cursor = fraction_start;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
            }
            if has_digits || cursor > fraction_start {
                has_digits = true;
                end = cursor;
            }
        }
        if has_digits && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
            let mut cursor = end + 1;
            if matches!(bytes.get(cursor), Some(b'+') | Some(b'-')) {
                cursor += 1;
            }
            let exponent_start = cursor;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
            }
            if cursor > exponent_start {
                end = cursor;
            }
        }
    }

    if !has_digits {
        return None;
    }
    text[..end].parse::<f64>().ok()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e15 => {
                format!("{}", float as i64)
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}
