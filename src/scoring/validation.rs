use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Education, RemoteFrequency, ScoringInput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

struct NumberRule {
    field: &'static str,
    min: f64,
    max: f64,
    integer: bool,
}

fn whole(field: &'static str, min: f64, max: f64) -> NumberRule {
    NumberRule {
        field,
        min,
        max,
        integer: true,
    }
}

fn real(field: &'static str, min: f64, max: f64) -> NumberRule {
    NumberRule {
        field,
        min,
        max,
        integer: false,
    }
}

/// Validates a request body. Absent fields take their defaults; every
/// offending field is reported, not just the first.
pub fn validate_request(body: &Value) -> Result<ScoringInput, Vec<FieldError>> {
    let object = match body {
        Value::Object(object) => object,
        other => {
            return Err(vec![FieldError::new(
                "",
                format!("Expected object, received {}", type_name(other)),
            )])
        }
    };

    let mut errors = Vec::new();
    let defaults = ScoringInput::default();
    let mut fields = Fields {
        object,
        errors: &mut errors,
    };

    let input = ScoringInput {
        age: fields.number(whole("age", 18.0, 100.0), defaults.age),
        gender: fields.text("gender", 20, defaults.gender),
        department: fields.text("department", 100, defaults.department),
        education: fields
            .choice("education", &Education::ALL, Education::label)
            .unwrap_or(defaults.education),
        job_title: fields.text("jobTitle", 100, defaults.job_title),
        years_at_company: fields.number(
            whole("yearsAtCompany", 0.0, 50.0),
            defaults.years_at_company,
        ),
        salary: fields.number(real("salary", 0.0, 10_000_000.0), defaults.salary),
        team_size: fields.number(whole("teamSize", 1.0, 1000.0), defaults.team_size),
        remote: fields
            .choice("remote", &RemoteFrequency::ALL, RemoteFrequency::label)
            .unwrap_or(defaults.remote),
        work_hours: fields.number(real("workHours", 0.0, 168.0), defaults.work_hours),
        projects: fields.number(whole("projects", 0.0, 100.0), defaults.projects),
        overtime: fields.number(real("overtime", 0.0, 100.0), defaults.overtime),
        sick_days: fields.number(whole("sickDays", 0.0, 365.0), defaults.sick_days),
        training: fields.number(real("training", 0.0, 1000.0), defaults.training),
        promotions: fields.number(whole("promotions", 0.0, 20.0), defaults.promotions),
        satisfaction: fields.number(real("satisfaction", 1.0, 5.0), defaults.satisfaction),
    };

    if errors.is_empty() {
        Ok(input)
    } else {
        Err(errors)
    }
}

struct Fields<'a> {
    object: &'a Map<String, Value>,
    errors: &'a mut Vec<FieldError>,
}

impl Fields<'_> {
    fn number(&mut self, rule: NumberRule, default: f64) -> f64 {
        let value = match self.object.get(rule.field) {
            None => return default,
            Some(value) => value,
        };
        let number = match value.as_f64() {
            Some(number) => number,
            None => {
                self.errors.push(FieldError::new(
                    rule.field,
                    format!("Expected number, received {}", type_name(value)),
                ));
                return default;
            }
        };

        let before = self.errors.len();
        if rule.integer && number.fract() != 0.0 {
            self.errors
                .push(FieldError::new(rule.field, "Expected integer, received float"));
        }
        if number < rule.min {
            self.errors.push(FieldError::new(
                rule.field,
                format!("Number must be greater than or equal to {}", rule.min),
            ));
        }
        if number > rule.max {
            self.errors.push(FieldError::new(
                rule.field,
                format!("Number must be less than or equal to {}", rule.max),
            ));
        }

        if self.errors.len() == before {
            number
        } else {
            default
        }
    }

    fn text(&mut self, field: &str, max_chars: usize, default: String) -> String {
        match self.object.get(field) {
            None => default,
            Some(Value::String(text)) if text.chars().count() <= max_chars => text.clone(),
            Some(Value::String(_)) => {
                self.errors.push(FieldError::new(
                    field,
                    format!("String must contain at most {max_chars} character(s)"),
                ));
                default
            }
            Some(other) => {
                self.errors.push(FieldError::new(
                    field,
                    format!("Expected string, received {}", type_name(other)),
                ));
                default
            }
        }
    }

    fn choice<T: Copy>(
        &mut self,
        field: &str,
        options: &[T],
        label: fn(&T) -> &'static str,
    ) -> Option<T> {
        let value = self.object.get(field)?;
        let found = value
            .as_str()
            .and_then(|text| options.iter().find(|option| label(option) == text).copied());
        if found.is_none() {
            let expected = options
                .iter()
                .map(|option| format!("'{}'", label(option)))
                .collect::<Vec<_>>()
                .join(" | ");
            let received = match value {
                Value::String(text) => format!("'{text}'"),
                other => type_name(other).to_string(),
            };
            self.errors.push(FieldError::new(
                field,
                format!("Invalid enum value. Expected {expected}, received {received}"),
            ));
        }
        found
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
