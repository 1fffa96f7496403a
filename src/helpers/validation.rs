//! Field readers for loosely typed JSON bodies. Each reader records a
//! [`FieldError`] instead of failing fast, so a caller can report every bad
//! field of a payload in one response.

use serde_json::{Map, Value};
use time::macros::format_description;
use time::Date;
use crate::errors::{FieldError, ServiceError};

pub struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(body: &'a Value) -> Result<Self, ServiceError> {
        match body.as_object() {
            Some(body) => Ok(Self {
                body,
                errors: Vec::new(),
            }),
            None => Err(ServiceError::validation("body", "must be a JSON object")),
        }
    }

    pub fn finish(self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.errors))
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.body.get(field).filter(|v| !v.is_null())
    }

    fn reject(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    /// A string that must be present and not blank.
    pub fn required_string(&mut self, field: &str) -> String {
        match self.optional_string(field) {
            Some(value) if !value.trim().is_empty() => value,
            Some(_) => {
                self.reject(field, "must not be empty");
                String::new()
            }
            None => {
                if self.present(field).is_none() {
                    self.reject(field, "is required");
                }
                String::new()
            }
        }
    }

    /// Returns `None` when absent. A present non-string is recorded as an error.
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.present(field)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.reject(field, "must be a string");
                None
            }
        }
    }

    pub fn optional_non_empty_string(&mut self, field: &str) -> Option<String> {
        let value = self.optional_string(field)?;
        if value.trim().is_empty() {
            self.reject(field, "must not be empty");
            return None;
        }
        Some(value)
    }

    pub fn optional_string_list(&mut self, field: &str) -> Option<Vec<String>> {
        let value = self.present(field)?;
        let items = match value.as_array() {
            Some(items) => items,
            None => {
                self.reject(field, "must be an array of strings");
                return None;
            }
        };

        let strings: Option<Vec<String>> = items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect();
        if strings.is_none() {
            self.reject(field, "must be an array of strings");
        }
        strings
    }

    /// Integers may arrive as JSON numbers or numeric strings from form inputs.
    pub fn optional_integer(&mut self, field: &str, min: i64) -> Option<i32> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match parsed.and_then(|n| i32::try_from(n).ok()) {
            Some(n) if i64::from(n) >= min => Some(n),
            Some(_) => {
                self.reject(field, &format!("must be at least {}", min));
                None
            }
            None => {
                self.reject(field, "must be an integer");
                None
            }
        }
    }

    pub fn required_integer(&mut self, field: &str, min: i64) -> i32 {
        if self.present(field).is_none() {
            self.reject(field, "is required");
            return 0;
        }
        self.optional_integer(field, min).unwrap_or_default()
    }

    /// A finite price, zero or greater.
    pub fn optional_price(&mut self, field: &str) -> Option<f64> {
        let value = self.present(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match parsed.filter(|n| n.is_finite()) {
            Some(n) if n >= 0.0 => Some(n),
            Some(_) => {
                self.reject(field, "must not be negative");
                None
            }
            None => {
                self.reject(field, "must be a number");
                None
            }
        }
    }

    pub fn required_price(&mut self, field: &str) -> f64 {
        if self.present(field).is_none() {
            self.reject(field, "is required");
            return 0.0;
        }
        self.optional_price(field).unwrap_or_default()
    }

    /// A calendar date as `YYYY-MM-DD`. A trailing time part is ignored.
    /// Like the other required readers, a bad value yields a placeholder and
    /// the error surfaces from [`FieldReader::finish`].
    pub fn required_date(&mut self, field: &str) -> Date {
        let raw = match self.present(field) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                self.reject(field, "must be a date string");
                return Date::MIN;
            }
            None => {
                self.reject(field, "is required");
                return Date::MIN;
            }
        };

        let day_part = raw.split('T').next().unwrap_or_default();
        match Date::parse(day_part, format_description!("[year]-[month]-[day]")) {
            Ok(date) => date,
            Err(_) => {
                self.reject(field, "must be a date formatted as YYYY-MM-DD");
                Date::MIN
            }
        }
    }

    pub fn required_email(&mut self, field: &str) -> String {
        let email = self.required_string(field);
        if !email.is_empty() && !looks_like_email(&email) {
            self.reject(field, "must be a valid email address");
        }
        email
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.reject(field, message);
    }

    /// Whether `field` has been read without recording an error so far.
    pub fn is_valid(&self, field: &str) -> bool {
        !self.errors.iter().any(|e| e.field == field)
    }
}

fn looks_like_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}
