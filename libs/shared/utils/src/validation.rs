// Field-level constraint checks shared by every cell. Each check names the
// field it failed on so the error can be reported back verbatim.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use shared_models::ValidationError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

static TEN_DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"));

pub type FieldResult<T = ()> = Result<T, ValidationError>;

/// Unwraps a field that must be present in the request.
pub fn required<T>(field: &str, label: &str, value: Option<T>) -> FieldResult<T> {
    value.ok_or_else(|| ValidationError::new(field, format!("{} cannot be null", label)))
}

pub fn length_between(field: &str, value: &str, min: usize, max: usize) -> FieldResult {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::new(
            field,
            format!("size must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn max_length(field: &str, value: &str, max: usize) -> FieldResult {
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("size must be at most {}", max),
        ));
    }
    Ok(())
}

pub fn email(field: &str, value: &str) -> FieldResult {
    if value.len() > 254 || !EMAIL_REGEX.is_match(value) {
        return Err(ValidationError::new(field, "Email must be a valid format"));
    }
    Ok(())
}

pub fn ten_digits(field: &str, value: &str, message: &str) -> FieldResult {
    if !TEN_DIGITS_REGEX.is_match(value) {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

pub fn in_range(field: &str, value: i32, min: i32, max: i32) -> FieldResult {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn past_date(field: &str, value: NaiveDate, today: NaiveDate, message: &str) -> FieldResult {
    if value >= today {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}
