//! Rules validation errors and semantic validation.

use thiserror::Error;

use crate::rules::{FactorRange, Rules, SeverityThresholds};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rules validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for fw_common::Error {
    fn from(err: ValidationError) -> Self {
        fw_common::Error::InvalidRules(err.to_string())
    }
}

/// Validate a rules document semantically.
pub fn validate_rules(rules: &Rules) -> ValidationResult<()> {
    if rules.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: rules.schema_version.clone(),
        });
    }

    let est = &rules.estimation;
    let m = &est.multipliers;
    for (name, value) in [
        ("pre_AM_peak", m.pre_am_peak),
        ("AM_peak", m.am_peak),
        ("interpeak", m.interpeak),
        ("PM_peak", m.pm_peak),
        ("PM_late", m.pm_late),
    ] {
        require_positive(&format!("estimation.multipliers.{}", name), value)?;
    }
    require_positive("estimation.unrecognized_multiplier", est.unrecognized_multiplier)?;
    require_non_negative(
        "estimation.missing_sample_expected_factor",
        est.missing_sample_expected_factor,
    )?;
    require_positive("estimation.days_per_year", est.days_per_year)?;
    require_unit("estimation.min_rate", est.min_rate)?;
    require_unit("estimation.max_rate", est.max_rate)?;
    require_unit("estimation.fallback_rate", est.fallback_rate)?;
    if est.min_rate > est.max_rate {
        return Err(ValidationError::SemanticError(format!(
            "estimation.min_rate ({}) must not exceed estimation.max_rate ({})",
            est.min_rate, est.max_rate
        )));
    }

    let jitter = &rules.jitter;
    if jitter.medium_volume_above > jitter.high_volume_above {
        return Err(ValidationError::SemanticError(format!(
            "jitter.medium_volume_above ({}) must not exceed jitter.high_volume_above ({})",
            jitter.medium_volume_above, jitter.high_volume_above
        )));
    }
    validate_factor_range("jitter.high", &jitter.high)?;
    validate_factor_range("jitter.medium", &jitter.medium)?;
    validate_factor_range("jitter.low", &jitter.low)?;

    require_non_negative("fares.average_fare", rules.fares.average_fare)?;
    require_non_negative("fares.penalty_fine", rules.fares.penalty_fine)?;
    require_unit("fares.route_fine_fraction", rules.fares.route_fine_fraction)?;

    validate_thresholds("alerts.hourly", &rules.alerts.hourly)?;
    validate_thresholds("alerts.station", &rules.alerts.station)?;

    let views = &rules.views;
    for (name, value) in [
        ("views.top_stations", views.top_stations),
        ("views.station_alert_limit", views.station_alert_limit),
        ("views.realtime_event_window", views.realtime_event_window),
        ("views.realtime_alert_window", views.realtime_alert_window),
        ("views.route_rows", views.route_rows),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidValue {
                field: name.to_string(),
                message: "must be at least 1".to_string(),
            });
        }
    }
    if views.simulation_hours == 0 || views.simulation_hours > 24 * 7 {
        return Err(ValidationError::InvalidValue {
            field: "views.simulation_hours".to_string(),
            message: format!("must be in [1, 168], got {}", views.simulation_hours),
        });
    }

    let routes = &rules.routes;
    if routes.risk_medium_above > routes.risk_high_above {
        return Err(ValidationError::SemanticError(
            "routes.risk_medium_above must not exceed routes.risk_high_above".to_string(),
        ));
    }

    Ok(())
}

fn require_positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be positive, got {}", value),
        });
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be non-negative, got {}", value),
        });
    }
    Ok(())
}

fn require_unit(field: &str, value: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in [0, 1], got {}", value),
        });
    }
    Ok(())
}

fn validate_factor_range(field: &str, range: &FactorRange) -> ValidationResult<()> {
    require_positive(&format!("{}.low", field), range.low)?;
    require_positive(&format!("{}.high", field), range.high)?;
    if range.low > range.high {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("low ({}) must not exceed high ({})", range.low, range.high),
        });
    }
    Ok(())
}

fn validate_thresholds(field: &str, t: &SeverityThresholds) -> ValidationResult<()> {
    require_unit(&format!("{}.alert_above", field), t.alert_above)?;
    require_unit(&format!("{}.medium_above", field), t.medium_above)?;
    require_unit(&format!("{}.high_above", field), t.high_above)?;
    if !(t.alert_above < t.medium_above && t.medium_above < t.high_above) {
        return Err(ValidationError::SemanticError(format!(
            "{} thresholds must be strictly increasing (alert_above < medium_above < high_above), got {} / {} / {}",
            field, t.alert_above, t.medium_above, t.high_above
        )));
    }
    Ok(())
}
