//! Parsing and validation of workload metrics query parameters.
//!
//! Parameters are checked in a fixed order and the first failure wins, so a
//! malformed `queryTime` is reported even when `duration` is malformed too.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::api::dto::metrics_dto::QueryParams;
use crate::config::MetricsConfig;

pub const PARAM_RATE_INTERVAL: &str = "rateInterval";
pub const PARAM_RATE_FUNC: &str = "rateFunc";
pub const PARAM_QUERY_TIME: &str = "queryTime";
pub const PARAM_DURATION: &str = "duration";
pub const PARAM_STEP: &str = "step";
pub const PARAM_BY_LABELS: &str = "byLabels";
pub const PARAM_QUANTILES: &str = "quantiles";
pub const PARAM_FILTERS: &str = "filters";

/// Malformed or out-of-domain user input. The message always names the parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct ValidationError {
    pub parameter: &'static str,
    pub detail: String,
}

impl ValidationError {
    fn unparseable(parameter: &'static str, cause: impl fmt::Display) -> Self {
        Self {
            parameter,
            detail: format!("cannot parse query parameter '{parameter}': {cause}"),
        }
    }

    fn out_of_domain(parameter: &'static str, requirement: &str) -> Self {
        Self {
            parameter,
            detail: format!("query parameter '{parameter}' must be {requirement}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateFunc {
    #[default]
    Rate,
    Irate,
}

impl RateFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateFunc::Rate => "rate",
            RateFunc::Irate => "irate",
        }
    }
}

impl FromStr for RateFunc {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rate" => Ok(RateFunc::Rate),
            "irate" => Ok(RateFunc::Irate),
            _ => Err(ValidationError::out_of_domain(
                PARAM_RATE_FUNC,
                "either 'rate' or 'irate'",
            )),
        }
    }
}

impl fmt::Display for RateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Duration units accepted in a rate window, largest first, in milliseconds.
const DURATION_UNITS: [(&str, i64); 7] = [
    ("y", 365 * 86_400_000),
    ("w", 7 * 86_400_000),
    ("d", 86_400_000),
    ("h", 3_600_000),
    ("m", 60_000),
    ("s", 1_000),
    ("ms", 1),
];

/// A validated rate window such as `5m` or `1h30m`.
///
/// The literal is kept exactly as supplied and rendered verbatim between
/// brackets in generated expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateInterval {
    literal: String,
}

impl RateInterval {
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("empty duration".to_string());
        }

        let mut rest = raw;
        let mut total_ms: i64 = 0;
        let mut last_unit: Option<usize> = None;

        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_end == 0 {
                return Err(format!("invalid duration '{raw}'"));
            }
            let (digits, tail) = rest.split_at(digits_end);

            let unit_end = tail
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_end);
            if unit.is_empty() {
                return Err(format!("missing unit in duration '{raw}'"));
            }

            let idx = DURATION_UNITS
                .iter()
                .position(|(u, _)| *u == unit)
                .ok_or_else(|| format!("unknown unit '{unit}' in duration '{raw}'"))?;
            if last_unit.is_some_and(|last| idx <= last) {
                return Err(format!("units out of order in duration '{raw}'"));
            }
            last_unit = Some(idx);

            let value: i64 = digits
                .parse()
                .map_err(|_| format!("invalid duration '{raw}'"))?;
            total_ms = value
                .checked_mul(DURATION_UNITS[idx].1)
                .and_then(|ms| total_ms.checked_add(ms))
                .ok_or_else(|| format!("duration '{raw}' is too long"))?;

            rest = tail;
        }

        if total_ms == 0 {
            return Err(format!("duration '{raw}' must be positive"));
        }

        Ok(Self {
            literal: raw.to_string(),
        })
    }
}

impl fmt::Display for RateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Fully validated query parameters for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsQuerySpec {
    pub rate_interval: RateInterval,
    pub rate_func: RateFunc,
    pub query_time: DateTime<Utc>,
    pub duration: TimeDelta,
    pub step: TimeDelta,
    /// Grouping labels in the order supplied.
    pub by_labels: Vec<String>,
    /// Histogram quantiles in the order supplied, each within (0, 1].
    pub quantiles: Vec<f64>,
    /// Family names to restrict to; empty selects every family.
    pub filters: Vec<String>,
}

impl MetricsQuerySpec {
    /// Build a spec from raw parameters, falling back to `config` defaults.
    ///
    /// `now` is the value used when `queryTime` is absent.
    pub fn parse(
        params: &QueryParams,
        config: &MetricsConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let rate_interval = RateInterval::parse(
            params
                .get(PARAM_RATE_INTERVAL)
                .unwrap_or(config.default_rate_interval.as_str()),
        )
        .map_err(|e| ValidationError::unparseable(PARAM_RATE_INTERVAL, e))?;

        let rate_func = match params.get(PARAM_RATE_FUNC) {
            Some(raw) => raw.parse()?,
            None => RateFunc::default(),
        };

        let query_time = match params.get(PARAM_QUERY_TIME) {
            Some(raw) => {
                let secs: i64 = raw
                    .parse()
                    .map_err(|e| ValidationError::unparseable(PARAM_QUERY_TIME, e))?;
                DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                    ValidationError::unparseable(PARAM_QUERY_TIME, "timestamp out of range")
                })?
            }
            None => now,
        };

        let duration = positive_seconds(params, PARAM_DURATION, config.default_duration_secs)?;
        if query_time.checked_sub_signed(duration).is_none() {
            return Err(ValidationError::out_of_domain(
                PARAM_DURATION,
                "within the representable time range",
            ));
        }

        let step = positive_seconds(params, PARAM_STEP, config.default_step_secs)?;

        let mut by_labels: Vec<String> = Vec::new();
        for label in params.get_all(PARAM_BY_LABELS) {
            if !is_valid_label_name(label) {
                return Err(ValidationError::out_of_domain(
                    PARAM_BY_LABELS,
                    "a list of valid label names",
                ));
            }
            if !by_labels.iter().any(|l| l == label) {
                by_labels.push(label.to_string());
            }
        }

        let mut quantiles: Vec<f64> = Vec::new();
        for raw in params.get_all(PARAM_QUANTILES) {
            let q: f64 = raw
                .parse()
                .map_err(|e| ValidationError::unparseable(PARAM_QUANTILES, e))?;
            if !(q > 0.0 && q <= 1.0) {
                return Err(ValidationError::out_of_domain(
                    PARAM_QUANTILES,
                    "a list of numbers within (0, 1]",
                ));
            }
            if !quantiles.contains(&q) {
                quantiles.push(q);
            }
        }

        let mut filters: Vec<String> = Vec::new();
        for name in params.get_all(PARAM_FILTERS) {
            if !filters.iter().any(|f| f == name) {
                filters.push(name.to_string());
            }
        }

        Ok(Self {
            rate_interval,
            rate_func,
            query_time,
            duration,
            step,
            by_labels,
            quantiles,
            filters,
        })
    }
}

fn positive_seconds(
    params: &QueryParams,
    parameter: &'static str,
    default_secs: i64,
) -> Result<TimeDelta, ValidationError> {
    let secs = match params.get(parameter) {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|e| ValidationError::unparseable(parameter, e))?,
        None => default_secs,
    };

    if secs <= 0 {
        return Err(ValidationError::out_of_domain(
            parameter,
            "a positive number of seconds",
        ));
    }

    TimeDelta::try_seconds(secs)
        .ok_or_else(|| ValidationError::out_of_domain(parameter, "a representable number of seconds"))
}

/// Metric label names: `[a-zA-Z_][a-zA-Z0-9_]*`.
fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn parse(pairs: &[(&str, &str)]) -> Result<MetricsQuerySpec, ValidationError> {
        let params = QueryParams::from_pairs(pairs.iter().copied());
        MetricsQuerySpec::parse(&params, &MetricsConfig::default(), now())
    }

    #[test]
    fn defaults_when_no_parameters_are_given() {
        let spec = parse(&[]).expect("defaults are valid");

        assert_eq!(spec.rate_interval.to_string(), "1m");
        assert_eq!(spec.rate_func, RateFunc::Rate);
        assert_eq!(spec.query_time, now());
        assert_eq!(spec.duration, TimeDelta::minutes(30));
        assert_eq!(spec.step, TimeDelta::seconds(15));
        assert!(spec.by_labels.is_empty());
        assert!(spec.quantiles.is_empty());
        assert!(spec.filters.is_empty());
    }

    #[test]
    fn parses_every_supported_parameter() {
        let spec = parse(&[
            ("rateInterval", "5h"),
            ("rateFunc", "irate"),
            ("step", "2"),
            ("queryTime", "1523364075"),
            ("duration", "1000"),
            ("byLabels[]", "response_code"),
            ("quantiles[]", "0.5"),
            ("quantiles[]", "0.95"),
            ("filters[]", "request_count"),
            ("filters[]", "request_size"),
        ])
        .expect("valid parameters");

        assert_eq!(spec.rate_interval.to_string(), "5h");
        assert_eq!(spec.rate_func, RateFunc::Irate);
        assert_eq!(spec.step, TimeDelta::seconds(2));
        assert_eq!(spec.query_time.timestamp(), 1_523_364_075);
        assert_eq!(spec.duration, TimeDelta::seconds(1000));
        assert_eq!(spec.by_labels, vec!["response_code"]);
        assert_eq!(spec.quantiles, vec![0.5, 0.95]);
        assert_eq!(spec.filters, vec!["request_count", "request_size"]);
    }

    #[test]
    fn bad_query_time_names_the_parameter() {
        let err = parse(&[("queryTime", "abc")]).unwrap_err();
        assert_eq!(err.parameter, "queryTime");
        assert!(err
            .to_string()
            .contains("cannot parse query parameter 'queryTime'"));
    }

    #[test]
    fn query_time_is_reported_before_duration() {
        let err = parse(&[("queryTime", "abc"), ("duration", "abc"), ("step", "abc")]).unwrap_err();
        assert_eq!(err.parameter, "queryTime");
    }

    #[test]
    fn bad_duration_and_step_name_the_parameter() {
        let err = parse(&[("duration", "abc")]).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot parse query parameter 'duration'"));

        let err = parse(&[("step", "abc")]).unwrap_err();
        assert!(err.to_string().contains("cannot parse query parameter 'step'"));
    }

    #[test]
    fn non_positive_duration_and_step_are_rejected() {
        assert_eq!(parse(&[("duration", "0")]).unwrap_err().parameter, "duration");
        assert_eq!(parse(&[("duration", "-60")]).unwrap_err().parameter, "duration");
        assert_eq!(parse(&[("step", "0")]).unwrap_err().parameter, "step");
        assert_eq!(parse(&[("step", "1.5")]).unwrap_err().parameter, "step");
    }

    #[test]
    fn unknown_rate_func_lists_allowed_values() {
        let err = parse(&[("rateFunc", "invalid rate func")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "query parameter 'rateFunc' must be either 'rate' or 'irate'"
        );

        // case-sensitive
        assert!(parse(&[("rateFunc", "RATE")]).is_err());
    }

    #[test]
    fn bad_rate_interval_names_the_parameter() {
        for raw in ["abc", "5", "m5", "0s", "5x", "1m1h", "1m1m"] {
            let err = parse(&[("rateInterval", raw)]).unwrap_err();
            assert_eq!(err.parameter, "rateInterval", "input {raw}");
        }
    }

    #[test]
    fn compound_rate_intervals_are_kept_verbatim() {
        for raw in ["1h30m", "500ms", "2d", "1w", "90s"] {
            let spec = parse(&[("rateInterval", raw)]).expect(raw);
            assert_eq!(spec.rate_interval.to_string(), raw);
        }
    }

    #[test]
    fn quantiles_must_be_numbers_within_unit_interval() {
        let err = parse(&[("quantiles[]", "median")]).unwrap_err();
        assert!(err
            .to_string()
            .contains("cannot parse query parameter 'quantiles'"));

        for raw in ["0", "1.5", "-0.5", "NaN"] {
            assert_eq!(
                parse(&[("quantiles[]", raw)]).unwrap_err().parameter,
                "quantiles",
                "input {raw}"
            );
        }
        assert!(parse(&[("quantiles[]", "1")]).is_ok());
    }

    #[test]
    fn repeated_values_keep_first_occurrence_order() {
        let spec = parse(&[
            ("byLabels[]", "source_app"),
            ("byLabels[]", "response_code"),
            ("byLabels[]", "source_app"),
            ("quantiles[]", "0.99"),
            ("quantiles[]", "0.5"),
            ("quantiles[]", "0.99"),
        ])
        .unwrap();

        assert_eq!(spec.by_labels, vec!["source_app", "response_code"]);
        assert_eq!(spec.quantiles, vec![0.99, 0.5]);
    }

    #[test]
    fn label_names_must_be_plain_identifiers() {
        let err = parse(&[("byLabels[]", "code) or vector(1")]).unwrap_err();
        assert_eq!(err.parameter, "byLabels");
        assert!(parse(&[("byLabels[]", "_private"), ("byLabels[]", "app2")]).is_ok());
    }

    #[test]
    fn window_start_must_be_representable() {
        let err = parse(&[("queryTime", "0"), ("duration", "9223372036854775")]).unwrap_err();
        assert_eq!(err.parameter, "duration");
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        assert!(parse(&[("avg", "true"), ("direction", "inbound")]).is_ok());
    }
}
