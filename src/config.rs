use anyhow::{Context, Result, anyhow, bail};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::attendance::report::ReportOptions;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_level: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_clock_per_min: u32,

    // Attendance rules
    pub arrival_tolerance_minutes: i64,
    pub overtime_threshold_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),

            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,
            rate_clock_per_min: parse_or("RATE_CLOCK_PER_MIN", 10)?,

            arrival_tolerance_minutes: non_negative_or("ARRIVAL_TOLERANCE_MINUTES", 5)?,
            overtime_threshold_hours: non_negative_or("OVERTIME_THRESHOLD_HOURS", 7)?,
        })
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            tolerance_minutes: self.arrival_tolerance_minutes,
            overtime_threshold_minutes: self.overtime_threshold_hours * 60,
        }
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {name}: {e}")),
        Err(_) => Ok(default),
    }
}

fn non_negative_or(name: &str, default: i64) -> Result<i64> {
    let value = parse_or(name, default)?;
    if value < 0 {
        bail!("{name} must not be negative, got {value}");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvGuard {
        key: &'static str,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            unsafe { env::remove_var(self.key) };
        }
    }

    fn set_env(key: &'static str, value: &str) -> EnvGuard {
        unsafe { env::set_var(key, value) };
        EnvGuard { key }
    }

    #[test]
    fn parse_or_uses_default_when_unset() {
        unsafe { env::remove_var("TIMECLOCK_TEST_UNSET") };
        assert_eq!(parse_or("TIMECLOCK_TEST_UNSET", 7_i64).unwrap(), 7);
    }

    #[test]
    fn parse_or_reads_override() {
        let _guard = set_env("TIMECLOCK_TEST_TOLERANCE", " 10 ");
        assert_eq!(parse_or("TIMECLOCK_TEST_TOLERANCE", 5_i64).unwrap(), 10);
    }

    #[test]
    fn parse_or_rejects_garbage() {
        let _guard = set_env("TIMECLOCK_TEST_RATE", "lots");
        assert!(parse_or::<u32>("TIMECLOCK_TEST_RATE", 10).is_err());
    }

    #[test]
    fn negative_attendance_rules_are_rejected() {
        let _guard = set_env("TIMECLOCK_TEST_NEGATIVE", "-5");
        let err = non_negative_or("TIMECLOCK_TEST_NEGATIVE", 5).unwrap_err();
        assert!(err.to_string().contains("TIMECLOCK_TEST_NEGATIVE"));
    }

    #[test]
    fn zero_tolerance_is_allowed() {
        let _guard = set_env("TIMECLOCK_TEST_ZERO", "0");
        assert_eq!(non_negative_or("TIMECLOCK_TEST_ZERO", 5).unwrap(), 0);
    }

    #[test]
    fn required_reports_missing_variable() {
        unsafe { env::remove_var("TIMECLOCK_TEST_REQUIRED") };
        let err = required("TIMECLOCK_TEST_REQUIRED").unwrap_err();
        assert!(err.to_string().contains("TIMECLOCK_TEST_REQUIRED"));
    }

    #[test]
    fn report_options_convert_hours() {
        let config = Config {
            database_url: String::new(),
            jwt_secret: String::new(),
            server_addr: String::new(),
            api_prefix: "/api".into(),
            log_level: "info".into(),
            rate_protected_per_min: 1000,
            rate_clock_per_min: 10,
            arrival_tolerance_minutes: 3,
            overtime_threshold_hours: 8,
        };
        let options = config.report_options();
        assert_eq!(options.tolerance_minutes, 3);
        assert_eq!(options.overtime_threshold_minutes, 480);
    }
}
