//! Configuration validation.

use std::collections::HashSet;
use std::path::Path;

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_supervisor(config, &mut result);
        Self::validate_jobs(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_supervisor(config: &Config, result: &mut ValidationResult) {
        if config.supervisor.settings_path.is_empty() {
            result.add_error(ValidationError::new(
                "supervisor.settings_path",
                "Settings path cannot be empty",
            ));
        }

        if config.supervisor.grace_period_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "supervisor.grace_period_ms",
                "grace period is 0, process jobs will be killed without a chance to exit",
            ));
        }
    }

    fn validate_jobs(config: &Config, result: &mut ValidationResult) {
        if config.jobs.is_empty() {
            result.add_warning(ValidationWarning::new("jobs", "No jobs configured"));
            return;
        }

        let mut seen = HashSet::new();
        for (i, job) in config.jobs.iter().enumerate() {
            let prefix = format!("jobs[{}]", i);

            if job.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.name", prefix),
                    "Job name cannot be empty",
                ));
            } else if !seen.insert(job.name.as_str()) {
                result.add_error(ValidationError::new(
                    format!("{}.name", prefix),
                    format!("Duplicate job name '{}'", job.name),
                ));
            }

            if job.interval_secs == 0 {
                result.add_error(ValidationError::new(
                    format!("{}.interval_secs", prefix),
                    "interval_secs must be greater than 0",
                ));
            }

            if job.command.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.command", prefix),
                    "Command cannot be empty",
                ));
            }

            if let Some(ref dir) = job.working_dir {
                if !Path::new(dir).is_dir() {
                    result.add_warning(ValidationWarning::new(
                        format!("{}.working_dir", prefix),
                        format!("Working directory does not exist: {}", dir),
                    ));
                }
            }

            // Missing inputs only block start, they may appear later.
            for path in &job.requires {
                if !Path::new(path).exists() {
                    result.add_warning(ValidationWarning::new(
                        format!("{}.requires", prefix),
                        format!("Required path does not exist yet: {}", path),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
