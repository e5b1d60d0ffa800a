use thiserror::Error;

use crate::domain::ModelKind;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - `2`: usage, configuration or input-format problems
/// - `3`: not enough data to analyze
/// - `4`: fetch, IO or other runtime failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised inside the conjecture engine.
///
/// Only `InsufficientData` ends the analysis of a sequence; the per-trial
/// variants are downgraded by the selector to "skip this trial".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("numeric instability in {kind} (complexity {complexity}): {reason}")]
    NumericInstability {
        kind: ModelKind,
        complexity: usize,
        reason: String,
    },

    #[error("invalid {kind} parameters: {reason}")]
    InvalidModelParameters { kind: ModelKind, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub(crate) fn unstable(kind: ModelKind, complexity: usize, reason: impl Into<String>) -> Self {
        EngineError::NumericInstability {
            kind,
            complexity,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_params(kind: ModelKind, reason: impl Into<String>) -> Self {
        EngineError::InvalidModelParameters {
            kind,
            reason: reason.into(),
        }
    }

    /// `true` for errors that only invalidate a single `(kind, complexity)` trial.
    pub fn is_trial_local(&self) -> bool {
        matches!(
            self,
            EngineError::NumericInstability { .. } | EngineError::InvalidModelParameters { .. }
        )
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let code = match err {
            EngineError::InsufficientData(_) => 3,
            EngineError::InvalidConfig(_) => 2,
            EngineError::NumericInstability { .. } | EngineError::InvalidModelParameters { .. } => 4,
        };
        AppError::new(code, err.to_string())
    }
}
