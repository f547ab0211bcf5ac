use thiserror::Error;

use crate::model::Variable;

/// Errors produced by the outlook engine itself.
///
/// Absence of data inside a window is not an error; it surfaces as `None`
/// fields on the estimates instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutlookError {
    /// No parseable date rows were left for a variable.
    #[error("no usable historical data for {variable}")]
    EmptySeries { variable: Variable },

    /// A user-supplied date could not be parsed.
    #[error("invalid date '{input}'; use YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("unknown variable '{name}'. Supported variables: temperature, precipitation, wind, aerosol.")]
    UnknownVariable { name: String },
}

pub type OutlookResult<T> = std::result::Result<T, OutlookError>;
