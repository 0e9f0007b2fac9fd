//! Centralized error handling for grid_collapse
//!
//! Every fallible operation in the crate returns [`Result`], carrying a
//! [`GridError`] that names the offending value so callers can report it as-is.

use std::fmt;

/// Main error type for grid_collapse operations
#[derive(Debug)]
pub enum GridError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Weighting scheme other than the supported ones
    UnsupportedWeighting(String),

    /// Plot styling value (colour, line style) that cannot be interpreted
    UnsupportedStyle { kind: &'static str, value: String },

    /// Exact coordinate lookup missed every label on an axis
    CoordinateNotFound { axis: &'static str, value: f64 },

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Dimension not found in variable
    DimensionNotFound { var: String, dim: String },

    /// CF time `units` attribute missing or malformed
    InvalidTimeUnits(String),

    /// CF calendar that cannot be mapped onto the proleptic Gregorian calendar
    UnsupportedCalendar(String),

    /// Date string that is not `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    InvalidDate(String),

    /// Arrays or coordinate labels whose lengths disagree
    ShapeMismatch { expected: Vec<usize>, found: Vec<usize> },

    /// Argument outside the domain an operation accepts
    InvalidArgument(String),

    /// Drawing backend failure
    RenderError(String),

    /// Thread pool configuration error
    ThreadPoolError(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            GridError::IoError(e) => write!(f, "I/O error: {}", e),
            GridError::ArrayError(e) => write!(f, "Array error: {}", e),
            GridError::UnsupportedWeighting(w) => {
                write!(f, "{} is an unknown weighting scheme", w)
            }
            GridError::UnsupportedStyle { kind, value } => {
                write!(f, "Unsupported {} '{}'", kind, value)
            }
            GridError::CoordinateNotFound { axis, value } => {
                write!(f, "No '{}' coordinate equal to {}", axis, value)
            }
            GridError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            GridError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            GridError::InvalidTimeUnits(units) => write!(f, "Invalid time units '{}'", units),
            GridError::UnsupportedCalendar(cal) => write!(f, "Unsupported calendar '{}'", cal),
            GridError::InvalidDate(s) => write!(f, "Invalid date '{}'", s),
            GridError::ShapeMismatch { expected, found } => {
                write!(f, "Shape mismatch: expected {:?}, found {:?}", expected, found)
            }
            GridError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            GridError::RenderError(msg) => write!(f, "Rendering error: {}", msg),
            GridError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::NetCDFError(e) => Some(e),
            GridError::IoError(e) => Some(e),
            GridError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GridError {
    fn from(error: netcdf::Error) -> Self {
        GridError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GridError {
    fn from(error: std::io::Error) -> Self {
        GridError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for GridError {
    fn from(error: ndarray::ShapeError) -> Self {
        GridError::ArrayError(error)
    }
}

/// Result type alias for grid_collapse operations
pub type Result<T> = std::result::Result<T, GridError>;
