//! Configuration for checking and reporting.

use crate::error::report::{ColorOpt, ErrorFormat};

#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// The color option to use when reporting errors.
    pub color_opt: ColorOpt,
    /// The format errors are reported in.
    pub error_format: ErrorFormat,
}
