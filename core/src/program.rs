//! Program handling, from file reading to type inference.
//!
//! A program is source code loaded from an input into a file database. This module offers an
//! interface to load a program source, parse it, infer the types of its top-level bindings and
//! report errors.
use crate::{
    ast,
    config::Config,
    error::{report, Error, FileId, Files, IOError, IntoDiagnostics},
    identifier::LocIdent,
    parser,
    pretty::Allocator,
    typecheck::{self, InferResult},
};

use log::debug;
use std::{
    ffi::OsString,
    io::{self, Read},
    path::Path,
};

/// The name of the source read from the standard input.
pub const STDIN_SOURCE_NAME: &str = "<stdin>";

/// A program loaded in a file database, ready to be checked.
pub struct Program {
    files: Files<String>,
    main_id: FileId,
    config: Config,
}

/// A top-level binding with its inferred type, rendered with readable variable names.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RenderedBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
}

/// The outcome of checking a program without fatal error.
#[derive(Debug)]
pub struct CheckResult {
    pub bindings: Vec<RenderedBinding>,
    pub inferred: InferResult,
}

impl CheckResult {
    fn new(inferred: InferResult) -> Self {
        let bindings = inferred
            .env
            .iter()
            .map(|(id, typing)| render_binding(id, &typing.typ))
            .collect();

        CheckResult { bindings, inferred }
    }
}

fn render_binding(id: &LocIdent, typ: &crate::typ::Type) -> RenderedBinding {
    // Variable names restart from `a` for each binding.
    RenderedBinding {
        name: id.label().to_owned(),
        typ: Allocator::default().render(typ),
    }
}

impl Program {
    /// Create a program from a source string.
    pub fn new_from_source(source: impl Into<String>, source_name: impl Into<OsString>) -> Self {
        let mut files = Files::new();
        let main_id = files.add(source_name, source.into());

        Program {
            files,
            main_id,
            config: Config::default(),
        }
    }

    /// Create a program by reading a file.
    pub fn new_from_file(path: impl AsRef<Path>) -> Result<Self, IOError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| IOError(format!("{}: {err}", path.display())))?;

        Ok(Self::new_from_source(source, path.as_os_str()))
    }

    /// Create a program by reading the standard input until the end.
    pub fn new_from_stdin() -> Result<Self, IOError> {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;

        Ok(Self::new_from_source(source, STDIN_SOURCE_NAME))
    }

    pub fn with_config(self, config: Config) -> Self {
        Program { config, ..self }
    }

    pub fn files(&self) -> &Files<String> {
        &self.files
    }

    pub fn main_id(&self) -> FileId {
        self.main_id
    }

    pub fn parse(&self) -> Result<ast::Program, Error> {
        let program = parser::parse(self.main_id, self.files.source(self.main_id))?;
        debug!("parsed {} top-level statements", program.body.len());
        Ok(program)
    }

    /// Parse the program and infer the types of its top-level bindings.
    ///
    /// Parse errors and fatal scope errors are returned as errors. A type error still produces a
    /// [CheckResult], holding the bindings inferred before the error.
    pub fn check(&self) -> Result<CheckResult, Error> {
        let program = self.parse()?;
        let inferred = typecheck::type_check(&program)?;
        Ok(CheckResult::new(inferred))
    }

    /// Report an error on stderr, in the format and with the colors of the configuration.
    pub fn report<E: IntoDiagnostics>(&self, error: E) {
        report::report(
            &self.files,
            error,
            self.config.error_format,
            self.config.color_opt,
        )
    }

    /// Render an error as plain text.
    pub fn report_as_string<E: IntoDiagnostics>(&mut self, error: E) -> String {
        report::report_as_string(&mut self.files, error)
    }
}
