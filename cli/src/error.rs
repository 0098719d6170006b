use jszero_core::{
    config::Config,
    error::{report, Files, IOError},
    program::Program,
};

pub enum Error {
    Program {
        program: Program,
        error: jszero_core::error::Error,
    },
    /// An input couldn't be read. There is no program yet, but the error is still reported in the
    /// requested format.
    Io { error: IOError, config: Config },
    /// Output couldn't be written on stdout.
    Output { error: std::io::Error },
}

pub type CliResult<T> = Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Output { error }
    }
}

pub trait ResultErrorExt<T> {
    fn report_with_program(self, program: Program) -> CliResult<T>;
}

impl<T, E: Into<jszero_core::error::Error>> ResultErrorExt<T> for Result<T, E> {
    fn report_with_program(self, program: Program) -> CliResult<T> {
        self.map_err(|error| Error::Program {
            program,
            error: error.into(),
        })
    }
}

impl Error {
    pub fn report(self) {
        match self {
            Error::Program { program, error } => program.report(error),
            Error::Io { error, config } => {
                report::report(&Files::new(), error, config.error_format, config.color_opt)
            }
            Error::Output { error } => eprintln!("{error}"),
        }
    }
}
