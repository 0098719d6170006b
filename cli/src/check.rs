use std::io::{self, Write};

use jszero_core::{
    config::Config,
    error::report::ErrorFormat,
    program::{Program, RenderedBinding},
};
use log::debug;
use serde::Serialize;

use crate::{
    cli::{GlobalOptions, InputOptions},
    error::{CliResult, Error, ResultErrorExt},
};

#[derive(clap::Parser, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    inputs: InputOptions,

    /// Output format of the inferred types and of the error diagnostics
    #[arg(long, value_enum, default_value_t)]
    format: ErrorFormat,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    file: String,
    bindings: &'a [RenderedBinding],
}

impl CheckCommand {
    pub fn run(self, global: GlobalOptions) -> CliResult<()> {
        let config = Config {
            color_opt: global.color_opt(),
            error_format: self.format,
        };

        if self.inputs.files.is_empty() {
            let program = Program::new_from_stdin()
                .map_err(|error| Error::Io { error, config })?
                .with_config(config);
            return self.check(program, false);
        }

        let with_header = self.inputs.files.len() > 1;

        for path in &self.inputs.files {
            let program = Program::new_from_file(path)
                .map_err(|error| Error::Io { error, config })?
                .with_config(config);
            self.check(program, with_header)?;
        }

        Ok(())
    }

    fn check(&self, program: Program, with_header: bool) -> CliResult<()> {
        let result = match program.check() {
            Ok(result) => result,
            Err(error) => return Err(error).report_with_program(program),
        };

        let file = program
            .files()
            .name(program.main_id())
            .to_string_lossy()
            .into_owned();
        debug!("{file}: {} bindings inferred", result.bindings.len());

        let mut stdout = io::stdout().lock();

        match self.format {
            ErrorFormat::Text => {
                if with_header {
                    writeln!(stdout, "// {file}")?;
                }

                for binding in &result.bindings {
                    writeln!(stdout, "{}: {}", binding.name, binding.typ)?;
                }
            }
            ErrorFormat::Json => {
                let output = JsonOutput {
                    file,
                    bindings: &result.bindings,
                };
                serde_json::to_writer(&mut stdout, &output).map_err(io::Error::from)?;
                writeln!(stdout)?;
            }
        }

        stdout.flush()?;

        match result.inferred.type_error {
            Some(error) => Err(error).report_with_program(program),
            None => Ok(()),
        }
    }
}
