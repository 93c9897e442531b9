use tracing::{debug, warn};

use crate::command_runner::{CommandRunner, OutputMode};
use crate::engine::Engine;
use crate::exec_error::ExecError;
use crate::invalid_command_error::InvalidCommandError;

/// Runs commands inside a compose service of the SQHeaven container.
pub struct Executor<'a, R: CommandRunner> {
    engine: Engine<'a, R>,
}

impl<'a, R: CommandRunner> Executor<'a, R> {
    pub fn new(engine: Engine<'a, R>) -> Self {
        Self { engine }
    }

    /// Executes `command` in `service` and returns its trimmed stdout, or its
    /// stderr when stdout is empty. The command is split with [`tokenize`].
    ///
    /// A command that runs but exits non-zero still yields `Ok`, carrying a
    /// message with the command and its stderr, so callers can show the
    /// remote error and carry on. Only the running check is repeated here;
    /// the container's image is not re-validated.
    pub fn execute_in(&self, service: &str, command: &str) -> Result<String, ExecError> {
        self.run_in(service, &tokenize(command), command)
    }

    /// [`Executor::execute_in`] against the configured service.
    pub fn execute(&self, command: &str) -> Result<String, ExecError> {
        self.execute_in(&self.engine.settings().service, command)
    }

    /// Like [`Executor::execute`], for a command that is already split into
    /// arguments. Arguments are passed through untouched.
    pub fn execute_args(&self, args: &[String]) -> Result<String, ExecError> {
        self.run_in(&self.engine.settings().service, args, &args.join(" "))
    }

    fn run_in(&self, service: &str, args: &[String], command: &str) -> Result<String, ExecError> {
        // Validate the command.
        if args.is_empty() {
            return Err(InvalidCommandError::Empty.into());
        }

        // Make sure the container is still running right now.
        let settings = self.engine.settings();
        if self.engine.locate_container(&settings.container_name)?.is_none() {
            return Err(ExecError::ContainerNotRunning);
        }

        // Execute the requested command.
        let mut exec_args = vec!["exec", "-T", service];
        exec_args.extend(args.iter().map(String::as_str));
        let invocation = self
            .engine
            .compose(&exec_args)?
            .current_dir(&settings.compose_dir)
            .output(OutputMode::Capture);
        debug!(service, command, "executing in container");

        let output = self
            .engine
            .run(&invocation)
            .map_err(|source| ExecError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        if !output.success() {
            warn!(service, command, code = ?output.code, "command failed in container");
            return Ok(format!(
                "Error executing command: {}\n{}",
                command,
                output.stderr.trim()
            ));
        }

        let stdout = output.stdout.trim();
        if stdout.is_empty() {
            Ok(output.stderr.trim().to_owned())
        } else {
            Ok(stdout.to_owned())
        }
    }
}

/// Splits on whitespace only. Quotes are not interpreted, so an argument
/// containing spaces cannot be passed through.
pub fn tokenize(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_owned).collect()
}
