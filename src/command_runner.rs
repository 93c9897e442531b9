use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

/// What to do with a child process's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout and stderr into the returned [`CommandOutput`].
    Capture,
    /// Send both streams to the null device.
    Discard,
    /// Let the child write straight to our terminal.
    Inherit,
}

/// A single external program invocation, expressed as an argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub output: OutputMode,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            output: OutputMode::Capture,
        }
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }

    /// Human readable form, for logs only. Never handed to a shell.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Result of a process that was launched and ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Launches external programs. An `Err` means the program could not be
/// started; a non-zero exit is reported through [`CommandOutput`].
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Runs invocations as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        debug!(command = %invocation.command_line(), cwd = ?invocation.cwd, "running");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        match invocation.output {
            OutputMode::Capture => {
                let output = command.output()?;
                Ok(CommandOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            OutputMode::Discard => {
                let status = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()?;
                Ok(CommandOutput {
                    code: status.code(),
                    ..CommandOutput::default()
                })
            }
            OutputMode::Inherit => {
                let status = command.status()?;
                Ok(CommandOutput {
                    code: status.code(),
                    ..CommandOutput::default()
                })
            }
        }
    }
}
