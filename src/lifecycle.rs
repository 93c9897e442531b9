use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::command_runner::{CommandOutput, CommandRunner, OutputMode};
use crate::engine::Engine;
use crate::lifecycle_error::LifecycleError;
use crate::settings::Readiness;
use crate::workdir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Starting,
    WaitingReady,
    Ready,
    StopRequested,
}

/// How long to wait for PostgreSQL after bringing the service up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl ReadinessPolicy {
    /// The database is always probed at least once.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self::from(&Readiness::default())
    }
}

impl From<&Readiness> for ReadinessPolicy {
    fn from(readiness: &Readiness) -> Self {
        Self::new(readiness.interval(), readiness.max_attempts)
    }
}

/// Delay between readiness attempts.
pub trait Sleep {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleep + ?Sized> Sleep for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

pub struct Controller<'a, R: CommandRunner, S: Sleep> {
    engine: Engine<'a, R>,
    policy: ReadinessPolicy,
    sleeper: S,
    state: LifecycleState,
}

impl<'a, R: CommandRunner, S: Sleep> Controller<'a, R, S> {
    pub fn new(engine: Engine<'a, R>, policy: ReadinessPolicy, sleeper: S) -> Self {
        Self {
            engine,
            policy,
            sleeper,
            state: LifecycleState::Stopped,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn engine(&self) -> &Engine<'a, R> {
        &self.engine
    }

    /// Builds the image with compose from inside the compose directory. Not
    /// retried.
    pub fn build(&mut self) -> Result<(), LifecycleError> {
        let settings = self.engine.settings();
        info!(dir = %settings.compose_dir.display(), "building image");

        // Restored on every way out of this function.
        let _dir = workdir::enter(&settings.compose_dir).map_err(LifecycleError::Workdir)?;

        let invocation = self.engine.compose(&["build"])?.output(OutputMode::Inherit);
        let output = self.engine.run(&invocation);
        check(output, &invocation.command_line()).map_err(LifecycleError::BuildFailed)?;

        info!(image = %settings.image, "image built");
        Ok(())
    }

    /// Brings the service up and waits for the database. Does nothing if the
    /// container is already running.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        let settings = self.engine.settings();
        self.engine.probe()?;

        if let Some(image) = self.engine.locate_container(&settings.container_name)? {
            info!(container = %settings.container_name, image = %image, "already running");
            self.state = LifecycleState::Ready;
            return Ok(());
        }

        self.state = LifecycleState::Starting;
        info!(container = %settings.container_name, "starting");
        let invocation = self
            .engine
            .compose(&["up", "-d"])?
            .current_dir(&settings.compose_dir)
            .output(OutputMode::Inherit);
        let output = self.engine.run(&invocation);
        if let Err(detail) = check(output, &invocation.command_line()) {
            self.state = LifecycleState::Stopped;
            return Err(LifecycleError::StartFailed(detail));
        }

        self.state = LifecycleState::WaitingReady;
        self.wait_ready()?;
        self.state = LifecycleState::Ready;

        Ok(())
    }

    /// Polls the readiness probe until it succeeds or attempts run out.
    /// Returns the number of attempts used.
    pub fn wait_ready(&mut self) -> Result<u32, LifecycleError> {
        let ReadinessPolicy {
            interval,
            max_attempts,
        } = self.policy;

        for attempt in 1..=max_attempts {
            if self.engine.is_database_ready() {
                info!(attempt, "PostgreSQL is ready");
                return Ok(attempt);
            }

            warn!(attempt, max_attempts, "PostgreSQL not ready yet");
            if attempt < max_attempts {
                self.sleeper.sleep(interval);
            }
        }

        Err(LifecycleError::ReadinessTimeout {
            attempts: max_attempts,
        })
    }

    /// Takes the service down. Does nothing if no container is running.
    pub fn stop(&mut self) -> Result<(), LifecycleError> {
        let settings = self.engine.settings();

        if self.engine.locate_container(&settings.container_name)?.is_none() {
            info!(container = %settings.container_name, "not running");
            self.state = LifecycleState::Stopped;
            return Ok(());
        }

        self.state = LifecycleState::StopRequested;
        info!(container = %settings.container_name, "stopping");
        let invocation = self
            .engine
            .compose(&["down"])?
            .current_dir(&settings.compose_dir)
            .output(OutputMode::Inherit);
        let output = self.engine.run(&invocation);
        check(output, &invocation.command_line()).map_err(LifecycleError::StopFailed)?;

        self.state = LifecycleState::Stopped;
        Ok(())
    }
}

/// Folds a launch failure or a non-zero exit into a single message.
fn check(output: std::io::Result<CommandOutput>, command: &str) -> Result<(), String> {
    match output {
        Ok(output) if output.success() => Ok(()),
        Ok(output) => match output.code {
            Some(code) => Err(format!("`{}` exited with status {}", command, code)),
            None => Err(format!("`{}` was terminated by a signal", command)),
        },
        Err(e) => Err(format!("could not run `{}`: {}", command, e)),
    }
}
