use tracing::debug;

use crate::command_runner::{CommandOutput, CommandRunner, Invocation, OutputMode};
use crate::engine_error::EngineError;
use crate::settings::Settings;

/// The container engine and compose CLIs, driven through a [`CommandRunner`].
pub struct Engine<'a, R: CommandRunner> {
    settings: &'a Settings,
    runner: R,
}

impl<'a, R: CommandRunner> Engine<'a, R> {
    pub fn new(settings: &'a Settings, runner: R) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Checks that the engine daemon answers its info query.
    pub fn probe(&self) -> Result<(), EngineError> {
        let invocation = Invocation::new(&self.settings.engine, ["info"]).output(OutputMode::Discard);

        match self.runner.run(&invocation) {
            Ok(output) if output.success() => Ok(()),
            Ok(output) => {
                debug!(code = ?output.code, "engine info query failed");
                Err(EngineError::Unreachable)
            }
            Err(e) => {
                debug!(error = %e, "engine could not be launched");
                Err(EngineError::Unreachable)
            }
        }
    }

    /// Whether `image` exists locally. Any failure, including an engine that
    /// is down, reads as `false`.
    pub fn is_image_built(&self, image: &str) -> bool {
        let invocation = Invocation::new(&self.settings.engine, ["image", "inspect", image])
            .output(OutputMode::Discard);

        matches!(self.runner.run(&invocation), Ok(output) if output.success())
    }

    /// Returns the image of the running container called `name`, or `None`
    /// if there is none. A failing listing is an error, not `None`.
    pub fn locate_container(&self, name: &str) -> Result<Option<String>, EngineError> {
        let filter = format!("name=^{}$", name);
        let invocation = Invocation::new(
            &self.settings.engine,
            ["ps", "--filter", filter.as_str(), "--format", "{{.Image}}"],
        );

        let output = self.runner.run(&invocation).map_err(|source| EngineError::Launch {
            program: self.settings.engine.clone(),
            source,
        })?;
        if !output.success() {
            return Err(EngineError::ListFailed {
                stderr: output.stderr.trim().to_owned(),
            });
        }

        let image = parse_image_column(&output.stdout);
        debug!(container = name, image = ?image, "located container");

        Ok(image)
    }

    /// Asks PostgreSQL inside the compose service whether it accepts
    /// connections.
    pub fn is_database_ready(&self) -> bool {
        let settings = self.settings;
        let probe = self.compose(&[
            "exec",
            "-T",
            &settings.service,
            "pg_isready",
            "-U",
            &settings.readiness.user,
        ]);
        let invocation = match probe {
            Ok(invocation) => invocation
                .current_dir(&settings.compose_dir)
                .output(OutputMode::Discard),
            Err(e) => {
                debug!(error = %e, "no readiness probe to run");
                return false;
            }
        };

        matches!(self.runner.run(&invocation), Ok(output) if output.success())
    }

    /// Builds a compose invocation. No working directory is set.
    pub fn compose(&self, args: &[&str]) -> Result<Invocation, EngineError> {
        let (program, prefix) = self
            .settings
            .compose
            .split_first()
            .ok_or(EngineError::NoCompose)?;

        let mut invocation = Invocation::new(program, prefix.iter().cloned());
        invocation.args.extend(args.iter().map(|arg| arg.to_string()));
        Ok(invocation)
    }

    pub fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.runner.run(invocation)
    }
}

/// Interprets `ps --format {{.Image}}` output. Blank output means no match.
pub fn parse_image_column(stdout: &str) -> Option<String> {
    let image = stdout.trim();
    if image.is_empty() {
        None
    } else {
        Some(image.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::command_runner::testing::{fail, ok, ScriptedRunner};

    #[test]
    fn blank_listing_means_no_container() {
        assert_eq!(parse_image_column(""), None);
        assert_eq!(parse_image_column("  \n\t"), None);
    }

    #[test]
    fn listing_is_trimmed() {
        assert_eq!(
            parse_image_column("sqheaven-pg:latest\n"),
            Some("sqheaven-pg:latest".to_owned())
        );
    }

    #[test]
    fn locate_asks_for_exact_name_and_image_column_only() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| ok("sqheaven-pg:latest\n"));
        let engine = Engine::new(&settings, &runner);

        let image = engine.locate_container("sqheaven-postgres").unwrap();

        assert_eq!(image.as_deref(), Some("sqheaven-pg:latest"));
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "docker");
        assert_eq!(
            calls[0].args,
            vec!["ps", "--filter", "name=^sqheaven-postgres$", "--format", "{{.Image}}"]
        );
    }

    #[test]
    fn locate_returns_none_for_empty_listing() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| ok("\n"));
        let engine = Engine::new(&settings, &runner);

        assert_eq!(engine.locate_container("sqheaven-postgres").unwrap(), None);
    }

    #[test]
    fn failing_listing_is_an_infrastructure_error() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| fail("Cannot connect to the Docker daemon\n"));
        let engine = Engine::new(&settings, &runner);

        match engine.locate_container("sqheaven-postgres") {
            Err(EngineError::ListFailed { stderr }) => {
                assert_eq!(stderr, "Cannot connect to the Docker daemon")
            }
            other => panic!("expected ListFailed, got {:?}", other),
        }
    }

    #[test]
    fn probe_treats_launch_failure_as_unreachable() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| Err(io::Error::from(io::ErrorKind::NotFound)));
        let engine = Engine::new(&settings, &runner);

        assert!(matches!(engine.probe(), Err(EngineError::Unreachable)));
    }

    #[test]
    fn probe_discards_output_of_info() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| ok("lots of engine details"));
        let engine = Engine::new(&settings, &runner);

        assert!(engine.probe().is_ok());
        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["info"]);
        assert_eq!(calls[0].output, OutputMode::Discard);
    }

    #[test]
    fn missing_image_is_false_not_an_error() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| fail("No such image"));
        let engine = Engine::new(&settings, &runner);

        assert!(!engine.is_image_built("sqheaven-pg:latest"));
    }

    #[test]
    fn built_image_is_true() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| ok("[]"));
        let engine = Engine::new(&settings, &runner);

        assert!(engine.is_image_built("sqheaven-pg:latest"));
        assert_eq!(runner.count(&["image", "inspect", "sqheaven-pg:latest"]), 1);
    }

    #[test]
    fn compose_prefix_args_come_first() {
        let settings = Settings {
            compose: vec!["docker".to_owned(), "compose".to_owned()],
            ..Settings::default()
        };
        let runner = ScriptedRunner::new(|_| ok(""));
        let engine = Engine::new(&settings, &runner);

        let invocation = engine.compose(&["up", "-d"]).unwrap();

        assert_eq!(invocation.program, "docker");
        assert_eq!(invocation.args, vec!["compose", "up", "-d"]);
        assert_eq!(invocation.cwd, None);
    }

    #[test]
    fn empty_compose_is_an_error() {
        let settings = Settings {
            compose: Vec::new(),
            ..Settings::default()
        };
        let runner = ScriptedRunner::new(|_| ok(""));
        let engine = Engine::new(&settings, &runner);

        assert!(matches!(engine.compose(&["build"]), Err(EngineError::NoCompose)));
        assert!(!engine.is_database_ready());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn readiness_probe_runs_pg_isready_in_service() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| ok(""));
        let engine = Engine::new(&settings, &runner);

        assert!(engine.is_database_ready());
        let calls = runner.calls();
        assert_eq!(calls[0].program, "docker-compose");
        assert_eq!(
            calls[0].args,
            vec!["exec", "-T", "db", "pg_isready", "-U", "postgres"]
        );
    }
}
