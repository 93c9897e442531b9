use std::fmt;

use crate::command_runner::CommandRunner;
use crate::engine::Engine;
use crate::image_error::ImageError;
use crate::status_error::StatusError;
use crate::trust;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    EngineDown,
    ContainerAbsent,
    ImageUntrusted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusVerdict {
    Pass,
    Fail(FailReason),
}

impl StatusError {
    pub fn reason(&self) -> FailReason {
        match self {
            // A listing that fails is as good as a dead engine here.
            StatusError::Engine(_) => FailReason::EngineDown,
            StatusError::Image(ImageError::ContainerNotRunning) => FailReason::ContainerAbsent,
            StatusError::Image(ImageError::UntrustedImage(_)) => FailReason::ImageUntrusted,
        }
    }
}

impl From<&Result<(), StatusError>> for StatusVerdict {
    fn from(result: &Result<(), StatusError>) -> Self {
        match result {
            Ok(()) => StatusVerdict::Pass,
            Err(e) => StatusVerdict::Fail(e.reason()),
        }
    }
}

impl fmt::Display for StatusVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusVerdict::Pass => f.write_str("pass"),
            StatusVerdict::Fail(FailReason::EngineDown) => f.write_str("fail (engine down)"),
            StatusVerdict::Fail(FailReason::ContainerAbsent) => {
                f.write_str("fail (container absent)")
            }
            StatusVerdict::Fail(FailReason::ImageUntrusted) => {
                f.write_str("fail (image untrusted)")
            }
        }
    }
}

/// Engine reachable, container running, image allow-listed; stops at the
/// first check that fails.
pub fn check_status<R: CommandRunner>(engine: &Engine<'_, R>) -> Result<(), StatusError> {
    let settings = engine.settings();

    engine.probe()?;
    let image = engine.locate_container(&settings.container_name)?;
    trust::validate_image(image.as_deref(), &settings.allow_list())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_runner::testing::{fail, ok, ScriptedRunner};
    use crate::settings::Settings;

    fn verdict<R: CommandRunner>(engine: &Engine<'_, R>) -> StatusVerdict {
        StatusVerdict::from(&check_status(engine))
    }

    #[test]
    fn verdicts_read_as_words() {
        assert_eq!(StatusVerdict::Pass.to_string(), "pass");
        assert_eq!(
            StatusVerdict::Fail(FailReason::ContainerAbsent).to_string(),
            "fail (container absent)"
        );
    }

    #[test]
    fn engine_down_short_circuits() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| fail("daemon down"));
        let engine = Engine::new(&settings, &runner);

        assert_eq!(verdict(&engine), StatusVerdict::Fail(FailReason::EngineDown));
        assert_eq!(runner.count(&["info"]), 1);
        assert_eq!(runner.count(&["ps"]), 0);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn absent_container_fails_after_one_listing() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|_| ok(""));
        let engine = Engine::new(&settings, &runner);

        let result = check_status(&engine);

        assert!(matches!(
            result,
            Err(StatusError::Image(ImageError::ContainerNotRunning))
        ));
        assert_eq!(runner.count(&["ps"]), 1);
    }

    #[test]
    fn untrusted_image_is_reported_with_its_tag() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|invocation| {
            if invocation.args[0] == "ps" {
                ok("postgres:16\n")
            } else {
                ok("")
            }
        });
        let engine = Engine::new(&settings, &runner);

        match check_status(&engine) {
            Err(StatusError::Image(ImageError::UntrustedImage(tag))) => {
                assert_eq!(tag, "postgres:16")
            }
            other => panic!("expected UntrustedImage, got {:?}", other),
        }
    }

    #[test]
    fn listing_failure_reads_as_engine_down() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|invocation| {
            if invocation.args[0] == "ps" {
                fail("permission denied")
            } else {
                ok("")
            }
        });
        let engine = Engine::new(&settings, &runner);

        assert_eq!(verdict(&engine), StatusVerdict::Fail(FailReason::EngineDown));
    }

    #[test]
    fn healthy_stack_passes() {
        let settings = Settings::default();
        let runner = ScriptedRunner::new(|invocation| {
            if invocation.args[0] == "ps" {
                ok("sqheaven-pg:dev\n")
            } else {
                ok("")
            }
        });
        let engine = Engine::new(&settings, &runner);

        assert_eq!(verdict(&engine), StatusVerdict::Pass);
        assert_eq!(runner.calls().len(), 2);
    }
}
