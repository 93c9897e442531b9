use std::io::{self, Write};

use anyhow::Context;

pub mod command_runner;
pub mod engine;
pub mod engine_error;
pub mod exec_error;
pub mod executor;
pub mod image_error;
pub mod invalid_command_error;
pub mod lifecycle;
pub mod lifecycle_error;
pub mod settings;
pub mod status;
pub mod status_error;
pub mod trust;
pub mod workdir;

mod opts;
pub use opts::{Command, Opts};

use command_runner::{CommandRunner, SystemRunner};
use engine::Engine;
use executor::Executor;
use lifecycle::{Controller, ReadinessPolicy, ThreadSleep};
use settings::Settings;
use status::StatusVerdict;

const VERSION_QUERY: &str = "psql -U postgres -c 'SELECT version();'";

pub fn run(opts: Opts) -> anyhow::Result<()> {
    let settings = Settings::new(opts.config.as_deref()).context("failed to load settings")?;

    dispatch(opts.command, &settings, SystemRunner)
}

fn dispatch<R: CommandRunner>(
    command: Command,
    settings: &Settings,
    runner: R,
) -> anyhow::Result<()> {
    let engine = Engine::new(settings, &runner);

    match command {
        Command::Status => report_status(&engine, &mut io::stdout())?,
        Command::Build => {
            println!("=> building SQHeaven image with compose...");
            controller(engine, settings).build()?;
            println!("=> SQHeaven image built.");
        }
        Command::Start => {
            println!("=> starting SQHeaven database...");
            controller(engine, settings).start()?;
            println!("=> PostgreSQL is ready.");
        }
        Command::Stop => {
            println!("=> stopping SQHeaven database...");
            controller(engine, settings).stop()?;
            println!("=> SQHeaven database stopped.");
        }
        Command::Exec { command } => {
            let output = Executor::new(engine).execute_args(&command)?;
            println!("{}", output);
        }
        Command::ImageBuilt => {
            if engine.is_image_built(&settings.image) {
                println!("{} is built.", settings.image);
            } else {
                println!("{} is not built.", settings.image);
            }
        }
        Command::Version => version(engine, settings)?,
    }

    Ok(())
}

fn controller<'a, R: CommandRunner>(
    engine: Engine<'a, R>,
    settings: &Settings,
) -> Controller<'a, R, ThreadSleep> {
    Controller::new(engine, ReadinessPolicy::from(&settings.readiness), ThreadSleep)
}

/// Prints the status verdict, then fails if the verdict was a failure.
fn report_status<R: CommandRunner, W: Write>(
    engine: &Engine<'_, R>,
    out: &mut W,
) -> anyhow::Result<()> {
    let result = status::check_status(engine);

    writeln!(out, "status: {}", StatusVerdict::from(&result))?;
    if result.is_ok() {
        writeln!(out, "All checks passed.")?;
    }
    result?;

    Ok(())
}

/// Starts the database, prints its version, and runs the status check
/// whatever happened before it.
fn version<R: CommandRunner>(engine: Engine<'_, R>, settings: &Settings) -> anyhow::Result<()> {
    let mut controller = controller(engine, settings);

    let outcome = controller
        .start()
        .context("failed to start SQHeaven")
        .and_then(|()| {
            Executor::new(Engine::new(settings, controller.engine().runner()))
                .execute(VERSION_QUERY)
                .context("failed to query PostgreSQL version")
        });
    if let Ok(version) = &outcome {
        println!("=> PostgreSQL version:\n{}", version);
    }

    let status = report_status(controller.engine(), &mut io::stdout());

    outcome?;
    status?;

    Ok(())
}
