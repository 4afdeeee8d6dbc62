use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipemux_engine::{Config, Supervisor};

use crate::cmd::RunArgs;
use crate::exit::{engine_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_summary, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let cfg = build_config(&args)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    tracing::info!(
        producers = cfg.producers,
        budget_secs = cfg.run_budget.as_secs(),
        log = %cfg.log_path.display(),
        "starting run"
    );

    let summary = Supervisor::new(cfg.clone())
        .run(&running)
        .map_err(|err| engine_error("run failed", err))?;

    print_summary(&summary, &cfg.log_path.display().to_string(), format);
    Ok(SUCCESS)
}

fn build_config(args: &RunArgs) -> CliResult<Config> {
    if args.producers == 0 {
        return Err(CliError::new(USAGE, "--producers must be at least 1"));
    }
    Ok(Config {
        producers: args.producers,
        run_budget: parse_duration(&args.duration)?,
        max_sleep: parse_duration(&args.max_sleep)?,
        seed: args.seed,
        log_path: args.output.clone(),
        relay_stdin: !args.no_relay,
        ..Config::default()
    })
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
