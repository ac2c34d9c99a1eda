//! Protocol Arena benchmark client - main CLI application
//!
//! Probes every configured backend, runs the selected benchmark categories
//! against the active ones and prints the report.

use clap::Parser;
use protocol_arena::{
    build_info,
    cli::Cli,
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    executor::BenchmarkSuite,
    logging::{BenchmarkLogger, LoggerFactory},
    models::Config,
    output::OutputCoordinator,
    server::{ServerManager, ServerSpec},
};
use std::path::Path;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.env_help {
        print!("{}", EnvManager::display_env_help());
        return Ok(());
    }
    if cli.init_env {
        EnvManager::save_example_env_file(Path::new(".env.example"))?;
        println!("Wrote .env.example");
        return Ok(());
    }

    if cli.debug {
        eprintln!("{}", build_info());
        eprintln!("Debug mode enabled");
        eprintln!();
    }

    let config = load_config(cli)?;

    if config.debug {
        print_debug_details(&config)?;
    }

    let factory = LoggerFactory::new(config.clone());
    let bench_logger = factory.create_benchmark_logger().await;
    let manager = ServerManager::new(factory.create_logger("SERVER").await);

    let handles = if config.spawn_servers {
        manager.start_all(&ServerSpec::from_config(&config)).await?
    } else {
        Vec::new()
    };

    let result = run_suite(config, bench_logger).await;

    manager.stop_all(handles).await;
    result
}

/// Run the suite, print the report and fail when nothing could be measured
async fn run_suite(config: Config, logger: BenchmarkLogger) -> Result<()> {
    let coordinator = OutputCoordinator::from_config(&config);
    let suite = BenchmarkSuite::from_config(config, logger)?;

    if suite.config().verbose && !suite.config().json_output {
        eprintln!(
            "Running {:?} against {} protocol(s)...",
            suite.config().category,
            suite.config().protocols.len()
        );
    }

    let report = suite.run().await?;
    println!("{}", coordinator.display_report(&report)?);

    report.ensure_active()
}

fn print_debug_details(config: &Config) -> Result<()> {
    eprintln!("Configuration loaded successfully:");
    for line in display_config_summary(config).lines() {
        eprintln!("  {}", line);
    }

    for warning in EnvManager::validate_current_env() {
        eprintln!("{}", warning);
    }
    if let Some(warnings) = EnvManager::check_env_file(Path::new(".env"))? {
        for warning in warnings {
            eprintln!(".env {}", warning);
        }
    }
    eprintln!();
    Ok(())
}
