use clap::{Args, Parser, Subcommand, ValueEnum};
use em_app::{
    AppError, AppResult, EngineChoice, RunOptions, RunProgressEvent, RunRequest, SmokeEvent,
    SmokeOptions, project_service, run_service,
};
use em_results::{RunOutcomeRecord, hash::short_id};
use em_solver::SolverError;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "em-cli")]
#[command(about = "emflow CLI - FDTD structure setup and openEMS run harness", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace); also passed to the engine
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the reference geometry, configure and run it, and report each stage
    Smoke {
        #[command(flatten)]
        engine: EngineArgs,
        /// Directory for the temporary run directory (defaults to the system temp dir)
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
    /// Validate a project file, including a full compile
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Write the geometry document of a project
    Geometry {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Output XML file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a project's simulation
    Run {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Remove the run directory once the run finishes
        #[arg(long)]
        discard: bool,
    },
    /// List kept runs for a project
    Runs {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Show details of a kept run
    ShowRun {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
        /// Run ID (full or short)
        run_id: String,
    },
    /// Print library and engine versions
    Version {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineKind {
    /// Check the simulation file without solving
    DryRun,
    /// Run the openEMS executable
    Openems,
}

#[derive(Args)]
struct EngineArgs {
    /// Engine that executes runs
    #[arg(long, value_enum, default_value_t = EngineKind::DryRun)]
    engine: EngineKind,
    /// Path to the openEMS executable
    #[arg(long, env = "OPENEMS_BIN")]
    openems_bin: Option<PathBuf>,
}

impl EngineArgs {
    fn choice(&self) -> EngineChoice {
        match self.engine {
            EngineKind::DryRun => EngineChoice::DryRun,
            EngineKind::Openems => EngineChoice::OpenEms {
                program: self.openems_bin.clone(),
            },
        }
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(io::stderr)
        .init();

    let verbose = cli.verbose;
    let outcome: Result<(), Box<dyn Error>> = match cli.command {
        Commands::Smoke { engine, work_dir } => {
            cmd_smoke(&engine.choice(), work_dir, verbose).map_err(Into::into)
        }
        Commands::Validate { project_path } => cmd_validate(&project_path).map_err(Into::into),
        Commands::Geometry {
            project_path,
            output,
        } => cmd_geometry(&project_path, output.as_deref()).map_err(Into::into),
        Commands::Run {
            project_path,
            engine,
            no_cache,
            discard,
        } => {
            let options = RunOptions {
                engine: engine.choice(),
                use_cache: !no_cache,
                keep_output: !discard,
                verbosity: verbose,
            };
            cmd_run(&project_path, options).map_err(Into::into)
        }
        Commands::Runs { project_path } => cmd_runs(&project_path).map_err(Into::into),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id).map_err(Into::into),
        Commands::Version { engine } => {
            cmd_version(&engine.choice());
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(err.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &dyn Error) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn cmd_smoke(
    engine: &EngineChoice,
    work_dir: Option<PathBuf>,
    verbose: u8,
) -> Result<(), em_app::SmokeError> {
    println!("emflow smoke test");
    let engine = engine.build();
    let options = SmokeOptions {
        engine: engine.as_ref(),
        work_dir,
        verbosity: verbose,
    };

    let report = em_app::run_smoke(
        &options,
        Some(&mut |event: SmokeEvent| match event {
            SmokeEvent::Started(stage) => {
                print!("  {:<9} ... ", stage.label());
                let _ = io::stdout().flush();
            }
            SmokeEvent::Passed { detail, .. } => println!("ok ({detail})"),
            SmokeEvent::Failed { .. } => println!("FAILED"),
        }),
    )?;

    println!("✓ All stages passed (run {})", short_id(&report.run.run_id));
    Ok(())
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let sim = project_service::load_simulation(project_path)?;
    project_service::validate_simulation(&sim)?;

    let summary = project_service::summarize(&sim);
    println!("✓ Project is valid");
    println!(
        "  {}: {} properties, {} boxes, {} cells",
        summary.name, summary.property_count, summary.box_count, summary.cell_count
    );
    println!(
        "  excitation f0={} Hz fc={} Hz, {} timesteps, boundaries {}",
        summary.f0_hz,
        summary.fc_hz,
        summary.max_timesteps,
        summary.boundaries.join(" ")
    );
    Ok(())
}

fn cmd_geometry(project_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let sim = project_service::load_simulation(project_path)?;
    match output {
        Some(path) => {
            project_service::write_geometry(&sim, path)?;
            println!("✓ Wrote geometry to {}", path.display());
        }
        None => {
            let csx = project_service::build_structure(&sim)?;
            print!("{}", csx.to_xml_string()?);
        }
    }
    Ok(())
}

fn cmd_run(project_path: &Path, options: RunOptions) -> AppResult<()> {
    println!("Running project: {}", project_path.display());
    let request = RunRequest {
        project_path,
        options,
    };

    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event: RunProgressEvent| render_progress(&event)),
    )?;
    clear_progress_line();

    let id = short_id(&response.run_id);
    match &response.manifest.outcome {
        RunOutcomeRecord::Success {
            termination,
            timesteps,
        } => {
            if response.loaded_from_cache {
                println!("✓ Loaded from cache: {id}");
            } else {
                println!("✓ Run completed: {id} ({:.2}s)", response.elapsed_wall_s);
            }
            print!("  termination: {termination}");
            if let Some(n) = timesteps {
                print!(", {n} timesteps");
            }
            println!();
        }
        RunOutcomeRecord::Failure { message } => {
            println!("✗ Run failed: {id}");
            return Err(AppError::Solver(SolverError::EngineFailure {
                message: message.clone(),
            }));
        }
    }

    match &response.output_dir {
        Some(dir) => println!("  output: {}", dir.display()),
        None => println!("  output removed ({} artifacts)", response.artifacts.len()),
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(80));
    let _ = io::stdout().flush();
}

fn render_progress(event: &RunProgressEvent) {
    let mut line = format!(
        "\r{:<22} elapsed={:.2}s",
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {msg}"));
    }
    print!("{line}");
    let _ = io::stdout().flush();
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;
    if runs.is_empty() {
        println!("No kept runs");
        return Ok(());
    }

    println!("Kept runs:");
    for run in runs {
        let status = if run.outcome.is_success() { "ok" } else { "failed" };
        println!(
            "  {}  {}  {:<7} {:<6} {}",
            short_id(&run.run_id),
            run.timestamp,
            run.engine,
            status,
            run.name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    let run = run_service::load_run(project_path, run_id)?;
    println!("Run {}", run.run_id);
    println!("  name:      {}", run.name.as_deref().unwrap_or("-"));
    println!("  timestamp: {}", run.timestamp);
    println!(
        "  engine:    {} {}",
        run.engine,
        run.engine_version.as_deref().unwrap_or("")
    );
    println!("  solver:    {}", run.solver_version);
    println!(
        "  limits:    {} timesteps, end criterion {}",
        run.limits.max_timesteps, run.limits.end_criterion
    );
    match &run.outcome {
        RunOutcomeRecord::Success { termination, .. } => println!("  outcome:   ok ({termination})"),
        RunOutcomeRecord::Failure { message } => println!("  outcome:   failed: {message}"),
    }
    println!("  artifacts:");
    for artifact in &run.artifacts {
        println!("    {artifact}");
    }
    Ok(())
}

fn cmd_version(engine: &EngineChoice) {
    let engine = engine.build();
    let versions = em_app::versions(engine.as_ref());
    println!("em-cli {}", env!("CARGO_PKG_VERSION"));
    println!("em-structure {}", versions.structure);
    println!("em-solver {}", versions.solver);
    println!("em-app {}", versions.app);
    println!(
        "engine {} {}",
        versions.engine,
        versions.engine_version.as_deref().unwrap_or("(version unknown)")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "em-cli", "-vv", "run", "sim.yaml", "--engine", "openems", "--openems-bin",
            "/opt/openEMS/bin/openEMS", "--discard",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                engine,
                no_cache,
                discard,
                ..
            } => {
                assert!(!no_cache);
                assert!(discard);
                assert_eq!(
                    engine.choice(),
                    EngineChoice::OpenEms {
                        program: Some(PathBuf::from("/opt/openEMS/bin/openEMS"))
                    }
                );
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn smoke_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["em-cli", "smoke"]).unwrap();
        match cli.command {
            Commands::Smoke { engine, work_dir } => {
                assert_eq!(engine.choice(), EngineChoice::DryRun);
                assert!(work_dir.is_none());
            }
            _ => panic!("expected smoke command"),
        }
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(log_level(0), Level::WARN);
        assert_eq!(log_level(1), Level::INFO);
        assert_eq!(log_level(5), Level::TRACE);
    }
}
