use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use version_perf_bench::config::PlanConfig;
use version_perf_bench::logs;
use version_perf_bench::BenchResult;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogKind {
    /// Build output (total time, final memory).
    Build,
    /// Server log (startup/shutdown span, reported stop time).
    Server,
    /// Server-side computation log (last completed phase).
    Computation,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every version of a plan file and write the comparison report.
    Run {
        /// JSON plan file.
        #[arg(long, value_name = "FILE")]
        plan: PathBuf,

        /// Overrides the plan's working directory (the CSV lands under it).
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        /// Also write the report as JSON.
        #[arg(long, value_name = "FILE")]
        json_out: Option<PathBuf>,
    },

    /// Print the facts the scrapers extract from a log file (JSON on stdout).
    Scrape {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = LogKind::Build)]
        kind: LogKind,
    },
}

#[derive(Parser, Debug)]
#[command(name = "version-perf-bench")]
#[command(about = "Compare server performance across versions and database states (CSV output)")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

fn init_tracing() {
    let env_filter = EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> BenchResult<()> {
    init_tracing();
    let args = Args::parse();

    match args.cmd {
        Command::Run {
            plan,
            work_dir,
            json_out,
        } => {
            let mut cfg = PlanConfig::load(&plan)?;
            if let Some(dir) = work_dir {
                cfg.work_dir = dir;
            }
            let mut server = cfg.build_server()?;
            let mut test_plan = cfg.build_plan()?;

            let report = test_plan.execute(&mut server)?;

            if let Some(out) = json_out {
                let json = serde_json::to_string_pretty(&report.snapshot())?;
                fs::write(&out, json)?;
                info!(path = %out.display(), "JSON report exported");
            }
        }
        Command::Scrape { file, kind } => {
            let facts = match kind {
                LogKind::Build => {
                    let text = fs::read_to_string(&file)?;
                    json!({
                        "total_time_ms": logs::extract_total_time(&text),
                        "end_memory_mb": logs::extract_end_memory(&text),
                        "max_memory_mb": logs::extract_max_memory(&text),
                    })
                }
                LogKind::Server => {
                    let lines = logs::read_lines(&file)?;
                    let first = logs::extract_first_date(&lines);
                    let last = logs::extract_first_date(lines.iter().rev());
                    json!({
                        "first_date": first.map(|d| d.to_string()),
                        "last_date": last.map(|d| d.to_string()),
                        "elapsed_ms": logs::elapsed_millis(&lines),
                        "stop_time_ms": logs::extract_stop_time(&lines),
                    })
                }
                LogKind::Computation => {
                    let lines = logs::read_lines(&file)?;
                    json!({
                        "computation_time_ms": logs::extract_computation_total_time(&lines),
                    })
                }
            };
            println!("{}", serde_json::to_string_pretty(&facts)?);
        }
    }

    Ok(())
}
