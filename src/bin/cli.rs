use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use tracing_subscriber::EnvFilter;

use rehearse::config::{Config, Format, Provider};
use rehearse::engine::{Options, RunReport, Runner};
use rehearse::output::{
    render_json, AnsiCanvas, BatchRenderer, NullRenderer, PrettyRenderer, Report, RunRenderer,
    StreamingRenderer,
};
use rehearse::version::version_warnings;
use rehearse::workflow::{
    discover_workflows, filter_workflows, parser::PROVIDER_NAME, Parser, Pattern, Warning,
    Workflow,
};

#[derive(ClapParser)]
#[command(name = "rehearse")]
#[command(about = "Run CI workflow steps locally", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// CI provider to read workflows from
    #[arg(long, value_enum, global = true)]
    provider: Option<Provider>,

    /// Workflow file to use (repeatable; default: discover them)
    #[arg(short, long = "workflow", global = true)]
    workflow: Vec<String>,

    /// Job filter pattern: substring, or /regex/ (repeatable)
    #[arg(short, long = "job", global = true)]
    job: Vec<String>,

    /// Run only steps matching this pattern (repeatable)
    #[arg(long, global = true)]
    only_step: Vec<String>,

    /// Skip steps matching this pattern (repeatable)
    #[arg(long, global = true)]
    skip_step: Vec<String>,

    /// Enable verbose output and mirror step output live
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the jobs and steps that would run
    List,

    /// Run workflow steps
    Run {
        /// Resolve and report every step without executing anything
        #[arg(long)]
        dry_run: bool,

        /// Report format
        #[arg(long, value_enum)]
        format: Option<Format>,

        /// Run privileged commands instead of skipping them
        #[arg(long)]
        allow_privileged: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "rehearse=debug"
    } else {
        "rehearse=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("rehearse: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Everything needed before listing or running: config merged with flags,
/// workflows discovered, parsed, and filtered.
struct Pipeline {
    workflows: Vec<Workflow>,
    warnings: Vec<Warning>,
    config: Config,
}

fn prepare(cli: &Cli, root: &Path) -> anyhow::Result<Pipeline> {
    let config = Config::load(root)?;

    // Only one provider today; `auto` resolves to it.
    let provider = cli.provider.unwrap_or(config.provider);
    tracing::debug!(?provider, resolved = PROVIDER_NAME, "selected workflow provider");

    let explicit = if cli.workflow.is_empty() {
        config.workflows.clone()
    } else {
        cli.workflow.clone()
    };
    let job_raw = if cli.job.is_empty() {
        config.jobs.clone()
    } else {
        cli.job.clone()
    };
    let only_raw = if cli.only_step.is_empty() {
        config.only_step.clone()
    } else {
        cli.only_step.clone()
    };
    let skip_raw = if cli.skip_step.is_empty() {
        config.skip_step.clone()
    } else {
        cli.skip_step.clone()
    };

    let paths = discover_workflows(root, &explicit)?;
    let (workflows, mut warnings) = Parser::new(root).parse(&paths)?;
    warnings.extend(version_warnings(root, config.warn.version_mismatch));

    let jobs = Pattern::compile(&job_raw)?;
    let only = Pattern::compile(&only_raw)?;
    let skip = Pattern::compile(&skip_raw)?;
    let workflows = filter_workflows(workflows, &jobs, &only, &skip);

    Ok(Pipeline {
        workflows,
        warnings,
        config,
    })
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let root = std::env::current_dir()?;
    let pipeline = prepare(&cli, &root)?;

    match cli.command {
        Commands::List => {
            print_warnings(&pipeline.warnings);
            let stdout = io::stdout();
            PrettyRenderer::new(stdout.lock()).render_list(&pipeline.workflows)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            dry_run,
            format,
            allow_privileged,
        } => {
            let format = format.unwrap_or(pipeline.config.format);
            let verbose = cli.verbose || pipeline.config.verbose;
            let dry_run = dry_run || pipeline.config.dry_run;

            if format == Format::Pretty {
                print_warnings(&pipeline.warnings);
            }
            // Nothing eligible is its own outcome in every format, not an
            // empty report.
            if eligible_steps(&pipeline.workflows) == 0 {
                println!("No matching jobs or steps");
                return Ok(ExitCode::SUCCESS);
            }

            let mut options = Options::new(&root);
            options.verbose = verbose;
            options.dry_run = dry_run;
            options.allow_privileged = allow_privileged;
            options.privileged_patterns = pipeline.config.privileged_command_patterns.clone();
            let runner = Runner::new(options);

            // Streaming needs exclusive control of the cursor: batch after
            // the run when verbose output or a dry run is interleaved.
            let streaming = format == Format::Pretty && !verbose && !dry_run;
            let report = if streaming {
                let canvas = AnsiCanvas::new(io::stdout());
                let mut renderer = StreamingRenderer::new(canvas);
                runner.run(&pipeline.workflows, &mut renderer).await?
            } else {
                let mut renderer = NullRenderer;
                runner.run(&pipeline.workflows, &mut renderer).await?
            };

            if !streaming {
                render_report(format, &pipeline, &report)?;
            }

            if report.summary.exit_code != 0 {
                eprintln!("rehearse: one or more steps failed");
                return Ok(ExitCode::from(1));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn render_report(format: Format, pipeline: &Pipeline, report: &RunReport) -> anyhow::Result<()> {
    match format {
        Format::Pretty => {
            // BatchRenderer is a RunRenderer, which is Send; StdoutLock is
            // not, so hand it the handle rather than the lock.
            let mut renderer = BatchRenderer::new(io::stdout());
            renderer.run_finished(&report.results, &report.summary)?;
        }
        Format::Json => {
            render_json(
                io::stdout().lock(),
                &Report {
                    provider: PROVIDER_NAME,
                    workflows: &pipeline.workflows,
                    steps: &report.results,
                    summary: &report.summary,
                    warnings: &pipeline.warnings,
                },
            )?;
        }
    }
    Ok(())
}

fn eligible_steps(workflows: &[Workflow]) -> usize {
    workflows
        .iter()
        .flat_map(|wf| &wf.jobs)
        .flat_map(|job| &job.steps)
        .filter(|step| step.is_runnable())
        .count()
}

fn print_warnings(warnings: &[Warning]) {
    let mut stderr = io::stderr().lock();
    for warning in warnings {
        let _ = writeln!(stderr, "warning: {}", warning.display());
    }
}
