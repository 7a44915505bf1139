//! # Rehearse
//!
//! Run your CI workflow steps locally, before pushing. Rehearse reads the
//! GitHub Actions workflows already in the repository, resolves each `run:`
//! step the way CI would (shell, environment layering, working directory),
//! executes the steps sequentially, and reports results.
//!
//! ## What it does
//!
//! - **CI-faithful resolution** - shell/env/workdir follow the same
//!   step > job > workflow precedence CI uses
//! - **Privileged command gating** - `sudo` and package installs are
//!   skipped by default instead of touching the machine
//! - **Live terminal output** - one line per job, rewritten in place,
//!   failed jobs expanded step by step
//! - **Machine-readable reports** - `--format json` for tooling
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rehearse::engine::{Options, Runner};
//! use rehearse::output::NullRenderer;
//! use rehearse::workflow::{discover_workflows, Parser};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let root = std::env::current_dir()?;
//!     let paths = discover_workflows(&root, &[])?;
//!     let (workflows, _warnings) = Parser::new(&root).parse(&paths)?;
//!
//!     let runner = Runner::new(Options::new(&root));
//!     let report = runner.run(&workflows, &mut NullRenderer).await?;
//!
//!     println!(
//!         "{} passed, {} failed",
//!         report.summary.passed, report.summary.failed
//!     );
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod output;
pub mod version;
pub mod workflow;

pub use config::{Config, ConfigError, Format, Provider};
pub use engine::{
    Options, RunError, RunReport, Runner, StepError, StepResult, StepStatus, Summary,
};
pub use output::{
    AnsiCanvas, BatchRenderer, Canvas, MemoryCanvas, NullRenderer, PrettyRenderer, Report,
    RunRenderer, StreamingRenderer,
};
pub use version::version_warnings;
pub use workflow::{
    discover_workflows, filter_workflows, DiscoveryError, FilterError, Job, ParseError, Parser,
    Pattern, Step, Warning, Workflow,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, Format, Provider};
    pub use crate::engine::{Options, RunReport, Runner, StepResult, StepStatus, Summary};
    pub use crate::output::{
        render_json, BatchRenderer, NullRenderer, PrettyRenderer, Report, RunRenderer,
        StreamingRenderer,
    };
    pub use crate::workflow::{
        discover_workflows, filter_workflows, Parser, Warning, Workflow,
    };
}
