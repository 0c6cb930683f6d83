//! Command-line interface for contractlint.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::contract::{self, Contract};
use crate::report;
use crate::verify::Verifier;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default contract file names searched for in the project root.
const DEFAULT_CONTRACT_NAMES: &[&str] = &["contractlint.yaml", ".contractlint.yaml"];

/// Template used when no contract is given or discovered.
pub const DEFAULT_TEMPLATE: &str = "log-conventions";

/// Contract verification engine.
///
/// Checks a source tree against a declarative contract: required interface
/// methods declared and implemented, required fields present, paired calls
/// balanced, instrumentation calls used and forbidden patterns absent.
/// Nothing is compiled or executed; all checks are text matches.
#[derive(Parser)]
#[command(name = "contractlint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root to verify [default: the current working directory, not
    /// the directory holding the contractlint binary]
    pub root: Option<PathBuf>,

    /// Path to contract YAML file (default: auto-discover in the root)
    #[arg(short, long, conflicts_with = "template")]
    pub contract: Option<PathBuf>,

    /// Built-in contract template to run
    #[arg(short, long)]
    pub template: Option<String>,

    /// Report document path (default: from the contract, relative to the root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Do not write the report document
    #[arg(long)]
    pub no_report: bool,

    /// Evaluate checks in parallel
    #[arg(short = 'j', long)]
    pub parallel: bool,

    /// List built-in contract templates
    #[arg(long)]
    pub list_templates: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// A contract shipped inside the binary.
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

/// All available templates.
pub static TEMPLATES: &[Template] = &[
    Template {
        name: "log-conventions",
        description: "DHLOG and LogCapture usage, capture pairing, no std::cout in tests",
        content: include_str!("templates/log-conventions.yaml"),
    },
    Template {
        name: "hdi-mock",
        description: "HDI mock interfaces, structures, features and build wiring",
        content: include_str!("templates/hdi-mock.yaml"),
    },
];

/// Look up a built-in template by name.
pub fn template(name: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.name == name)
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Discover a contract file in the project root.
fn discover_contract(root: &Path) -> Option<PathBuf> {
    DEFAULT_CONTRACT_NAMES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.is_file())
}

/// Resolve the contract to run and a label describing where it came from.
fn load_contract(cli: &Cli, root: &Path) -> anyhow::Result<(Contract, String)> {
    if let Some(path) = &cli.contract {
        let contract = Contract::parse_file(path)?;
        return Ok((contract, path.display().to_string()));
    }

    let builtin = |name: &str| -> anyhow::Result<(Contract, String)> {
        let t = template(name).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown template {:?} (run 'contractlint --list-templates')",
                name
            )
        })?;
        Ok((Contract::parse_str(t.name, t.content)?, format!("template:{}", t.name)))
    };

    if let Some(name) = &cli.template {
        return builtin(name);
    }

    match discover_contract(root) {
        Some(path) => {
            tracing::info!(path = %path.display(), "discovered contract");
            Ok((Contract::parse_file(&path)?, path.display().to_string()))
        }
        None => {
            tracing::info!(template = DEFAULT_TEMPLATE, "no contract file found, using template");
            builtin(DEFAULT_TEMPLATE)
        }
    }
}

/// Run a verification and return the process exit code.
///
/// Contract problems are reported on stderr and yield `EXIT_ERROR`. A report
/// that cannot be written is returned as an error.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if cli.list_templates {
        return list_templates();
    }

    // Validate format
    if cli.format != "pretty" && cli.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            cli.format
        );
        return Ok(EXIT_ERROR);
    }

    // Resolve root
    let root = match &cli.root {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };
    let root = match root.canonicalize() {
        Ok(p) if p.is_dir() => p,
        Ok(p) => {
            eprintln!("Error: project root {:?} is not a directory", p);
            return Ok(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("Error: cannot access project root {:?}: {}", root, e);
            return Ok(EXIT_ERROR);
        }
    };

    let (contract, source) = match load_contract(cli, &root) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Err(e) = contract::validate(&contract) {
        eprintln!("Error: {} ({})", e, source);
        return Ok(EXIT_ERROR);
    }

    let report = Verifier::new(&root).parallel(cli.parallel).run(&contract);

    match cli.format.as_str() {
        "json" => report::write_json(&report)?,
        _ => report::write_pretty(&report, &contract, &root),
    }

    if !cli.no_report {
        let path = match &cli.output {
            Some(p) => p.clone(),
            None => root.join(contract.report_path()),
        };
        let document = report::render_markdown(&report, &contract, &root, &report::timestamp());
        report::save(&path, &document)?;

        if cli.format == "json" {
            eprintln!("Report saved to: {}", path.display());
        } else {
            println!("  Report saved to: {}", path.display());
            println!();
        }
    }

    if report.all_passed() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// List available templates.
fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for t in TEMPLATES {
        let name = if t.name == DEFAULT_TEMPLATE {
            format!("{} (default)", t.name)
        } else {
            t.name.to_string()
        };
        println!("  {:<24} {}", name, t.description);
    }

    println!();
    println!("Usage:");
    println!("  contractlint [ROOT] --template <name>");

    Ok(EXIT_SUCCESS)
}
