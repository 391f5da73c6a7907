use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use screensaver_bundler::{bundle, bundle_build, BundleOptions, BundlePlan};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (default: `info`).
const LOG_ENV: &str = "SCREENSAVER_LOG";

const USAGE: &str = "usage: screensaver-bundler [--project-root <path>] [--no-trace] \
                     [--exit-on-input] [--dry-run] [--report <path>]";

#[derive(Debug)]
struct CliArgs {
    project_root: PathBuf,
    options: BundleOptions,
    report: Option<PathBuf>,
}

fn main() {
    init_logging();

    if let Err(err) = run() {
        eprintln!("[screensaver-bundler] {err:#}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;

    tracing::info!(root = %args.project_root.display(), "building single-file screensaver");
    let result = bundle_build(BundlePlan::new(&args.project_root), args.options)?;

    if let Some(report_path) = &args.report {
        let json = bundle::report_json(&result)?;
        fs::write(report_path, json)
            .with_context(|| format!("failed to write report '{}'", report_path.display()))?;
    }

    let unresolved = result.unresolved_count();
    if result.written {
        tracing::info!(
            inlined = result.inlined.len(),
            unresolved,
            "screensaver written to {}",
            result.output_path.display()
        );
    } else {
        tracing::info!(
            inlined = result.inlined.len(),
            unresolved,
            bytes = result.html.len(),
            "dry run, nothing written"
        );
    }
    if unresolved > 0 {
        tracing::warn!("{unresolved} reference(s) left unresolved, output is partially inlined");
    }

    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut project_root: Option<PathBuf> = None;
    let mut options = BundleOptions::default();
    let mut report = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--project-root" => {
                let value = args
                    .next()
                    .context("missing value for --project-root")?;
                project_root = Some(PathBuf::from(value));
            }
            "--report" => {
                let value = args.next().context("missing value for --report")?;
                report = Some(PathBuf::from(value));
            }
            "--no-trace" => options.trace_textures = false,
            "--exit-on-input" => options.exit_on_input = true,
            "--dry-run" => options.write_to_disk = false,
            _ => bail!("unknown argument '{arg}'. {USAGE}"),
        }
    }

    let project_root = match project_root {
        Some(root) => root,
        None => env::current_dir().context("failed to read current directory")?,
    };

    Ok(CliArgs {
        project_root,
        options,
        report,
    })
}
