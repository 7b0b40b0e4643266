use crate::config::{self, MANIFEST_ENV, REPO_DIR_ENV};
use crate::diff;
use crate::error::{Result, UpdateError};
use crate::manifest::{DEFAULT_QUERY, FieldPath, FileAccessor};
use crate::updater::{StemcellUpdater, UpdateReport};
use crate::verify::check_manifest;
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct UpdateArgs {
    /// New stemcell version to write into the manifest
    #[arg(value_name = "VERSION", required_unless_present = "current")]
    pub new_version: Option<String>,

    /// Manifest to update (defaults to <REPO_DIR>/manifests/cfcr.yml)
    #[arg(long, short = 'm', value_name = "PATH", env = MANIFEST_ENV)]
    pub manifest: Option<PathBuf>,

    /// Deployment repository holding manifests/cfcr.yml
    #[arg(long, value_name = "DIR", env = REPO_DIR_ENV, default_value = ".")]
    pub repo_dir: PathBuf,

    /// Field to update, in `bosh int --path` syntax
    ///
    /// Examples:
    ///   /stemcells/0/version              First stemcell (default)
    ///   /stemcells/alias=windows/version  Stemcell with alias "windows"
    #[arg(long, value_name = "QUERY", default_value = DEFAULT_QUERY, verbatim_doc_comment)]
    pub path: String,

    /// Show the change without writing the manifest
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Print the current value and exit
    #[arg(long, conflicts_with_all = ["new_version", "dry_run"])]
    pub current: bool,
}

impl UpdateArgs {
    /// Resolves the manifest path from `--manifest`, `STEMCELL_MANIFEST` or `--repo-dir`.
    pub fn manifest_file(&self) -> Result<PathBuf> {
        config::locator(self.manifest.as_deref(), &self.repo_dir).manifest_file()
    }
}

pub fn execute(args: UpdateArgs) -> Result<()> {
    let query: FieldPath = args.path.parse()?;
    let manifest = args.manifest_file()?;
    log::debug!("Manifest resolved to {}", manifest.display());

    // Pre-flight checks
    check_manifest(&manifest, args.dry_run || args.current)?;

    let mut updater = StemcellUpdater::new(FileAccessor::new(args.dry_run)).with_query(query);

    if args.current {
        println!("{}", updater.current_version(&manifest)?);
        return Ok(());
    }

    let version = args.new_version.as_deref().ok_or_else(|| {
        UpdateError::InvalidVersion(String::new(), "no version given".to_string())
    })?;

    let report = match updater.update(&manifest, version) {
        Ok(report) => report,
        Err(e) => {
            eprintln!(
                "{} {} was left unchanged",
                "Aborted:".red().bold(),
                display_path(&manifest)
            );
            return Err(e);
        }
    };

    print_report(&report, args.dry_run);
    Ok(())
}

fn print_report(report: &UpdateReport, dry_run: bool) {
    if report.is_unchanged() {
        println!(
            "{:>12} {} already at {}",
            "Unchanged".yellow().bold(),
            report.query,
            report.current.green()
        );
        return;
    }

    if dry_run {
        println!("\n{}", "DRY RUN - No changes will be made".yellow().bold());
        let label = display_path(&report.manifest);
        for line in diff::render(&report.hunks, &label, &label).lines() {
            if line.starts_with("---") || line.starts_with("+++") {
                println!("{}", line.bold());
            } else if line.starts_with('@') {
                println!("{}", line.cyan());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else {
                println!("{}", line.green());
            }
        }
        println!("\nRun without {} to apply.", "--dry-run".cyan());
        return;
    }

    println!(
        "{:>12} {} {} → {}",
        "Updated".green().bold(),
        report.query,
        report.previous.yellow(),
        report.current.green().bold()
    );
    println!("{:>12} {}", "Manifest".dimmed(), display_path(&report.manifest));
}

fn display_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf());
    relative.to_string_lossy().replace('\\', "/")
}
