use anchorpatch::config::{load_from_path, PatchSetConfig};
use anchorpatch::engine::{self, Outcome};
use anchorpatch::patchset::{PatchSet, RunReport};
use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "anchorpatch")]
#[command(about = "Idempotent anchor-based text patching engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply patch sets to a target document
    Apply {
        /// Patch set file, or a directory of .toml patch sets
        patches: PathBuf,

        /// Target document (overrides the patch set's default target)
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Dry run - report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Report patch status without writing anything
    Check {
        /// Patch set file, or a directory of .toml patch sets
        patches: PathBuf,

        /// Target document (overrides the patch set's default target)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// List patch sets and their transformations
    List {
        /// Patch set file, or a directory of .toml patch sets
        patches: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            patches,
            target,
            dry_run,
            diff,
        } => cmd_apply(&patches, target, dry_run, diff),

        Commands::Check { patches, target } => cmd_check(&patches, target),

        Commands::List { patches } => cmd_list(&patches),
    }
}

/// Collect patch set files: the path itself, or every .toml directly inside
/// it when it is a directory, in sorted order.
fn discover_patch_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml patch set files found in {}", path.display());
    }

    Ok(files)
}

/// Resolve the target document: the --target flag wins, then the patch set's
/// own meta.target.
fn resolve_target(flag: &Option<PathBuf>, config: &PatchSetConfig) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.clone());
    }
    if let Some(target) = &config.meta.target {
        return Ok(PathBuf::from(target));
    }
    anyhow::bail!(
        "{}\n{}\n  {}\n  {}",
        "No target document specified.".red(),
        "Try one of:".bold(),
        "1. Pass it explicitly: anchorpatch apply patches.toml --target path/to/file",
        "2. Set `target` under [meta] in the patch set file"
    )
}

/// Unified diff of one document's change, for --diff output.
fn render_diff(target: &Path, before: &str, after: &str) -> String {
    let name = target.display().to_string();
    let diff = TextDiff::from_lines(before, after);
    format!(
        "\n{}",
        diff.unified_diff()
            .context_radius(2)
            .header(&format!("{name} (before)"), &format!("{name} (after)"))
    )
}

/// One-line run totals across all patch set files.
fn render_summary(applied: usize, already_applied: usize, skipped: usize) -> String {
    format!(
        "{} applied, {} already applied, {} skipped",
        applied.to_string().green(),
        already_applied.to_string().yellow(),
        skipped.to_string().cyan()
    )
}

/// Per-transformation status lines for one run.
fn report_transforms(set: &PatchSet, report: &RunReport, dry_run: bool) {
    for &ordinal in &report.applied {
        let verb = if dry_run { "Would apply" } else { "Applied" };
        println!("{} {}: {}", "✓".green(), set.transforms[ordinal].id, verb);
    }
    for &ordinal in &report.already_applied {
        println!(
            "{} {}: Already applied",
            "⊙".yellow(),
            set.transforms[ordinal].id
        );
    }
    for (ordinal, reason) in &report.skipped {
        println!(
            "{} {}: Skipped ({})",
            "⊘".cyan(),
            set.transforms[*ordinal].id,
            reason
        );
    }
}

fn cmd_apply(patches: &Path, target: Option<PathBuf>, dry_run: bool, show_diff: bool) -> Result<()> {
    let patch_files = discover_patch_files(patches)?;

    let mut total_applied = 0;
    let mut total_already_applied = 0;
    let mut total_skipped = 0;

    for patch_file in patch_files {
        println!("Loading patch set from {}...", patch_file.display());

        let config = load_from_path(&patch_file)?;
        let set = config.compile()?;
        let target_path = resolve_target(&target, &config)?;

        if set.transforms.is_empty() {
            println!("{}", "  No transformations found in file".yellow());
            continue;
        }

        if dry_run {
            println!("{}", "  [DRY RUN - showing what would change]".cyan());
            let (patched, report) = engine::check(&target_path, &set)?;
            report_transforms(&set, &report, true);
            if report.changed {
                println!(
                    "Would apply {} transformation(s) to {}",
                    report.applied.len(),
                    target_path.display()
                );
                if show_diff {
                    if let Ok(before) = fs::read_to_string(&target_path) {
                        print!("{}", render_diff(&target_path, &before, &patched));
                    }
                }
            } else {
                println!("No changes to {} (already up to date)", target_path.display());
            }
            total_applied += report.applied.len();
            total_already_applied += report.already_applied.len();
            total_skipped += report.skipped.len();
        } else {
            let before = if show_diff {
                fs::read_to_string(&target_path).ok()
            } else {
                None
            };

            let outcome = engine::execute(&target_path, &set)?;
            report_transforms(&set, outcome.report(), false);
            println!("{}", outcome);

            if let (Outcome::Applied { path, .. }, Some(before)) = (&outcome, before) {
                if let Ok(after) = fs::read_to_string(path) {
                    print!("{}", render_diff(path, &before, &after));
                }
            }

            let report = outcome.report();
            total_applied += report.applied.len();
            total_already_applied += report.already_applied.len();
            total_skipped += report.skipped.len();
        }

        println!();
    }

    println!(
        "{} {}",
        "Summary:".bold(),
        render_summary(total_applied, total_already_applied, total_skipped)
    );

    Ok(())
}

fn cmd_check(patches: &Path, target: Option<PathBuf>) -> Result<()> {
    let patch_files = discover_patch_files(patches)?;

    println!("{}", "Patch Status Report".bold());
    println!();

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;
        let set = config.compile()?;
        let target_path = resolve_target(&target, &config)?;

        println!(
            "{} -> {}",
            patch_file.display(),
            target_path.display()
        );

        let (_, report) = engine::check(&target_path, &set)?;
        report_transforms(&set, &report, true);

        if report.changed {
            println!(
                "{}",
                format!(
                    "  {} transformation(s) pending",
                    report.applied.len()
                )
                .yellow()
            );
        } else {
            println!("{}", "  up to date".green());
        }
        println!();
    }

    Ok(())
}

fn cmd_list(patches: &Path) -> Result<()> {
    let patch_files = discover_patch_files(patches)?;

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;
        let name = if config.meta.name.is_empty() {
            patch_file.display().to_string()
        } else {
            config.meta.name.clone()
        };

        println!("{}", name.bold());
        if let Some(description) = &config.meta.description {
            println!("  {}", description.dimmed());
        }
        if let Some(target) = &config.meta.target {
            println!("  target: {}", target);
        }
        for (ordinal, def) in config.transforms.iter().enumerate() {
            println!("  {}. {}", ordinal, def.id);
        }
        println!();
    }

    Ok(())
}
