// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use extinstall::hosts;
use extinstall::install::{InstallRoots, PackageIdentity};
use extinstall::packages::{self, PackageInfo};
use extinstall::scanner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Folder created under the per-user data directories
const APP_DIR: &str = "extinstall/packages";

#[derive(Parser)]
#[command(name = "extinstall")]
#[command(author, version, about = "Install-state discovery and host compatibility checks for application extensions", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Install root locations, shared by commands that look for installed copies
#[derive(clap::Args, Debug, Clone)]
struct RootArgs {
    /// Machine-wide install root
    #[arg(long, env = "EXTINSTALL_ALL_USERS_ROOT", default_value = "/usr/local/share/extinstall/packages")]
    all_users_root: PathBuf,
    /// Per-user local profile root (default: platform local data dir)
    #[arg(long, env = "EXTINSTALL_LOCAL_ROOT")]
    local_root: Option<PathBuf>,
    /// Per-user roaming profile root (default: platform data dir)
    #[arg(long, env = "EXTINSTALL_ROAMING_ROOT")]
    roaming_root: Option<PathBuf>,
}

impl RootArgs {
    fn install_roots(&self) -> InstallRoots {
        let defaults = InstallRoots::with_user_defaults(&self.all_users_root, APP_DIR);
        InstallRoots {
            all_users: defaults.all_users,
            local_profile: self.local_root.clone().or(defaults.local_profile),
            roaming_profile: self.roaming_root.clone().or(defaults.roaming_profile),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List installed version folders of a package family folder
    Versions {
        /// Family folder containing <a.b.c.d> subfolders
        folder: PathBuf,
    },
    /// Show whether a package is already installed, and in which version
    State {
        /// Path to the package payload (its manifest is <payload>.xml)
        payload: PathBuf,
        #[command(flatten)]
        roots: RootArgs,
        /// Write the resolved state back into the manifest
        #[arg(long)]
        update_manifest: bool,
    },
    /// Check a package against every host in a host inventory
    Check {
        /// Path to the package payload (its manifest is <payload>.xml)
        payload: PathBuf,
        /// JSON host inventory
        #[arg(long)]
        hosts: PathBuf,
    },
    /// Describe a package manifest
    Inspect {
        /// Path to the package payload (its manifest is <payload>.xml)
        payload: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Read a package manifest and refuse packages with no known SDK facet
fn load_package(payload: &Path) -> Result<PackageInfo> {
    let package = packages::read_manifest(payload)?;
    package.ensure_recognized()?;
    Ok(package)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Some(Commands::Versions { folder }) => {
            let directories = scanner::list_version_directories(&folder)?;

            if directories.is_empty() {
                println!("No installed versions in {}", folder.display());
                return Ok(());
            }

            println!("Installed versions:");
            for dir in &directories {
                println!("  {}  {}", dir.version, dir.path.display());
            }
            if let Some(newest) = directories.last() {
                println!("\nNewest: {}", newest.version);
            }

            Ok(())
        }
        Some(Commands::State {
            payload,
            roots,
            update_manifest,
        }) => {
            let mut package = load_package(&payload)?;
            let roots = roots.install_roots();
            let identity: PackageIdentity = package.identity.clone();

            info!(
                "Resolving install state of {} {}",
                identity.title, package.version
            );
            let state = package.refresh_install_state(&roots.family(&identity))?;

            println!("{} {}: {}", identity.title, package.version, state);
            if let Some(root) = state.root() {
                println!("  Found at: {}", roots.family_folder_for(root, &identity)?.display());
            }

            if update_manifest {
                let path = packages::write_manifest(&package)?;
                println!("  Manifest updated: {}", path.display());
            }

            Ok(())
        }
        Some(Commands::Check {
            payload,
            hosts: inventory_path,
        }) => {
            let package = load_package(&payload)?;
            let inventory = hosts::load_hosts(&inventory_path)?;

            let verdicts = hosts::evaluate_hosts(&package.facts, &inventory);
            let compatible = verdicts.iter().filter(|v| v.is_compatible()).count();

            for verdict in &verdicts {
                match &verdict.result {
                    Ok(()) => println!("  [ok]   {}", verdict.host.display_name()),
                    Err(reason) => {
                        println!("  [fail] {}: {}", verdict.host.display_name(), reason)
                    }
                }
            }
            println!(
                "\n{} of {} host(s) compatible with {} {}",
                compatible,
                verdicts.len(),
                package.identity.title,
                package.version
            );

            if compatible == 0 {
                return Err(anyhow::anyhow!(
                    "No compatible host found for {}",
                    package.identity.title
                ));
            }

            Ok(())
        }
        Some(Commands::Inspect { payload }) => {
            let package = packages::read_manifest(&payload)?;
            print!("{}", package.describe());

            if let Err(e) = package.ensure_recognized() {
                println!("\nWarning: {}", e);
            }

            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "extinstall", &mut std::io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("extinstall v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'extinstall --help' for usage information");
            Ok(())
        }
    }
}
