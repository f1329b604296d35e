// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn payload_arg() -> Arg {
    Arg::new("payload")
        .required(true)
        .help("Path to the package payload (its manifest is <payload>.xml)")
}

fn build_cli() -> Command {
    Command::new("extinstall")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Extinstall Contributors")
        .about("Install-state discovery and host compatibility checks for application extensions")
        .subcommand_required(false)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Enable debug logging (overrides RUST_LOG)"),
        )
        .subcommand(
            Command::new("versions")
                .about("List installed version folders of a package family folder")
                .arg(
                    Arg::new("folder")
                        .required(true)
                        .help("Family folder containing <a.b.c.d> subfolders"),
                ),
        )
        .subcommand(
            Command::new("state")
                .about("Show whether a package is already installed, and in which version")
                .arg(payload_arg())
                .arg(
                    Arg::new("all_users_root")
                        .long("all-users-root")
                        .env("EXTINSTALL_ALL_USERS_ROOT")
                        .default_value("/usr/local/share/extinstall/packages")
                        .help("Machine-wide install root"),
                )
                .arg(
                    Arg::new("local_root")
                        .long("local-root")
                        .env("EXTINSTALL_LOCAL_ROOT")
                        .help("Per-user local profile root (default: platform local data dir)"),
                )
                .arg(
                    Arg::new("roaming_root")
                        .long("roaming-root")
                        .env("EXTINSTALL_ROAMING_ROOT")
                        .help("Per-user roaming profile root (default: platform data dir)"),
                )
                .arg(
                    Arg::new("update_manifest")
                        .long("update-manifest")
                        .action(clap::ArgAction::SetTrue)
                        .help("Write the resolved state back into the manifest"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check a package against every host in a host inventory")
                .arg(payload_arg())
                .arg(
                    Arg::new("hosts")
                        .long("hosts")
                        .required(true)
                        .help("JSON host inventory"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Describe a package manifest")
                .arg(payload_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("extinstall.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
