// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn snapshots_arg() -> Arg {
    Arg::new("snapshots")
        .required(true)
        .num_args(1..)
        .value_name("SNAPSHOT")
        .help("Backend snapshot files (JSON)")
}

fn merge_text_arg() -> Arg {
    Arg::new("merge_text")
        .long("merge-text")
        .action(ArgAction::SetTrue)
        .help("Also merge name, summary and description between backends")
}

fn build_cli() -> Command {
    Command::new("appcat")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Appcat Contributors")
        .about("Merge application records from many backends into one catalog")
        .subcommand_required(false)
        .subcommand(
            Command::new("dump")
                .about("Print every populated field of the merged records")
                .arg(snapshots_arg())
                .arg(
                    Arg::new("id")
                        .long("id")
                        .value_name("ID")
                        .help("Only dump the record with this id"),
                )
                .arg(merge_text_arg()),
        )
        .subcommand(
            Command::new("rank")
                .about("List records by kudos percentage")
                .arg(snapshots_arg())
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20")
                        .help("Number of records to show"),
                )
                .arg(merge_text_arg()),
        )
        .subcommand(
            Command::new("updates")
                .about("List records with a pending update")
                .arg(snapshots_arg())
                .arg(merge_text_arg()),
        )
        .subcommand(
            Command::new("history")
                .about("Show the install/remove/update timeline of a record")
                .arg(snapshots_arg())
                .arg(
                    Arg::new("id")
                        .long("id")
                        .required(true)
                        .value_name("ID")
                        .help("Record id, e.g. gimp.desktop"),
                ),
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

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("appcat.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
