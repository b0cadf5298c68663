//! CLI argument parsing tests.
//!
//! These tests verify that command-line arguments are parsed correctly
//! without actually executing the commands (which would require dump
//! files on disk).

use clap::Parser;

// Re-create the argument structure for testing since it's not publicly
// exported from the binary.
#[derive(Parser)]
#[command(name = "memsift")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    Scan {
        #[arg(long = "map", required = true)]
        maps: Vec<String>,
        #[arg(long, default_value_t = 1)]
        width: usize,
        #[arg(long)]
        signed: bool,
        #[arg(long)]
        hex: bool,
        #[arg(long, conflicts_with_all = ["width", "signed", "hex"])]
        text: Option<usize>,
        #[arg(long, conflicts_with_all = ["greater", "less"])]
        equal: Option<String>,
        #[arg(long, conflicts_with = "less")]
        greater: Option<String>,
        #[arg(long)]
        less: Option<String>,
        #[arg(long, default_value = "30")]
        limit: usize,
        #[arg(long = "include-readonly")]
        include_readonly: bool,
        #[arg(long, short)]
        output: Option<String>,
    },
    Narrow {
        #[arg(long)]
        base: String,
        #[arg(required = true, num_args = 2..)]
        dumps: Vec<String>,
        #[arg(long = "step", default_value = "changed")]
        steps: Vec<String>,
        #[arg(long, default_value = "30")]
        limit: usize,
    },
    Poke {
        #[arg(long = "map")]
        map: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        value: String,
        #[arg(long, default_value_t = 1)]
        width: usize,
    },
}

#[test]
fn test_parse_scan_defaults() {
    let args = Args::try_parse_from(["memsift", "scan", "--map", "wram.bin@0x2000000"]).unwrap();
    match args.command {
        Command::Scan {
            maps,
            width,
            signed,
            limit,
            include_readonly,
            ..
        } => {
            assert_eq!(maps, vec!["wram.bin@0x2000000"]);
            assert_eq!(width, 1);
            assert!(!signed);
            assert_eq!(limit, 30);
            assert!(!include_readonly);
        }
        _ => panic!("expected scan command"),
    }
}

#[test]
fn test_parse_scan_with_literal_predicate() {
    let args = Args::try_parse_from([
        "memsift",
        "scan",
        "--map",
        "wram.bin@0x2000000",
        "--map",
        "rom.gba@0x8000000:ro",
        "--width",
        "2",
        "--signed",
        "--equal",
        "100",
        "--include-readonly",
    ])
    .unwrap();
    match args.command {
        Command::Scan {
            maps,
            width,
            signed,
            equal,
            include_readonly,
            ..
        } => {
            assert_eq!(maps.len(), 2);
            assert_eq!(width, 2);
            assert!(signed);
            assert_eq!(equal.as_deref(), Some("100"));
            assert!(include_readonly);
        }
        _ => panic!("expected scan command"),
    }
}

#[test]
fn test_scan_rejects_conflicting_predicates() {
    let result = Args::try_parse_from([
        "memsift",
        "scan",
        "--map",
        "wram.bin@0x2000000",
        "--equal",
        "1",
        "--greater",
        "2",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_scan_text_conflicts_with_numeric_options() {
    let result = Args::try_parse_from([
        "memsift",
        "scan",
        "--map",
        "wram.bin@0x2000000",
        "--text",
        "4",
        "--signed",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_scan_requires_a_map() {
    let result = Args::try_parse_from(["memsift", "scan"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_narrow_steps() {
    let args = Args::try_parse_from([
        "memsift",
        "narrow",
        "--base",
        "0x2000000",
        "a.bin",
        "b.bin",
        "c.bin",
        "--step",
        "increased",
        "--step",
        "changed-by:1",
    ])
    .unwrap();
    match args.command {
        Command::Narrow { dumps, steps, .. } => {
            assert_eq!(dumps, vec!["a.bin", "b.bin", "c.bin"]);
            assert_eq!(steps, vec!["increased", "changed-by:1"]);
        }
        _ => panic!("expected narrow command"),
    }
}

#[test]
fn test_narrow_defaults_to_changed_step() {
    let args =
        Args::try_parse_from(["memsift", "narrow", "--base", "0x2000000", "a.bin", "b.bin"])
            .unwrap();
    match args.command {
        Command::Narrow { steps, .. } => assert_eq!(steps, vec!["changed"]),
        _ => panic!("expected narrow command"),
    }
}

#[test]
fn test_narrow_requires_two_dumps() {
    let result = Args::try_parse_from(["memsift", "narrow", "--base", "0x2000000", "a.bin"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_poke() {
    let args = Args::try_parse_from([
        "memsift",
        "poke",
        "--map",
        "wram.bin@0x2000000",
        "--address",
        "0x2000005",
        "--value",
        "42",
    ])
    .unwrap();
    match args.command {
        Command::Poke {
            map,
            address,
            value,
            width,
        } => {
            assert_eq!(map, "wram.bin@0x2000000");
            assert_eq!(address, "0x2000005");
            assert_eq!(value, "42");
            assert_eq!(width, 1);
        }
        _ => panic!("expected poke command"),
    }
}
