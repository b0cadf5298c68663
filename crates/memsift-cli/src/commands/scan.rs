//! One-shot scan over mapped dump files.
//!
//! Maps each dump at its declared base, runs a New Search, optionally
//! narrows once against a literal, and prints or saves the candidate
//! listing.

use std::path::PathBuf;

use anyhow::{Result, bail};
use memsift_core::codec::parse_literal;
use memsift_core::{
    AddressRange, CancelToken, ComparisonPredicate, Error, ScanOp, ScanReport, SessionManager,
    render_console,
};
use tracing::warn;

use super::{MapSpec, TypeArgs, load_memory, parse_address};

#[derive(Debug, clap::Args)]
pub struct ScanArgs {
    /// Dump files to map, as <file>@<base>[:ro]; repeatable
    #[arg(long = "map", required = true, value_name = "FILE@BASE[:ro]")]
    pub maps: Vec<MapSpec>,

    #[command(flatten)]
    pub type_args: TypeArgs,

    /// Restrict the scan to this start address (requires --length)
    #[arg(long, value_parser = parse_address, requires = "length")]
    pub start: Option<u64>,

    /// Length in bytes of the restricted scan range
    #[arg(long, requires = "start")]
    pub length: Option<u64>,

    /// Also scan read-only mappings
    #[arg(long = "include-readonly")]
    pub include_readonly: bool,

    /// Keep only candidates equal to this literal
    #[arg(long, value_name = "VALUE", conflicts_with_all = ["greater", "less"])]
    pub equal: Option<String>,

    /// Keep only candidates greater than this literal
    #[arg(long, value_name = "VALUE", conflicts_with = "less")]
    pub greater: Option<String>,

    /// Keep only candidates less than this literal
    #[arg(long, value_name = "VALUE")]
    pub less: Option<String>,

    /// Maximum candidates to print
    #[arg(long, default_value = "30")]
    pub limit: usize,

    /// Write the full candidate listing as JSON
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ScanArgs {
    fn literal_op(&self) -> Option<(ScanOp, &str)> {
        match (&self.equal, &self.greater, &self.less) {
            (Some(v), _, _) => Some((ScanOp::Equal, v.as_str())),
            (_, Some(v), _) => Some((ScanOp::Greater, v.as_str())),
            (_, _, Some(v)) => Some((ScanOp::Less, v.as_str())),
            _ => None,
        }
    }
}

pub fn run(args: ScanArgs) -> Result<()> {
    let spec = args.type_args.to_spec()?;
    let (memory, full_ranges) = load_memory(&args.maps)?;

    let ranges = match (args.start, args.length) {
        (Some(start), Some(length)) => vec![AddressRange::new(start, length)?],
        _ => full_ranges,
    };

    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    let mut manager = SessionManager::new(memory);
    manager.set_cancel_token(token);
    let session = manager.new_search(ranges, spec.clone(), args.include_readonly)?;
    println!(
        "New search: {} candidate(s)",
        manager.candidate_count(session)?
    );

    if let Some((op, literal)) = args.literal_op() {
        let operand = parse_literal(literal, &spec)?;
        let predicate = ComparisonPredicate::new(op, Some(operand), &spec)?;
        match manager.search_within(session, &predicate) {
            Ok(count) => println!("After '{op}': {count} candidate(s)"),
            Err(Error::EmptyCandidateSet) => println!("After '{op}': no candidates remain"),
            Err(Error::Cancelled) => println!("Cancelled; partial narrowing retained"),
            Err(e) => bail!(e),
        }
    }

    let engine = manager.engine(session)?;
    println!();
    print!("{}", render_console(engine.candidates(), args.limit));

    if let Some(path) = &args.output {
        let report = ScanReport::from_candidates(engine.candidates(), engine.generation(), None);
        report.write_json(path)?;
        println!("Candidate listing saved to: {}", path.display());
    }

    Ok(())
}
