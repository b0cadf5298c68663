//! Successive narrowing across dumps of the same region.
//!
//! The first dump seeds a New Search; each later dump replaces the
//! region's contents and applies one narrowing step, exactly as if the
//! operator had re-scanned a live system between state changes.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use memsift_core::{
    AddressRange, CancelToken, Error, ScanReport, SessionManager, SharedMemory, render_console,
};
use tracing::warn;

use super::{StepSpec, TypeArgs, parse_address};

#[derive(Debug, clap::Args)]
pub struct NarrowArgs {
    /// Base address where every dump is mapped
    #[arg(long, value_parser = parse_address)]
    pub base: u64,

    /// Successive dumps of the same region, oldest first
    #[arg(required = true, num_args = 2.., value_name = "DUMP")]
    pub dumps: Vec<PathBuf>,

    /// Narrowing step between consecutive dumps, e.g. `increased` or
    /// `changed-by:1`; give one per gap, or a single step reused for all
    #[arg(long = "step", default_value = "changed", value_name = "OP[:VALUE]")]
    pub steps: Vec<StepSpec>,

    #[command(flatten)]
    pub type_args: TypeArgs,

    /// Maximum candidates to print
    #[arg(long, default_value = "30")]
    pub limit: usize,

    /// Write the final candidate listing as JSON
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: NarrowArgs) -> Result<()> {
    let spec = args.type_args.to_spec()?;

    let gaps = args.dumps.len() - 1;
    let steps: Vec<&StepSpec> = if args.steps.len() == 1 {
        vec![&args.steps[0]; gaps]
    } else if args.steps.len() == gaps {
        args.steps.iter().collect()
    } else {
        bail!(
            "{} step(s) given for {} dump transition(s)",
            args.steps.len(),
            gaps
        );
    };

    let first = std::fs::read(&args.dumps[0])
        .with_context(|| format!("reading {}", args.dumps[0].display()))?;
    let length = first.len() as u64;
    let memory = SharedMemory::new();
    memory.map_region(args.base, first, true)?;

    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Failed to install Ctrl-C handler: {e}");
    }

    let mut manager = SessionManager::new(memory.clone());
    manager.set_cancel_token(token);
    let session = manager.new_search(
        vec![AddressRange::new(args.base, length)?],
        spec.clone(),
        false,
    )?;
    println!(
        "{}: {} candidate(s)",
        args.dumps[0].display(),
        manager.candidate_count(session)?
    );

    for (dump, step) in args.dumps[1..].iter().zip(steps) {
        let data =
            std::fs::read(dump).with_context(|| format!("reading {}", dump.display()))?;
        memory
            .replace_region(args.base, data)
            .with_context(|| format!("mapping {}", dump.display()))?;

        let predicate = step.to_predicate(&spec)?;
        match manager.search_within(session, &predicate) {
            Ok(count) => println!("{} '{}': {} candidate(s)", dump.display(), step, count),
            Err(Error::EmptyCandidateSet) => {
                println!("{} '{}': no candidates remain", dump.display(), step);
                break;
            }
            Err(Error::Cancelled) => {
                println!("Cancelled; partial narrowing retained");
                break;
            }
            Err(e) => bail!(e),
        }
    }

    let summary = manager.summary(session)?;
    println!();
    println!(
        "Session {}: {} pass(es), {} candidate(s) remain",
        summary.session,
        summary.passes.len(),
        summary.candidate_count
    );

    let engine = manager.engine(session)?;
    print!("{}", render_console(engine.candidates(), args.limit));

    if let Some(path) = &args.output {
        let report = ScanReport::from_candidates(engine.candidates(), engine.generation(), None);
        let document = serde_json::json!({
            "summary": summary,
            "report": report,
        });
        std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
        println!("Session report saved to: {}", path.display());
    }

    Ok(())
}
