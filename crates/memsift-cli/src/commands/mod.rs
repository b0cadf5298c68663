//! Shared argument types and dump-file mapping helpers.

pub mod narrow;
pub mod poke;
pub mod scan;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use memsift_core::codec::parse_literal;
use memsift_core::{
    AddressRange, ComparisonPredicate, NumeralBase, ScanOp, SharedMemory, Signedness, TypeSpec,
    Width,
};

/// A dump file mapped at a base address.
///
/// Written as `<file>@<base>`, with an optional `:ro` suffix marking the
/// mapping read-only (a ROM image rather than a RAM dump).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSpec {
    pub path: PathBuf,
    pub base: u64,
    pub writable: bool,
}

impl FromStr for MapSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        let (spec, writable) = match s.strip_suffix(":ro") {
            Some(rest) => (rest, false),
            None => (s, true),
        };
        let Some((path, base)) = spec.rsplit_once('@') else {
            return Err(format!("expected <file>@<base>[:ro], got {s:?}"));
        };
        if path.is_empty() {
            return Err(format!("missing file name in {s:?}"));
        }
        Ok(MapSpec {
            path: PathBuf::from(path),
            base: parse_address(base)?,
            writable,
        })
    }
}

/// One narrowing step, e.g. `increased`, `equal:100`, `changed-by:0x1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    pub op: ScanOp,
    pub literal: Option<String>,
}

impl StepSpec {
    pub fn to_predicate(&self, spec: &TypeSpec) -> Result<ComparisonPredicate> {
        let operand = self
            .literal
            .as_deref()
            .map(|text| parse_literal(text, spec))
            .transpose()?;
        Ok(ComparisonPredicate::new(self.op, operand, spec)?)
    }
}

impl FromStr for StepSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        let (name, literal) = match s.split_once(':') {
            Some((name, literal)) => (name, Some(literal.to_string())),
            None => (s, None),
        };
        let op = ScanOp::from_str(name)
            .map_err(|_| format!("unknown operator {name:?} in step {s:?}"))?;
        Ok(StepSpec { op, literal })
    }
}

impl std::fmt::Display for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{}:{}", self.op, literal),
            None => write!(f, "{}", self.op),
        }
    }
}

/// Value interpretation options shared by all commands.
#[derive(Debug, clap::Args)]
pub struct TypeArgs {
    /// Value width in bytes (1, 2, or 4)
    #[arg(long, default_value_t = 1)]
    pub width: usize,

    /// Interpret values as signed
    #[arg(long)]
    pub signed: bool,

    /// Parse literals and render values as hexadecimal
    #[arg(long)]
    pub hex: bool,

    /// Search for a text run of this many bytes instead of a number
    #[arg(long, value_name = "LEN", conflicts_with_all = ["width", "signed", "hex"])]
    pub text: Option<usize>,
}

impl TypeArgs {
    pub fn to_spec(&self) -> Result<TypeSpec> {
        if let Some(length) = self.text {
            return Ok(TypeSpec::text(length)?);
        }
        let width = Width::from_bytes(self.width)
            .with_context(|| format!("width must be 1, 2, or 4, got {}", self.width))?;
        let signedness = if self.signed {
            Signedness::Signed
        } else {
            Signedness::Unsigned
        };
        let base = if self.hex {
            NumeralBase::Hexadecimal
        } else {
            NumeralBase::Decimal
        };
        Ok(TypeSpec::numeric(width, signedness, base))
    }
}

/// Parse an address, accepting `0x` hex or plain decimal.
pub fn parse_address(text: &str) -> std::result::Result<u64, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("bad address {text:?}: {e}"))
}

/// Map each dump file into one shared address space.
///
/// Returns the memory alongside one full-file range per mapping, for
/// searches that do not restrict the scanned span.
pub fn load_memory(maps: &[MapSpec]) -> Result<(SharedMemory, Vec<AddressRange>)> {
    let memory = SharedMemory::new();
    let mut ranges = Vec::with_capacity(maps.len());
    for map in maps {
        let data = std::fs::read(&map.path)
            .with_context(|| format!("reading {}", map.path.display()))?;
        let length = data.len() as u64;
        memory
            .map_region(map.base, data, map.writable)
            .with_context(|| format!("mapping {}", map.path.display()))?;
        ranges.push(AddressRange::new(map.base, length)?);
    }
    Ok((memory, ranges))
}
