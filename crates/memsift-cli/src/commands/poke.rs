//! Write a typed value into a dump file.

use anyhow::{Result, bail};
use memsift_core::MemoryAccessor;
use memsift_core::codec::{encode, format_value, parse_literal};

use super::{MapSpec, TypeArgs, load_memory, parse_address};

#[derive(Debug, clap::Args)]
pub struct PokeArgs {
    /// Dump file to modify, as <file>@<base>
    #[arg(long = "map", value_name = "FILE@BASE")]
    pub map: MapSpec,

    /// Address to write at
    #[arg(long, value_parser = parse_address)]
    pub address: u64,

    /// Value to write, parsed under the type options
    #[arg(long, value_name = "VALUE")]
    pub value: String,

    #[command(flatten)]
    pub type_args: TypeArgs,
}

pub fn run(args: PokeArgs) -> Result<()> {
    if !args.map.writable {
        bail!("cannot poke a read-only mapping");
    }
    let spec = args.type_args.to_spec()?;
    let value = parse_literal(&args.value, &spec)?;
    let bytes = encode(&value, &spec)?;

    let (memory, _) = load_memory(std::slice::from_ref(&args.map))?;
    memory.write(args.address, &bytes)?;

    let contents = memory.region_contents(args.map.base)?;
    std::fs::write(&args.map.path, contents)?;
    println!(
        "Wrote {} ({} byte(s)) at {:#x} in {}",
        format_value(&value, &spec),
        bytes.len(),
        args.address,
        args.map.path.display()
    );

    Ok(())
}
