use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use anyhow::{anyhow, bail, Context};
use clap::Parser;
use csimlib::config::CacheGeometry;
use csimlib::io::get_reader;
use csimlib::simulator::Simulator;
use csimlib::trace::{Operation, TraceReader};

#[derive(Parser, Debug)]
#[command(
    about = "LRU set associative cache simulator for valgrind memory traces",
    after_help = "Examples:\n  csim -s 4 -E 1 -b 4 -t traces/mini.trace\n  csim -v -s 8 -E 2 -b 4 -t traces/mini.trace"
)]
struct Args {
    /// Number of set index bits (2^s sets)
    #[arg(short = 's')]
    set_bits: Option<u32>,

    /// Number of lines per set (associativity)
    #[arg(short = 'E')]
    lines_per_set: Option<u64>,

    /// Number of block offset bits (2^b byte blocks)
    #[arg(short = 'b')]
    block_bits: Option<u32>,

    /// Trace file
    #[arg(short = 't')]
    trace: PathBuf,

    /// JSON file holding the geometry, individual flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the outcome of every trace line
    #[arg(short, long)]
    verbose: bool,

    /// Print the result as JSON instead of the summary line
    #[arg(long)]
    json: bool,

    /// Also write `hits misses evictions` to this file
    #[arg(long)]
    results: Option<PathBuf>,

    /// Print how long the simulation took
    #[arg(short, long)]
    performance: bool,

    /// Print the geometry and how many lines were never filled
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Combines the config file, if any, with the geometry flags
    fn geometry(&self) -> anyhow::Result<CacheGeometry> {
        let from_file = match &self.config {
            Some(path) => {
                let config_file = File::open(path).with_context(|| format!("Couldn't open the config file at path {}", path.display()))?;
                let geometry: CacheGeometry =
                    serde_json::from_reader(BufReader::new(config_file)).context("Couldn't parse the config file")?;
                Some(geometry)
            }
            None => None,
        };
        let set_bits = self.set_bits.or(from_file.map(|g| g.set_bits));
        let lines_per_set = self.lines_per_set.or(from_file.map(|g| g.lines_per_set));
        let block_bits = self.block_bits.or(from_file.map(|g| g.block_bits));
        match (set_bits, lines_per_set, block_bits) {
            (Some(s), Some(e), Some(b)) => Ok(CacheGeometry::new(s, e, b)),
            _ => bail!("the cache geometry needs -s, -E and -b, either as flags or in a --config file"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let start = Instant::now();
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::init();
    }

    let geometry = args.geometry()?;
    log::info!("simulating s = {}, E = {}, b = {}", geometry.set_bits, geometry.lines_per_set, geometry.block_bits);
    let mut simulator = Simulator::new(geometry).context("Couldn't build the cache")?;
    let trace_file = File::open(&args.trace).with_context(|| format!("Couldn't open the trace file at path {}", args.trace.display()))?;
    let trace_reader = TraceReader::new(get_reader(trace_file).map_err(|e| anyhow!(e))?);

    let result = if args.verbose {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let mut write_error = None;
        let result = *simulator.simulate_with(trace_reader, |record, report| {
            if record.operation != Operation::Instruction && write_error.is_none() {
                if let Err(e) = writeln!(out, "{record}{report}") {
                    write_error = Some(e);
                }
            }
        })?;
        out.flush()?;
        if let Some(e) = write_error {
            return Err(e).context("Couldn't write the verbose output");
        }
        result
    } else {
        *simulator.simulate(trace_reader)?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result).context("Couldn't serialise the output")?);
    } else {
        println!("{result}");
    }
    if let Some(path) = &args.results {
        fs::write(path, format!("{} {} {}\n", result.hits, result.misses, result.evictions))
            .with_context(|| format!("Couldn't write the results file at path {}", path.display()))?;
    }
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Cache geometry: {geometry:?}");
        println!("Uninitialised cache lines: {} of {}", simulator.get_uninitialised_line_count(), geometry.total_lines());
    }
    Ok(())
}
