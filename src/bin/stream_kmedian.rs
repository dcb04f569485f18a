//! Streaming k-median clustering over a point stream.
//!
//! Usage: `stream_kmedian k1 k2 d n chunksize clustersize infile outfile nproc`
//!
//! Reads raw little-endian f32 points from `infile` (or generates `n`
//! synthetic points when `n > 0`), clusters them chunk by chunk, and dumps
//! the final weighted centers to `outfile`.

use std::env;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::process;

use env_logger::Env;
use stream_kmedian::{
    FileStream, PointStream, StreamClusterer, StreamConfig, SyntheticStream, SEED,
};

fn usage(prog: &str) -> ! {
    eprintln!("usage: {prog} k1 k2 d n chunksize clustersize infile outfile nproc");
    eprintln!("  k1:          Min. number of centers allowed");
    eprintln!("  k2:          Max. number of centers allowed");
    eprintln!("  d:           Dimension of each data point");
    eprintln!("  n:           Number of data points");
    eprintln!("  chunksize:   Number of data points to handle per step");
    eprintln!("  clustersize: Maximum number of intermediate centers");
    eprintln!("  infile:      Input file (if n<=0)");
    eprintln!("  outfile:     Output file");
    eprintln!("  nproc:       Number of threads to use");
    eprintln!();
    eprintln!("if n > 0, points will be randomly generated instead of reading from infile.");
    process::exit(1);
}

fn parse<T: std::str::FromStr>(prog: &str, arg: &str) -> T {
    match arg.parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("cannot parse argument '{arg}'");
            usage(prog);
        }
    }
}

fn main() {
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("stream_kmedian");
    if args.len() != 10 {
        usage(prog);
    }

    let kmin: usize = parse(prog, &args[1]);
    let kmax: usize = parse(prog, &args[2]);
    let dim: usize = parse(prog, &args[3]);
    let n: i64 = parse(prog, &args[4]);
    let chunk_size: usize = parse(prog, &args[5]);
    let center_capacity: usize = parse(prog, &args[6]);
    let infile = &args[7];
    let outfile = &args[8];
    let n_workers: usize = parse(prog, &args[9]);

    if kmin < 1 || kmax < kmin || dim < 1 || chunk_size < 1 || center_capacity < 1 || n_workers < 1
    {
        eprintln!("argument out of range");
        usage(prog);
    }

    if let Err(e) = run(
        kmin,
        kmax,
        dim,
        n,
        chunk_size,
        center_capacity,
        infile,
        outfile,
        n_workers,
    ) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    kmin: usize,
    kmax: usize,
    dim: usize,
    n: i64,
    chunk_size: usize,
    center_capacity: usize,
    infile: &str,
    outfile: &str,
    n_workers: usize,
) -> Result<(), Box<dyn Error>> {
    let config = StreamConfig::new(kmin, kmax)
        .with_dim(dim)
        .with_chunk_size(chunk_size)
        .with_center_capacity(center_capacity)
        .with_workers(n_workers)
        .with_seed(SEED);
    let clusterer = StreamClusterer::new(config)?;

    let mut stream: Box<dyn PointStream> = if n > 0 {
        Box::new(SyntheticStream::new(n as usize, SEED))
    } else {
        Box::new(FileStream::open(infile)?)
    };

    let result = clusterer.cluster(&mut *stream)?;

    let out = File::create(outfile)
        .map_err(|e| format!("error opening {outfile}: {e}"))?;
    let mut writer = BufWriter::new(out);
    result.write_to(&mut writer)?;

    Ok(())
}
