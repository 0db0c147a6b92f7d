use std::path::PathBuf;

use clap::Parser;
use linear_hash::Config;
use linear_hash::LinearHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Prints the average number of key comparisons per insert, search and delete
/// for two linear hash tables that differ only in their split threshold.
#[derive(Parser, Debug)]
struct Args {
    /// File of big-endian 4-byte signed integers to use as keys.
    #[arg(short = 'k', long = "keys")]
    keys: Option<PathBuf>,

    /// Number of keys to generate when no key file is given.
    #[arg(short = 'n', long = "count", default_value_t = 10_000)]
    count: usize,

    /// Seed for key generation and sampling.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Keys inserted per report line.
    #[arg(short = 'b', long = "batch", default_value_t = 100)]
    batch: usize,

    /// Keys searched for and then deleted per report line.
    #[arg(long = "samples", default_value_t = 50)]
    samples: usize,

    #[arg(long = "bucket_capacity", default_value_t = 10)]
    bucket_capacity: usize,

    #[arg(long = "buckets", default_value_t = 100)]
    buckets: usize,
}

fn read_keys(path: &PathBuf) -> std::io::Result<Vec<i64>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() % 4 != 0 {
        eprintln!(
            "warning: {} has {} trailing bytes, ignoring them",
            path.display(),
            bytes.len() % 4
        );
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as i64)
        .collect())
}

#[derive(Default)]
struct Totals {
    insert: u64,
    search: u64,
    delete: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let keys = match &args.keys {
        Some(path) => read_keys(path)?,
        None => (0..args.count)
            .map(|_| rng.random_range(1..=1_000_000))
            .collect(),
    };
    if keys.is_empty() {
        return Err("no keys to insert".into());
    }

    let geometry = Config::new(args.bucket_capacity, args.buckets);
    let mut tables = [
        LinearHashTable::with_config(geometry.max_load_factor(0.5))?,
        LinearHashTable::with_config(geometry.max_load_factor(0.8))?,
    ];

    println!(
        "{} keys, {} keys per bucket, {} initial buckets",
        keys.len(),
        args.bucket_capacity,
        args.buckets
    );
    println!(
        "{:>10} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8}",
        "", "u>50%", "u>50%", "u>50%", "u>80%", "u>80%", "u>80%"
    );
    println!(
        "{:>10} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8} | {:>8}",
        "input size", "insert", "search", "delete", "insert", "search", "delete"
    );

    let samples = args.samples.max(1);
    for (index, batch) in keys.chunks(args.batch.max(1)).enumerate() {
        let mut totals = [Totals::default(), Totals::default()];

        for (table, totals) in tables.iter_mut().zip(totals.iter_mut()) {
            for &key in batch {
                table.insert(key);
                totals.insert += table.comparisons();
            }
        }

        let picks: Vec<i64> = (0..samples)
            .map(|_| keys[rng.random_range(0..keys.len())])
            .collect();

        for (table, totals) in tables.iter_mut().zip(totals.iter_mut()) {
            for &key in &picks {
                table.search(key);
                totals.search += table.comparisons();
            }
            for &key in &picks {
                table.delete(key);
                totals.delete += table.comparisons();
            }
        }

        let inserted = batch.len() as f64;
        let sampled = samples as f64;
        println!(
            "{:>10} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1} | {:>8.1}",
            index * args.batch.max(1),
            totals[0].insert as f64 / inserted,
            totals[0].search as f64 / sampled,
            totals[0].delete as f64 / sampled,
            totals[1].insert as f64 / inserted,
            totals[1].search as f64 / sampled,
            totals[1].delete as f64 / sampled,
        );
    }

    for (label, table) in ["u>50%", "u>80%"].iter().zip(&tables) {
        println!(
            "{label}: {} keys in {} buckets, load factor {:.2}",
            table.len(),
            table.bucket_count(),
            table.load_factor()
        );
    }

    Ok(())
}
