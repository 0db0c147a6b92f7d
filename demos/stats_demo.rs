use clap::Parser;
use linear_hash::Config;
use linear_hash::LinearHashTable;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "keys", default_value_t = 10_000)]
    keys: usize,

    #[arg(short = 'c', long = "bucket_capacity", default_value_t = 10)]
    bucket_capacity: usize,

    #[arg(short = 'b', long = "buckets", default_value_t = 100)]
    buckets: usize,

    #[arg(long = "max_load_factor", default_value_t = 0.8)]
    max_load_factor: f64,

    /// Insert random keys instead of 0..n.
    #[arg(short = 'r', long = "random")]
    random: bool,
}

fn main() {
    let args = Args::parse();

    let config =
        Config::new(args.bucket_capacity, args.buckets).max_load_factor(args.max_load_factor);
    let mut table = match LinearHashTable::with_config(config) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    println!(
        "Creating LinearHashTable with {} buckets of {} keys",
        table.bucket_count(),
        table.bucket_capacity()
    );
    println!("Initial capacity: {}", table.capacity());
    println!("Filling table with {} i64 keys...", args.keys);

    let mut rng = SmallRng::from_os_rng();
    let mut total_comparisons = 0u64;
    let mut duplicates = 0usize;
    for i in 0..args.keys {
        let key = if args.random { rng.random() } else { i as i64 };
        if !table.insert(key) {
            duplicates += 1;
        }
        total_comparisons += table.comparisons();
    }

    println!("Inserted {} keys into table", table.len());
    println!("Final load factor: {:.2}%", table.load_factor() * 100.0);
    println!(
        "Average comparisons per insert: {:.2}",
        total_comparisons as f64 / args.keys.max(1) as f64
    );

    table.print_chain_histogram();
    table.debug_stats().print();
    if duplicates > 0 {
        println!("Duplicate keys skipped: {duplicates}");
    }
}
