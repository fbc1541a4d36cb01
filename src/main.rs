use backend::{FileBackend, FileBackendConfig};
use bucket::BucketType;
use clap::{App, Arg, SubCommand};
use columns::Value;
use std::error::Error;
use std::path::PathBuf;
use store::{Store, StoreConfig};

#[cfg(not(windows))]
use jemallocator::Jemalloc;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = App::new("stss")
        .about("time-series bucket store")
        .arg(
            Arg::with_name("root")
                .long("root")
                .global(true)
                .default_value("target/stss_data")
                .help("directory the file backend persists buckets under"),
        )
        .arg(
            Arg::with_name("bucket-type")
                .long("bucket-type")
                .global(true)
                .default_value("daily")
                .possible_values(&["dynamic", "hourly", "daily", "weekly", "monthly"]),
        )
        .arg(Arg::with_name("target").long("target").global(true).default_value("100"))
        .arg(Arg::with_name("max").long("max").global(true).default_value("200"))
        .subcommand(
            SubCommand::with_name("insert")
                .about("inserts one or more timestamp:value points into a series")
                .arg(Arg::with_name("key").required(true))
                .arg(
                    Arg::with_name("point")
                        .long("point")
                        .multiple(true)
                        .number_of_values(1)
                        .required(true)
                        .help("a timestamp:value pair, e.g. --point 1700000000:1.5"),
                ),
        )
        .subcommand(
            SubCommand::with_name("query")
                .about("prints every sample in [ts_min, ts_max] for a series")
                .arg(Arg::with_name("key").required(true))
                .arg(Arg::with_name("ts_min").required(true))
                .arg(Arg::with_name("ts_max").required(true)),
        )
        .subcommand(
            SubCommand::with_name("aggregate")
                .about("prints windowed aggregates over [ts_min, ts_max] for a series")
                .arg(Arg::with_name("key").required(true))
                .arg(Arg::with_name("ts_min").required(true))
                .arg(Arg::with_name("ts_max").required(true))
                .arg(
                    Arg::with_name("group")
                        .long("group")
                        .default_value("hourly")
                        .possible_values(&["hourly", "daily"]),
                )
                .arg(
                    Arg::with_name("fn")
                        .long("fn")
                        .default_value("mean")
                        .possible_values(&["sum", "count", "min", "max", "amp", "mean"]),
                ),
        )
        .get_matches();

    let root: PathBuf = matches.value_of("root").unwrap().into();
    let bucket_type = match matches.value_of("bucket-type").unwrap() {
        "dynamic" => BucketType::Dynamic,
        "hourly" => BucketType::Hourly,
        "daily" => BucketType::Daily,
        "weekly" => BucketType::Weekly,
        "monthly" => BucketType::Monthly,
        other => unreachable!("clap restricted bucket-type to a known set, got {}", other),
    };
    let dynamic_target: usize = matches.value_of("target").unwrap().parse()?;
    let dynamic_max: usize = matches.value_of("max").unwrap().parse()?;

    let config = StoreConfig { bucket_type, dynamic_target, dynamic_max, ..Default::default() };
    let backend = FileBackend::new(FileBackendConfig { root });
    let store = Store::new(config, backend);

    match matches.subcommand() {
        ("insert", Some(sub)) => {
            let key = sub.value_of("key").unwrap();
            let data = sub
                .values_of("point")
                .unwrap()
                .map(parse_point)
                .collect::<Result<Vec<_>, _>>()?;
            let stats = store.insert(key, data)?;
            println!("{:?}", stats);
        }
        ("query", Some(sub)) => {
            let key = sub.value_of("key").unwrap();
            let ts_min: u32 = sub.value_of("ts_min").unwrap().parse()?;
            let ts_max: u32 = sub.value_of("ts_max").unwrap().parse()?;
            let result_set = store.query(key, ts_min, ts_max)?;
            for (t, v) in result_set.all() {
                println!("{}\t{:?}", t, v);
            }
        }
        ("aggregate", Some(sub)) => {
            let key = sub.value_of("key").unwrap();
            let ts_min: u32 = sub.value_of("ts_min").unwrap().parse()?;
            let ts_max: u32 = sub.value_of("ts_max").unwrap().parse()?;
            let group = sub.value_of("group").unwrap();
            let fn_name = sub.value_of("fn").unwrap();
            let result_set = store.query(key, ts_min, ts_max)?;
            for (window, value) in result_set.aggregation(group, fn_name)? {
                println!("{}\t{:?}", window, value);
            }
        }
        _ => {
            eprintln!("{}", matches.usage());
        }
    }

    Ok(())
}

/// Parses a `timestamp:value` CLI argument into a raw-float sample.
fn parse_point(raw: &str) -> Result<(u32, Value), Box<dyn Error>> {
    let mut parts = raw.splitn(2, ':');
    let t = parts.next().ok_or_else(|| format!("expected timestamp:value, got {}", raw))?;
    let v = parts.next().ok_or_else(|| format!("expected timestamp:value, got {}", raw))?;
    Ok((t.parse::<u32>()?, Value::Float(v.parse::<f32>()?)))
}
