use replay::config::ReplayConfig;
use replay::filter::YearFilter;
use replay::stats::StatsEngine;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    dir: Option<PathBuf>,
    files: Vec<PathBuf>,
    year: YearFilter,
    limit: Option<usize>,
    json: bool,
    utc: bool,
    save_defaults: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args(std::env::args().skip(1).collect())?;
    let config = apply_args(replay::config::load_config()?, &args);

    if args.save_defaults {
        replay::config::save_config(&config)?;
        log::info!("saved defaults to {}", replay::config::config_path()?.display());
        if args.files.is_empty() && config.history_dir.is_none() {
            return Ok(());
        }
    }

    let records = if !args.files.is_empty() {
        replay::history::load_history(&args.files)?
    } else {
        let Some(dir) = &config.history_dir else {
            anyhow::bail!("no history folder given; pass --dir or --file");
        };
        replay::history::load_history_dir(dir)?
    };

    let engine = if config.use_utc {
        StatsEngine::utc()
    } else {
        StatsEngine::local()
    };
    let report = replay::report::Report::build(&engine, &records, args.year, config.top_limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

/// Command-line flags take precedence over the stored defaults.
fn apply_args(mut config: ReplayConfig, args: &CliArgs) -> ReplayConfig {
    if let Some(dir) = &args.dir {
        config.history_dir = Some(dir.clone());
    }
    if let Some(limit) = args.limit {
        config.top_limit = limit;
    }
    config.use_utc |= args.utc;
    config
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--dir" => out.dir = Some(PathBuf::from(take_value(&args, &mut index, "--dir")?)),
            "--file" => out
                .files
                .push(PathBuf::from(take_value(&args, &mut index, "--file")?)),
            "--year" => out.year = take_value(&args, &mut index, "--year")?.parse()?,
            "--limit" => {
                let value = take_value(&args, &mut index, "--limit")?;
                let Ok(limit) = value.parse::<usize>() else {
                    anyhow::bail!("--limit expects a whole number, got {value}");
                };
                out.limit = Some(limit);
            }
            "--json" => out.json = true,
            "--utc" => out.utc = true,
            "--save-defaults" => out.save_defaults = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn take_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
    *index += 1;
    let Some(value) = args.get(*index) else {
        anyhow::bail!("{flag} requires a value");
    };
    if value.trim().is_empty() {
        anyhow::bail!("{flag} cannot be empty");
    }
    Ok(value.trim())
}

fn print_help() {
    println!("replay");
    println!("  --dir path        Folder holding Streaming_History_Audio_*.json files");
    println!("  --file path       Single export file (repeatable)");
    println!("  --year YYYY|all   Restrict views to one calendar year");
    println!("  --limit n         Entries in the top track/artist lists");
    println!("  --json            Print the report as JSON");
    println!("  --utc             Bucket by UTC instead of local time");
    println!("  --save-defaults   Store --dir, --limit and --utc as defaults");
}
