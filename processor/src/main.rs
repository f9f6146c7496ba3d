use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use output::plot::ProjectionKind;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use workflow::config::MetadataStore;
use workflow::radiation::{DuplicatePolicy, RadiationOptions, RadiationRun};
use workflow::runner::{RunOptions, Runner, DEFAULT_MIN_RECORDS};

mod collect;
mod output;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "OCEANET ship-track positioning and publication driver")]
struct Args {
    #[command(subcommand)]
    command: Command,
    /// Directory holding instruments.toml, missions.toml and metadata templates
    #[arg(long, global = true, default_value = "conf")]
    conf: PathBuf,
    /// Log level (off, error, warn, info, debug, trace); RUST_LOG applies when absent
    #[arg(long, global = true, value_parser = parse_level)]
    loglevel: Option<LevelFilter>,
    /// Append log output to this file instead of stderr
    #[arg(long, global = true)]
    logfile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Position sky camera images on the ship track and publish them
    Tsi(TsiArgs),
    /// Publish station radiation readings as NetCDF
    Radiation(RadiationArgs),
    /// Show metadata relations of a mission or an instrument
    Config(ConfigArgs),
}

#[derive(ClapArgs)]
struct TsiArgs {
    #[arg(short, long)]
    cruise: String,
    #[arg(short, long)]
    instrument: String,
    /// Outputs are written only when more records than this remain
    #[arg(long, default_value_t = DEFAULT_MIN_RECORDS)]
    min_records: usize,
    #[arg(long, default_value_t = false)]
    no_zip: bool,
    #[arg(long, default_value_t = false)]
    no_plot: bool,
    #[arg(long, value_enum, default_value_t = ProjectionKind::Ortho)]
    projection: ProjectionKind,
}

#[derive(ClapArgs)]
struct RadiationArgs {
    #[arg(short, long)]
    cruise: String,
    #[arg(short, long)]
    instrument: String,
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Drop)]
    duplicates: DuplicatePolicy,
    /// CF-JSON template, defaults to <conf>/<instrument>_js_meta.json
    #[arg(long)]
    meta: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    #[arg(long, default_value_t = false)]
    plot: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Subject {
    Mission,
    Instrument,
}

#[derive(ClapArgs)]
struct ConfigArgs {
    #[arg(short, long, value_enum)]
    subject: Subject,
    #[arg(short, long)]
    name: String,
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log level '{}'", value))
}

fn init_logging(level: Option<LevelFilter>, logfile: Option<&Path>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} | {:<18} | {:<5} | {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
            record.target(),
            record.level(),
            record.args()
        )
    });
    if let Some(path) = logfile {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("initializing logger")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.loglevel, args.logfile.as_deref())?;

    let store = MetadataStore::load(&args.conf)?;

    match args.command {
        Command::Tsi(tsi) => {
            let selection = store.select(&tsi.cruise, &tsi.instrument)?;
            let options = RunOptions {
                min_records: tsi.min_records,
                archive: !tsi.no_zip,
                plot: !tsi.no_plot,
                projection: tsi.projection,
            };
            let runner = Runner::new(selection, options);
            let result = runner.execute()?;
            println!(
                "Run {} {} -> collected {}, removed {}, positioned {}",
                tsi.cruise,
                tsi.instrument,
                result.metrics.collected,
                result.metrics.removed,
                result.records.len()
            );
            let publication = runner.publish(&result)?;
            println!("Table:   {}", publication.table.display());
            if let Some(archive) = publication.archive {
                println!("Archive: {}", archive.display());
            }
            if let Some(plot) = publication.plot {
                println!("Plot:    {}", plot.display());
            }
        }
        Command::Radiation(radiation) => {
            let selection = store.select(&radiation.cruise, &radiation.instrument)?;
            let template = radiation.meta.unwrap_or_else(|| {
                args.conf
                    .join(format!("{}_js_meta.json", radiation.instrument))
            });
            let run = RadiationRun::new(
                selection,
                RadiationOptions {
                    duplicates: radiation.duplicates,
                    template,
                    output_dir: radiation.output_dir,
                    plot: radiation.plot,
                },
            );
            let result = run.execute()?;
            println!(
                "Radiation {} {} -> readings {}, duplicates {:?} {}, dataset {}",
                radiation.cruise,
                radiation.instrument,
                result.readings,
                radiation.duplicates,
                result.duplicates,
                result.dataset.display()
            );
            if let Some(plot) = result.plot {
                println!("Plot: {}", plot.display());
            }
        }
        Command::Config(config) => match config.subject {
            Subject::Mission => {
                for (name, _) in store.instruments_of(&config.name)? {
                    println!("{} -> {}", config.name, name);
                    for pattern in store.level0_patterns(&config.name, name)? {
                        println!("    {}", pattern.display());
                    }
                }
            }
            Subject::Instrument => {
                for (name, mission) in store.missions_of(&config.name)? {
                    println!(
                        "{} -> {} ({} .. {})",
                        config.name, name, mission.datetime_start, mission.datetime_stopp
                    );
                }
            }
        },
    }

    Ok(())
}
