use anyhow::{anyhow, bail, Context};
use chrono::{Duration, NaiveDate};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const INSTRUMENTS_FILE: &str = "instruments.toml";
pub const MISSIONS_FILE: &str = "missions.toml";

const LOG_TARGET: &str = "oceanet.config";

/// A cruise leg as described in `missions.toml`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mission {
    pub datetime_start: toml::value::Datetime,
    pub datetime_stopp: toml::value::Datetime,
    #[serde(default)]
    pub instruments: Vec<String>,
    pub track: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Mission {
    /// Every UTC day from the start date to the stop date, both included.
    pub fn dates(&self) -> anyhow::Result<Vec<NaiveDate>> {
        let start = calendar_date(&self.datetime_start)
            .with_context(|| format!("datetime_start {}", self.datetime_start))?;
        let stop = calendar_date(&self.datetime_stopp)
            .with_context(|| format!("datetime_stopp {}", self.datetime_stopp))?;

        let mut dates = Vec::new();
        let mut day = start;
        while day <= stop {
            dates.push(day);
            day += Duration::days(1);
        }
        Ok(dates)
    }
}

fn calendar_date(value: &toml::value::Datetime) -> anyhow::Result<NaiveDate> {
    let date = value
        .date
        .ok_or_else(|| anyhow!("'{}' carries no calendar date", value))?;
    NaiveDate::from_ymd_opt(date.year.into(), date.month.into(), date.day.into())
        .ok_or_else(|| anyhow!("'{}' is not a valid calendar date", value))
}

/// An instrument entry of `instruments.toml`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instrument {
    /// Root of the level-0 archive.
    pub path_level0_fix: PathBuf,
    /// strftime template below the root, evaluated for every mission day.
    pub path_filenames_level0: String,
    pub path_level1a_csv: Option<PathBuf>,
    pub path_level1a_image: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Instrument {
    pub fn level0_patterns(&self, dates: &[NaiveDate]) -> anyhow::Result<Vec<PathBuf>> {
        dates
            .iter()
            .map(|date| {
                let mut relative = String::new();
                write!(relative, "{}", date.format(&self.path_filenames_level0)).map_err(|_| {
                    anyhow!(
                        "invalid path_filenames_level0 template '{}'",
                        self.path_filenames_level0
                    )
                })?;
                Ok(self.path_level0_fix.join(relative))
            })
            .collect()
    }

    /// `path_level1a_csv` with `suffix` appended verbatim.
    pub fn csv_output(&self, suffix: &str) -> anyhow::Result<PathBuf> {
        let prefix = self
            .path_level1a_csv
            .as_deref()
            .context("instrument has no path_level1a_csv")?;
        Ok(append_to_path(prefix, suffix))
    }

    /// `path_level1a_image` with `suffix` appended verbatim.
    pub fn image_output(&self, suffix: &str) -> anyhow::Result<PathBuf> {
        let prefix = self
            .path_level1a_image
            .as_deref()
            .context("instrument has no path_level1a_image")?;
        Ok(append_to_path(prefix, suffix))
    }
}

fn append_to_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut joined = prefix.as_os_str().to_os_string();
    joined.push(suffix);
    PathBuf::from(joined)
}

/// One instrument of one mission, with its resolved level-0 file patterns.
#[derive(Clone, Debug)]
pub struct Selection {
    pub mission_name: String,
    pub mission: Mission,
    pub instrument_name: String,
    pub instrument: Instrument,
    pub patterns: Vec<PathBuf>,
}

impl Selection {
    pub fn track_path(&self) -> anyhow::Result<&Path> {
        self.mission
            .track
            .as_deref()
            .with_context(|| format!("mission '{}' names no track file", self.mission_name))
    }

    /// `<cruise>_<instrument>` stem shared by every output file.
    pub fn output_stem(&self) -> String {
        format!("{}_{}", self.mission_name, self.instrument_name)
    }
}

/// TOML metadata of all instruments and missions.
#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
    pub instruments: BTreeMap<String, Instrument>,
    pub missions: BTreeMap<String, Mission>,
}

impl MetadataStore {
    pub fn load<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        info!(target: LOG_TARGET, "Start to read config files in {}", dir.display());
        let instruments = read_table(&dir.join(INSTRUMENTS_FILE))?;
        let missions = read_table(&dir.join(MISSIONS_FILE))?;
        Ok(Self::from_parts(instruments, missions))
    }

    pub fn from_toml(instruments: &str, missions: &str) -> anyhow::Result<Self> {
        Ok(Self::from_parts(
            toml::from_str(instruments).context("parsing instruments")?,
            toml::from_str(missions).context("parsing missions")?,
        ))
    }

    fn from_parts(
        instruments: BTreeMap<String, Instrument>,
        missions: BTreeMap<String, Mission>,
    ) -> Self {
        Self {
            instruments,
            missions,
        }
    }

    pub fn mission(&self, name: &str) -> anyhow::Result<&Mission> {
        self.missions
            .get(name)
            .ok_or_else(|| anyhow!("mission does not exist: {}", name))
    }

    pub fn instrument(&self, name: &str) -> anyhow::Result<&Instrument> {
        self.instruments
            .get(name)
            .ok_or_else(|| anyhow!("instrument does not exist: {}", name))
    }

    /// Instruments listed by a mission. Names without an instrument entry are
    /// reported and skipped.
    pub fn instruments_of(&self, mission: &str) -> anyhow::Result<Vec<(&str, &Instrument)>> {
        info!(
            target: LOG_TARGET,
            "Collect instruments related to mission {}", mission
        );
        let entry = self.mission(mission)?;
        Ok(entry
            .instruments
            .iter()
            .filter_map(|name| match self.instruments.get(name) {
                Some(instrument) => Some((name.as_str(), instrument)),
                None => {
                    warn!(
                        target: LOG_TARGET,
                        "Mission {} lists unknown instrument {}", mission, name
                    );
                    None
                }
            })
            .collect())
    }

    /// Missions that list the given instrument.
    pub fn missions_of(&self, instrument: &str) -> anyhow::Result<Vec<(&str, &Mission)>> {
        info!(
            target: LOG_TARGET,
            "Collect missions related to instrument {}", instrument
        );
        self.instrument(instrument)?;
        Ok(self
            .missions
            .iter()
            .filter(|(_, mission)| mission.instruments.iter().any(|i| i == instrument))
            .map(|(name, mission)| (name.as_str(), mission))
            .collect())
    }

    /// Level-0 file patterns of an instrument, one per mission day.
    pub fn level0_patterns(&self, mission: &str, instrument: &str) -> anyhow::Result<Vec<PathBuf>> {
        let dates = self
            .mission(mission)?
            .dates()
            .with_context(|| format!("building day list of mission {}", mission))?;
        self.instrument(instrument)?
            .level0_patterns(&dates)
            .with_context(|| format!("building level-0 paths of {}", instrument))
    }

    pub fn select(&self, mission: &str, instrument: &str) -> anyhow::Result<Selection> {
        let entry = self.mission(mission)?;
        if !entry.instruments.iter().any(|name| name == instrument) {
            bail!(
                "instrument \"{}\" does not exist in mission \"{}\"",
                instrument,
                mission
            );
        }
        let patterns = self.level0_patterns(mission, instrument)?;

        Ok(Selection {
            mission_name: mission.to_string(),
            mission: entry.clone(),
            instrument_name: instrument.to_string(),
            instrument: self.instrument(instrument)?.clone(),
            patterns,
        })
    }
}

fn read_table<T>(path: &Path) -> anyhow::Result<BTreeMap<String, T>>
where
    T: for<'de> Deserialize<'de>,
{
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading metadata file {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing metadata file {}", path.display()))
}
