//! CF-JSON metadata templates.
//!
//! A template carries the global attributes, dimensions and variable
//! definitions of a NetCDF product. The writer fills in the data and the
//! attributes that describe one collection.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use log::info;
use oceanetcore::records::SensorBatch;
use oceanetcore::time::TimeUnits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::LOG_TARGET;

pub const TIME_VARIABLE: &str = "time";
pub const TIME_DIMENSION: &str = "time";

const COVERAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfVariable {
    #[serde(default)]
    pub shape: Vec<String>,
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(skip)]
    pub data: Option<Vec<f64>>,
}

fn default_type() -> String {
    "double".into()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CfJson {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub dimensions: Map<String, Value>,
    #[serde(default)]
    pub variables: BTreeMap<String, CfVariable>,
}

impl CfJson {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        info!(
            target: LOG_TARGET,
            "Read json metadata file to generate NetCDF: {}",
            path.display()
        );
        if !path.is_file() {
            bail!("metadata template does not exist: {}", path.display());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading metadata template {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing metadata template {}", path.display()))
    }

    /// Units of the template's `time` variable.
    pub fn time_units(&self) -> anyhow::Result<TimeUnits> {
        let units = self
            .variables
            .get(TIME_VARIABLE)
            .and_then(|var| var.attributes.get("units"))
            .and_then(Value::as_str)
            .context("template has no units for variable 'time'")?;
        Ok(TimeUnits::parse(units)?)
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn set_dimension(&mut self, name: &str, len: usize) {
        self.dimensions.insert(name.to_string(), Value::from(len));
    }

    pub fn set_data(&mut self, variable: &str, data: Vec<f64>) -> anyhow::Result<()> {
        let entry = self
            .variables
            .get_mut(variable)
            .with_context(|| format!("template defines no variable '{}'", variable))?;
        entry.data = Some(data);
        Ok(())
    }

    /// Removes global attributes whose names mark them as comments (`_...`, `#...`).
    pub fn strip_comments(&mut self) -> Vec<String> {
        let comments: Vec<String> = self
            .attributes
            .keys()
            .filter(|key| key.starts_with('_') || key.starts_with('#'))
            .cloned()
            .collect();
        for key in &comments {
            info!(
                target: LOG_TARGET,
                "Delete global attribute, it seems to be a comment: {}", key
            );
            self.attributes.remove(key);
        }
        comments
    }

    /// Fills the template with a radiation batch: collection attributes, the
    /// time dimension and the time, position and radiation columns.
    pub fn populate_radiation(
        &mut self,
        cruise: &str,
        batch: &SensorBatch,
        created: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let (start, end) = batch.time_range().context("no readings to publish")?;
        let extent = batch.extent().context("no readings to publish")?;
        let units = self.time_units()?;

        self.set_attribute("file_created", created.format("%Y-%m-%d").to_string());
        self.set_attribute("project_mission", cruise);
        self.set_attribute("time_coverage_start", start.format(COVERAGE_FORMAT).to_string());
        self.set_attribute("time_coverage_end", end.format(COVERAGE_FORMAT).to_string());
        self.set_attribute("geospatial_lat_min", extent.lat_min);
        self.set_attribute("geospatial_lat_max", extent.lat_max);
        self.set_attribute("geospatial_lon_min", extent.lon_min);
        self.set_attribute("geospatial_lon_max", extent.lon_max);
        self.strip_comments();

        self.set_dimension(TIME_DIMENSION, batch.len());
        info!(target: LOG_TARGET, "Add {} readings to json variables", batch.len());
        self.set_data(TIME_VARIABLE, units.encode_all(&batch.timestamps()))?;
        self.set_data("Latitude", batch.column(|r| r.latitude))?;
        self.set_data("Longitude", batch.column(|r| r.longitude))?;
        self.set_data("DSR", batch.column(|r| r.dsr))?;
        self.set_data("DLR", batch.column(|r| r.dlr))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use oceanetcore::records::SensorReading;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const TEMPLATE: &str = r##"{
  "attributes": {
    "title": "Radiation measured on board",
    "Conventions": "CF-1.6",
    "_comment": "fill in per cruise",
    "#note": "generated",
    "geospatial_lat_units": "degrees_north"
  },
  "dimensions": { "time": null },
  "variables": {
    "time": {
      "shape": ["time"],
      "type": "double",
      "attributes": { "units": "seconds since 1970-01-01 00:00:00", "standard_name": "time" }
    },
    "Latitude": { "shape": ["time"], "type": "double", "attributes": { "units": "degrees_north" } },
    "Longitude": { "shape": ["time"], "type": "double", "attributes": { "units": "degrees_east" } },
    "DSR": { "shape": ["time"], "type": "float", "attributes": { "units": "W m-2", "_FillValue": -999.0 } },
    "DLR": { "shape": ["time"], "type": "float", "attributes": { "units": "W m-2" } }
  }
}"##;

    pub(crate) fn batch() -> SensorBatch {
        let t0 = Utc.with_ymd_and_hms(2019, 10, 1, 0, 0, 0).unwrap();
        SensorBatch::new(
            (0..3)
                .map(|i| SensorReading {
                    timestamp: t0 + chrono::Duration::minutes(i),
                    latitude: 85.0 + i as f64 * 0.01,
                    longitude: 120.0 - i as f64 * 0.02,
                    dsr: 10.0 + i as f64,
                    dlr: 230.0,
                })
                .collect(),
        )
    }

    #[test]
    fn reads_template_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TEMPLATE.as_bytes()).unwrap();
        let cf = CfJson::read(file.path()).unwrap();
        assert_eq!(cf.variables.len(), 5);
        assert_eq!(cf.variables["DSR"].kind, "float");
        assert!(CfJson::read(Path::new("/nonexistent/scaw1_js_meta.json")).is_err());
    }

    #[test]
    fn populates_collection_attributes_and_data() {
        let mut cf: CfJson = serde_json::from_str(TEMPLATE).unwrap();
        let created = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        cf.populate_radiation("PS122", &batch(), created).unwrap();

        assert_eq!(cf.attributes["file_created"], "2020-01-02");
        assert_eq!(cf.attributes["project_mission"], "PS122");
        assert_eq!(cf.attributes["time_coverage_start"], "2019-10-01T00:00:00Z");
        assert_eq!(cf.attributes["time_coverage_end"], "2019-10-01T00:02:00Z");
        assert_eq!(cf.attributes["geospatial_lat_min"], 85.0);
        assert_eq!(cf.attributes["geospatial_lon_max"], 120.0);
        assert!(!cf.attributes.contains_key("_comment"));
        assert!(!cf.attributes.contains_key("#note"));
        assert!(cf.attributes.contains_key("geospatial_lat_units"));
        assert_eq!(cf.dimensions["time"], 3);

        let time = cf.variables["time"].data.as_ref().unwrap();
        assert_eq!(time[0], 1_569_888_000.0);
        assert_eq!(time[2] - time[0], 120.0);
        assert_eq!(cf.variables["DSR"].data, Some(vec![10.0, 11.0, 12.0]));
    }

    #[test]
    fn unknown_variable_or_units_are_errors() {
        let mut cf = CfJson::default();
        assert!(cf.set_data("DSR", vec![]).is_err());
        assert!(cf.time_units().is_err());
        assert!(cf.populate_radiation("PS122", &batch(), Utc::now()).is_err());
    }
}
