use std::path::Path;
use thiserror::Error;

use super::cfjson::CfJson;

#[derive(Debug, Error)]
pub enum NetCdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    #[cfg(feature = "netcdf")]
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("NetCDF feature not enabled, rebuild with `--features netcdf`")]
    FeatureDisabled,
}

/// Creates a NetCDF file from a populated CF-JSON template.
#[cfg(feature = "netcdf")]
pub fn write_radiation_dataset(path: &Path, cf: &CfJson) -> Result<(), NetCdfError> {
    use log::info;
    use serde_json::Value;

    use super::LOG_TARGET;

    info!(target: LOG_TARGET, "Write data to file: {}", path.display());
    let mut file = netcdf::create(path)?;

    for (name, size) in &cf.dimensions {
        match size {
            Value::Null => {
                file.add_unlimited_dimension(name)?;
            }
            value => {
                let len = value.as_u64().ok_or_else(|| {
                    NetCdfError::InvalidData(format!("dimension {} has size {}", name, value))
                })?;
                file.add_dimension(name, len as usize)?;
            }
        }
    }

    for (key, value) in &cf.attributes {
        if let Some(attribute) = attribute_value(value, false) {
            file.add_attribute(key, attribute)?;
        }
    }

    for (name, variable) in &cf.variables {
        let dims: Vec<&str> = variable.shape.iter().map(String::as_str).collect();
        let single = match variable.kind.as_str() {
            "double" | "f8" => false,
            "float" | "f4" => true,
            other => {
                return Err(NetCdfError::InvalidData(format!(
                    "variable {} has unsupported type {}",
                    name, other
                )))
            }
        };

        if single {
            let mut var = file.add_variable::<f32>(name, &dims)?;
            for (key, value) in &variable.attributes {
                if let Some(attribute) = attribute_value(value, true) {
                    var.put_attribute(key, attribute)?;
                }
            }
            if let Some(data) = &variable.data {
                let values: Vec<f32> = data.iter().map(|&v| v as f32).collect();
                var.put_values(&values, ..)?;
            }
        } else {
            let mut var = file.add_variable::<f64>(name, &dims)?;
            for (key, value) in &variable.attributes {
                if let Some(attribute) = attribute_value(value, false) {
                    var.put_attribute(key, attribute)?;
                }
            }
            if let Some(data) = &variable.data {
                var.put_values(data, ..)?;
            }
        }
    }
    Ok(())
}

#[cfg(not(feature = "netcdf"))]
pub fn write_radiation_dataset(_path: &Path, _cf: &CfJson) -> Result<(), NetCdfError> {
    Err(NetCdfError::FeatureDisabled)
}

/// Maps a JSON attribute onto a NetCDF attribute. Numbers on single precision
/// variables are stored as floats so `_FillValue` matches the variable type.
#[cfg(feature = "netcdf")]
fn attribute_value(value: &serde_json::Value, single: bool) -> Option<netcdf::AttributeValue> {
    use netcdf::AttributeValue;
    use serde_json::Value;

    match value {
        Value::String(text) => Some(AttributeValue::Str(text.clone())),
        Value::Number(number) if single => number.as_f64().map(|v| AttributeValue::Float(v as f32)),
        Value::Number(number) => match number.as_i64() {
            Some(v) => Some(AttributeValue::Longlong(v)),
            None => number.as_f64().map(AttributeValue::Double),
        },
        Value::Bool(flag) => Some(AttributeValue::Schar(i8::from(*flag))),
        Value::Array(items) => {
            let numbers: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            match numbers {
                Some(values) if single => Some(AttributeValue::Floats(
                    values.into_iter().map(|v| v as f32).collect(),
                )),
                Some(values) => Some(AttributeValue::Doubles(values)),
                None => None,
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(all(test, not(feature = "netcdf")))]
mod tests {
    use super::*;

    #[test]
    fn writer_reports_disabled_feature() {
        let err = write_radiation_dataset(Path::new("PS122_scaw1.nc"), &CfJson::default())
            .unwrap_err();
        assert!(matches!(err, NetCdfError::FeatureDisabled));
    }
}
