//! Data Loading and Management
//!
//! Holds the read-only snapshot scored per invocation: one `UnitRecord` per
//! Panchayat and its optional coordinates. CSV loading goes through Polars;
//! the scoring code only ever sees the parsed records.

use crate::utils::names::normalize_name;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw environmental signals for one administrative unit
///
/// Groundwater values are meters below ground level: lower = higher water table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub name: String,
    pub rainfall_normal: f64,
    pub rainfall_current: f64,
    pub groundwater_last: Option<f64>,
    pub groundwater_current: Option<f64>,
    pub urban_percent: Option<f64>,
    pub forest_percent: Option<f64>,
    pub water_body_percent: Option<f64>,
}

impl UnitRecord {
    /// Groundwater `(last, current)` after substitution.
    ///
    /// A single present reading stands in for the missing one (no change).
    /// `None` when both are absent.
    pub fn groundwater(&self) -> Option<(f64, f64)> {
        match (self.groundwater_last, self.groundwater_current) {
            (Some(last), Some(current)) => Some((last, current)),
            (Some(v), None) | (None, Some(v)) => Some((v, v)),
            (None, None) => None,
        }
    }

    pub fn urban(&self) -> f64 {
        self.urban_percent.unwrap_or(0.0)
    }

    pub fn forest(&self) -> f64 {
        self.forest_percent.unwrap_or(0.0)
    }

    pub fn water_body(&self) -> f64 {
        self.water_body_percent.unwrap_or(0.0)
    }
}

/// Geocoded position of a unit; unresolved coordinates stay `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Snapshot of units and locations for one batch run or request
#[derive(Debug, Clone)]
pub struct RiskData {
    pub units: Vec<UnitRecord>,
    pub locations: Vec<LocationRecord>,

    /// Normalized name → index of the first unit with that name
    name_index: FxHashMap<String, usize>,
}

impl RiskData {
    pub fn from_records(units: Vec<UnitRecord>, locations: Vec<LocationRecord>) -> Self {
        let mut name_index = FxHashMap::default();
        for (idx, unit) in units.iter().enumerate() {
            // First by input order wins on normalized collisions
            name_index.entry(normalize_name(&unit.name)).or_insert(idx);
        }

        RiskData {
            units,
            locations,
            name_index,
        }
    }

    /// Load the unit and location CSVs
    pub fn load(units_csv: &Path, locations_csv: &Path) -> Result<Self> {
        let units = Self::load_units(units_csv)?;
        let locations = Self::load_locations(locations_csv)?;

        tracing::info!(
            units = units.len(),
            locations = locations.len(),
            "Loaded risk snapshot"
        );

        Ok(Self::from_records(units, locations))
    }

    /// Load units only; interactive lookups then fail at the nearest-neighbour step
    pub fn load_units_only(units_csv: &Path) -> Result<Self> {
        let units = Self::load_units(units_csv)?;
        tracing::info!(units = units.len(), "Loaded risk snapshot (no locations)");
        Ok(Self::from_records(units, Vec::new()))
    }

    /// Unit whose normalized name equals the normalized input
    pub fn unit_by_name(&self, raw: &str) -> Option<&UnitRecord> {
        self.name_index
            .get(&normalize_name(raw))
            .map(|&idx| &self.units[idx])
    }

    /// Sorted, de-duplicated unit names for selectors
    pub fn panchayat_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.iter().map(|u| u.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Absolute groundwater change for every unit with at least one reading
    pub fn groundwater_changes(&self) -> Vec<f64> {
        self.units
            .iter()
            .filter_map(|u| u.groundwater())
            .map(|(last, current)| (last - current).abs())
            .collect()
    }

    fn load_units(path: &Path) -> Result<Vec<UnitRecord>> {
        let df = read_csv(path)?;

        let names = string_column(&df, "Panchayat")?;
        let rainfall_normal = float_column(&df, "R_normal")?;
        let rainfall_current = float_column(&df, "R_current")?;
        let gw_last = float_column(&df, "GW_last")?;
        let gw_current = float_column(&df, "GW_current")?;
        let urban = float_column(&df, "Urban_Percent")?;
        let forest = float_column(&df, "Forest_Percent")?;

        // Older snapshots predate the water-body column
        let water_body = if df.get_column_names().iter().any(|c| c.as_str() == "Water_Body_Percent") {
            float_column(&df, "Water_Body_Percent")?
        } else {
            vec![None; df.height()]
        };

        let mut units = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let Some(name) = names[idx].clone() else {
                tracing::warn!(row = idx, "Skipping unit row without a Panchayat name");
                continue;
            };

            units.push(UnitRecord {
                name,
                rainfall_normal: rainfall_normal[idx].unwrap_or(0.0),
                rainfall_current: rainfall_current[idx].unwrap_or(0.0),
                groundwater_last: gw_last[idx],
                groundwater_current: gw_current[idx],
                urban_percent: urban[idx],
                forest_percent: forest[idx],
                water_body_percent: water_body[idx],
            });
        }

        Ok(units)
    }

    fn load_locations(path: &Path) -> Result<Vec<LocationRecord>> {
        let df = read_csv(path)?;

        let names = string_column(&df, "Panchayat")?;
        let latitudes = float_column(&df, "Latitude")?;
        let longitudes = float_column(&df, "Longitude")?;

        let locations = (0..df.height())
            .filter_map(|idx| {
                names[idx].clone().map(|name| LocationRecord {
                    name,
                    latitude: latitudes[idx],
                    longitude: longitudes[idx],
                })
            })
            .collect();

        Ok(locations)
    }
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {}", path.display()))
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be read as text", name))?;

    let values = column
        .str()
        .with_context(|| format!("Column '{}' is not string type", name))?
        .into_iter()
        .map(|opt| opt.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();

    Ok(values)
}

/// Numeric column as `Float64`; nulls (and non-numeric cells) become `None`
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;

    let values = column
        .f64()
        .with_context(|| format!("Column '{}' is not f64 after cast", name))?
        .into_iter()
        .map(|opt| opt.filter(|v| v.is_finite()))
        .collect();

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn unit(name: &str) -> UnitRecord {
        UnitRecord {
            name: name.to_string(),
            rainfall_normal: 1000.0,
            rainfall_current: 1000.0,
            groundwater_last: None,
            groundwater_current: None,
            urban_percent: None,
            forest_percent: None,
            water_body_percent: None,
        }
    }

    #[test]
    fn test_groundwater_substitution() {
        let mut u = unit("A");
        assert_eq!(u.groundwater(), None);

        u.groundwater_last = Some(4.2);
        assert_eq!(u.groundwater(), Some((4.2, 4.2)));

        u.groundwater_last = None;
        u.groundwater_current = Some(3.1);
        assert_eq!(u.groundwater(), Some((3.1, 3.1)));

        u.groundwater_last = Some(5.0);
        assert_eq!(u.groundwater(), Some((5.0, 3.1)));
    }

    #[test]
    fn test_land_use_defaults_to_zero() {
        let u = unit("A");
        assert_eq!(u.urban(), 0.0);
        assert_eq!(u.forest(), 0.0);
        assert_eq!(u.water_body(), 0.0);
    }

    #[test]
    fn test_name_index_first_wins() {
        let mut first = unit("Perumon");
        first.rainfall_current = 1100.0;
        let data = RiskData::from_records(vec![first, unit("PERUMON*")], vec![]);

        let found = data.unit_by_name(" perumon ").unwrap();
        assert_eq!(found.rainfall_current, 1100.0);
        assert!(data.unit_by_name("Kundara").is_none());
    }

    #[test]
    fn test_load_csv_with_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        let units_path = dir.path().join("units.csv");
        let locations_path = dir.path().join("locations.csv");

        let mut f = std::fs::File::create(&units_path).unwrap();
        writeln!(f, "Panchayat,R_normal,R_current,GW_last,GW_current,Urban_Percent,Forest_Percent").unwrap();
        writeln!(f, "Perumon,1000,1300,5.0,3.0,40,30").unwrap();
        writeln!(f, "Kundara,1200,900,,4.5,,").unwrap();

        let mut f = std::fs::File::create(&locations_path).unwrap();
        writeln!(f, "Panchayat,Latitude,Longitude").unwrap();
        writeln!(f, "Perumon,8.95,76.60").unwrap();
        writeln!(f, "Kundara,,").unwrap();

        let data = RiskData::load(&units_path, &locations_path).unwrap();
        assert_eq!(data.units.len(), 2);
        assert_eq!(data.units[1].groundwater_last, None);
        assert_eq!(data.units[1].groundwater(), Some((4.5, 4.5)));
        assert_eq!(data.units[1].urban_percent, None);
        assert_eq!(data.units[0].water_body_percent, None);

        assert_eq!(data.locations.len(), 2);
        assert!(data.locations[0].coordinates().is_some());
        assert!(data.locations[1].coordinates().is_none());
    }
}
