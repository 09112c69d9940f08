use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// MunicipalRecord – one row of the municipal table
// ---------------------------------------------------------------------------

/// A single municipality. Field names match the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalRecord {
    pub municipio: String,
    pub estado: String,
    pub regiao: String,
    pub uf: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Estimated population in 2021.
    #[serde(deserialize_with = "deserialize_population")]
    pub pop_21: u64,
}

/// The column names every source file must provide.
pub const COLUMNS: [&str; 7] = [
    "municipio",
    "estado",
    "regiao",
    "uf",
    "latitude",
    "longitude",
    "pop_21",
];

/// Pandas writes integer columns with missing values as floats (`"1234.0"`),
/// so accept either form.
fn deserialize_population<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(i) => return Ok(i),
        Raw::Float(f) => f,
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid population '{s}'")))?,
    };
    population_from_f64(value).map_err(serde::de::Error::custom)
}

pub(crate) fn population_from_f64(value: f64) -> Result<u64, String> {
    if value.is_finite() && value >= 0.0 {
        Ok(value.round() as u64)
    } else {
        Err(format!("invalid population {value}"))
    }
}

impl MunicipalRecord {
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ---------------------------------------------------------------------------
// MunicipalDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Built once and never mutated; filtered views
/// refer to rows by index.
#[derive(Debug, Clone, Default)]
pub struct MunicipalDataset {
    /// All municipalities (rows), in file order.
    pub records: Vec<MunicipalRecord>,
    /// Sorted set of state names present in the data.
    pub states: BTreeSet<String>,
}

impl MunicipalDataset {
    pub fn from_records(records: Vec<MunicipalRecord>) -> Self {
        let states = records.iter().map(|r| r.estado.clone()).collect();
        MunicipalDataset { records, states }
    }

    /// Number of municipalities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<&MunicipalRecord> {
        self.records.get(index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(
        municipio: &str,
        estado: &str,
        regiao: &str,
        uf: &str,
        pop_21: u64,
    ) -> MunicipalRecord {
        MunicipalRecord {
            municipio: municipio.to_string(),
            estado: estado.to_string(),
            regiao: regiao.to_string(),
            uf: uf.to_string(),
            latitude: -15.0,
            longitude: -47.0,
            pop_21,
        }
    }

    #[test]
    fn states_are_sorted_and_unique() {
        let ds = MunicipalDataset::from_records(vec![
            record("Santos", "São Paulo", "Sudeste", "SP", 433_656),
            record("Manaus", "Amazonas", "Norte", "AM", 2_255_903),
            record("Campinas", "São Paulo", "Sudeste", "SP", 1_223_237),
        ]);
        let states: Vec<&str> = ds.states.iter().map(String::as_str).collect();
        assert_eq!(states, vec!["Amazonas", "São Paulo"]);
        assert_eq!(ds.len(), 3);
        assert!(ds.record(3).is_none());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut r = record("X", "Y", "Z", "W", 1);
        assert!(r.has_valid_coordinates());
        r.latitude = f64::NAN;
        assert!(!r.has_valid_coordinates());
        r.latitude = 95.0;
        assert!(!r.has_valid_coordinates());
    }

    #[test]
    fn population_accepts_float_text() {
        let json = r#"{"municipio":"A","estado":"B","regiao":"C","uf":"D",
            "latitude":-1.0,"longitude":-2.0,"pop_21":"1234.0"}"#;
        let r: MunicipalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.pop_21, 1234);

        let json = json.replace("\"1234.0\"", "987.6");
        let r: MunicipalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r.pop_21, 988);
    }

    #[test]
    fn population_rejects_negative() {
        let json = r#"{"municipio":"A","estado":"B","regiao":"C","uf":"D",
            "latitude":-1.0,"longitude":-2.0,"pop_21":-5}"#;
        assert!(serde_json::from_str::<MunicipalRecord>(json).is_err());
    }
}
