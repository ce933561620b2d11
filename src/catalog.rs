//! Country dataset loading and the filter queries that bound a session.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

/// Capital displayed when the dataset does not carry one for a territory.
pub const UNKNOWN_CAPITAL: &str = "Desconocida";

/// Errors raised while loading the country dataset at startup.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The data file could not be read from disk.
    #[error("failed to read country data from `{path}`")]
    Read {
        /// Path that was attempted.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The data file is not valid JSON for the expected schema.
    #[error("failed to parse country data from `{path}`")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A record is missing its name or flag reference.
    #[error("record {index} is missing a country name or flag reference")]
    InvalidRecord {
        /// Zero-based position of the offending record in the source file.
        index: usize,
    },
}

/// Immutable country entry owned by the catalog for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryRecord {
    /// Continent the territory belongs to.
    pub continent: String,
    /// English display name.
    pub english_name: String,
    /// Local-language display name shown as the quiz answer.
    pub local_name: String,
    /// URL of the flag image presented to players.
    pub flag_url: String,
    /// Whether the territory is a sovereign state.
    pub sovereign: bool,
    /// Capital name, when the dataset carries one.
    pub capital: Option<String>,
}

/// Quiz variant selected when starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Guess the country from its flag.
    Flags,
    /// Guess the capital; the reveal shows name and capital together.
    Capitals,
}

/// Tri-state sovereignty filter matching the dataset's "Yes"/"No" field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SovereigntyFilter {
    /// Keep every territory.
    All,
    /// Keep sovereign states only.
    #[serde(rename = "Yes")]
    Sovereign,
    /// Keep non-sovereign territories only.
    #[serde(rename = "No")]
    NonSovereign,
}

/// Selection constructed fresh for each start-session action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Continent to keep, or `None` for all continents.
    pub continent: Option<String>,
    /// Sovereignty filter applied after the continent filter.
    pub sovereignty: SovereigntyFilter,
    /// Cap on the number of records, applied last. `None` or zero keeps
    /// everything, as does a cap larger than the filtered list.
    pub max_count: Option<usize>,
    /// Quiz variant for the session.
    pub game_mode: GameMode,
    /// Whether the session auto-advances without manual scoring.
    pub practice: bool,
}

impl FilterCriteria {
    /// Criteria selecting the whole catalog in flags mode.
    pub fn all(game_mode: GameMode, practice: bool) -> Self {
        Self {
            continent: None,
            sovereignty: SovereigntyFilter::All,
            max_count: None,
            game_mode,
            practice,
        }
    }
}

/// On-disk shape of a single entry in the flags JSON asset.
#[derive(Debug, Deserialize)]
struct RawCountryRecord {
    #[serde(rename = "Continent")]
    continent: String,
    #[serde(rename = "Country_English")]
    english_name: String,
    #[serde(rename = "Country_Spanish")]
    local_name: String,
    #[serde(rename = "Flag_URL")]
    flag_url: String,
    #[serde(rename = "Sovereign_State")]
    sovereign_state: String,
    #[serde(rename = "Capital_Spanish", default)]
    capital: Option<String>,
}

impl From<RawCountryRecord> for CountryRecord {
    fn from(value: RawCountryRecord) -> Self {
        Self {
            continent: value.continent,
            english_name: value.english_name,
            local_name: value.local_name,
            flag_url: value.flag_url,
            sovereign: value.sovereign_state == "Yes",
            capital: value.capital.filter(|capital| !capital.trim().is_empty()),
        }
    }
}

/// Read-only set of country records answering filter and count queries.
#[derive(Debug, Clone)]
pub struct CountryCatalog {
    countries: Vec<CountryRecord>,
}

impl CountryCatalog {
    /// Build a catalog from already-validated records (used by tests).
    pub fn from_records(countries: Vec<CountryRecord>) -> Self {
        Self { countries }
    }

    /// Load and validate the catalog from a JSON asset on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DataLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&contents).map_err(|err| match err {
            DataLoadError::Parse { source, .. } => DataLoadError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        info!(
            path = %path.display(),
            count = catalog.len(),
            "loaded country catalog"
        );
        Ok(catalog)
    }

    /// Parse a catalog out of a JSON document.
    pub fn from_json(contents: &str) -> Result<Self, DataLoadError> {
        let raw: Vec<RawCountryRecord> =
            serde_json::from_str(contents).map_err(|source| DataLoadError::Parse {
                path: String::new(),
                source,
            })?;

        let countries: Vec<CountryRecord> = raw.into_iter().map(Into::into).collect();
        for (index, record) in countries.iter().enumerate() {
            if record.english_name.trim().is_empty() || record.flag_url.trim().is_empty() {
                return Err(DataLoadError::InvalidRecord { index });
            }
        }

        Ok(Self { countries })
    }

    /// Number of records in the full catalog.
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    /// Whether the catalog holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Apply the continent filter, then the sovereignty filter, then the
    /// max-count truncation. The order is fixed: it decides which records
    /// survive a truncation.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<CountryRecord> {
        let mut filtered: Vec<CountryRecord> = self
            .countries
            .iter()
            .filter(|record| match &criteria.continent {
                Some(continent) => record.continent == *continent,
                None => true,
            })
            .filter(|record| match criteria.sovereignty {
                SovereigntyFilter::All => true,
                SovereigntyFilter::Sovereign => record.sovereign,
                SovereigntyFilter::NonSovereign => !record.sovereign,
            })
            .cloned()
            .collect();

        if let Some(cap) = criteria.max_count
            && cap > 0
            && cap <= filtered.len()
        {
            filtered.truncate(cap);
        }

        filtered
    }

    /// Same filter chain as [`CountryCatalog::filter`] minus the truncation,
    /// used to bound the UI max-count input.
    pub fn count(&self, criteria: &FilterCriteria) -> usize {
        let uncapped = FilterCriteria {
            max_count: None,
            ..criteria.clone()
        };
        self.filter(&uncapped).len()
    }

    /// Sorted list of distinct continents present in the catalog.
    pub fn continents(&self) -> Vec<String> {
        let mut continents: Vec<String> = self
            .countries
            .iter()
            .map(|record| record.continent.clone())
            .collect();
        continents.sort();
        continents.dedup();
        continents
    }
}
