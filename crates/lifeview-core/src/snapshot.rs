//! Wire shapes returned by the remote simulation's query endpoints.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Analysis text stored when the report endpoint cannot be reached.
pub const REPORT_UNAVAILABLE: &str = "AI OFFLINE";

/// Local mirror of the remote simulation, replaced wholesale by every applied poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationSnapshot {
    /// Living cells as counted by the simulation engine.
    #[serde(deserialize_with = "non_negative")]
    pub alive_count: u32,
    /// Food units left in the shared pool.
    #[serde(deserialize_with = "non_negative")]
    pub available_food: u32,
    pub paused: bool,
    /// Whether the remote has an active run at all (absent before the first `start`).
    pub running: bool,
    /// Rendered food items; the remote caps this list independently of `available_food`.
    pub food: Vec<FoodItem>,
    #[serde(rename = "activeCells")]
    pub cells: Vec<CellRecord>,
}

impl SimulationSnapshot {
    pub fn hungry_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.hungry).count()
    }

    pub fn variant_count(&self, variant: CellVariant) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.variant == variant)
            .count()
    }
}

/// Food position in percent coordinates (0..=100 on both axes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodItem {
    pub x: f64,
    pub y: f64,
}

/// One living cell as reported by the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellRecord {
    /// Stable for the lifetime of the cell.
    pub id: u64,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub variant: CellVariant,
    #[serde(rename = "isHungry")]
    pub hungry: bool,
    #[serde(rename = "isReproducing")]
    pub reproducing: bool,
}

/// Reproduction strategy of a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CellVariant {
    #[default]
    Asexual,
    Sexual,
}

impl CellVariant {
    /// Wire label used in status payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Asexual => "Asexual",
            Self::Sexual => "Sexual",
        }
    }

    /// Value of the `type` query parameter accepted by `addCell`.
    pub fn query_value(self) -> &'static str {
        match self {
            Self::Asexual => "asexual",
            Self::Sexual => "sexual",
        }
    }
}

impl Serialize for CellVariant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// Only "Sexual" is distinguished; every other label renders as asexual.
impl<'de> Deserialize<'de> for CellVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "Sexual" {
            Self::Sexual
        } else {
            Self::Asexual
        })
    }
}

/// Post-run analysis returned by the report endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(rename = "aiAnalysis")]
    pub analysis: String,
    #[serde(deserialize_with = "non_negative")]
    pub alive_count: u32,
    /// Asexual reproduction events.
    #[serde(deserialize_with = "non_negative")]
    pub divisions: u32,
    /// Sexual reproduction events (named `generations` on the wire).
    #[serde(deserialize_with = "non_negative")]
    pub generations: u32,
    #[serde(deserialize_with = "non_negative")]
    pub total_cells: u32,
}

impl ReportSummary {
    /// Summary stored when the report could not be fetched.
    pub fn unavailable() -> Self {
        Self {
            analysis: REPORT_UNAVAILABLE.to_string(),
            ..Self::default()
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.analysis == REPORT_UNAVAILABLE
    }
}

fn non_negative<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(raw.clamp(0, i64::from(u32::MAX)) as u32)
}
