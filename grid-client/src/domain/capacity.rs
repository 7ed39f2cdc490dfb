use serde::{Deserialize, Serialize};

use super::facility::{RawFacilityRecord, StageKind};

/// Identity of one facility chain within a lookup.
///
/// Derived from the record's position and its stage identities, so two
/// records of the same response never share an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
    pub fn derive(ordinal: usize, record: &RawFacilityRecord) -> Self {
        let mut h = blake3::Hasher::new();
        h.update(&(ordinal as u64).to_le_bytes());
        for stage in StageKind::CHAIN {
            hash_opt_str(&mut h, record.text(stage.fields().name).as_deref());
            hash_opt_str(&mut h, stage.code(record).as_deref());
        }
        let hex = h.finalize().to_hex();
        Self(hex.as_str()[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn hash_opt_str(hasher: &mut blake3::Hasher, s: Option<&str>) {
    match s {
        Some(v) => {
            hasher.update(&[1]);
            hasher.update(&(v.len() as u32).to_le_bytes());
            hasher.update(v.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityStatus {
    Normal,
    Saturated,
}

impl CapacityStatus {
    pub fn from_available(capacity_kw: u64) -> Self {
        if capacity_kw > 0 {
            CapacityStatus::Normal
        } else {
            CapacityStatus::Saturated
        }
    }
}

impl std::fmt::Display for CapacityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityStatus::Normal => f.write_str("normal"),
            CapacityStatus::Saturated => f.write_str("saturated"),
        }
    }
}

/// One grid stage of a facility chain, ready for display. Capacities in kW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFacilityRow {
    pub chain_id: ChainId,
    pub stage: StageKind,
    pub name: String,
    pub code: Option<String>,
    pub standard_capacity: u64,
    pub received_capacity: u64,
    pub planned_capacity: u64,
    pub spare_received: u64,
    pub spare_planned: u64,
    pub spare_ratio_pct: f64,
    /// Chain-level: identical on every row of the same chain.
    pub bottleneck_capacity: u64,
    pub status: CapacityStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySummary {
    pub facility_count: usize,
    pub total_available_capacity: u64,
    pub overall_status: CapacityStatus,
}

impl Default for CapacitySummary {
    fn default() -> Self {
        Self {
            facility_count: 0,
            total_available_capacity: 0,
            overall_status: CapacityStatus::Saturated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chain_id_is_deterministic_and_position_sensitive() {
        let r = RawFacilityRecord::from_value(json!({ "SUBST_NM": "전주", "DL_NM": "이서" })).unwrap();
        assert_eq!(ChainId::derive(0, &r), ChainId::derive(0, &r));
        assert_ne!(ChainId::derive(0, &r), ChainId::derive(1, &r));
        assert_eq!(ChainId::derive(0, &r).as_str().len(), 16);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(CapacityStatus::Saturated).unwrap(), json!("saturated"));
        assert_eq!(CapacityStatus::from_available(1), CapacityStatus::Normal);
        assert_eq!(CapacityStatus::from_available(0), CapacityStatus::Saturated);
    }
}
