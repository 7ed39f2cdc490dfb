use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    CapacityStatus, CapacitySummary, ChainId, NormalizedFacilityRow, RawFacilityRecord, StageKind,
};

/// Which spare capacity decides a chain's bottleneck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckPolicy {
    /// Spare after approved future connections (`standard - planned`).
    #[default]
    Planned,
    /// Spare against currently committed capacity (`standard - received`).
    Received,
    /// The lower of the two.
    Strictest,
}

impl BottleneckPolicy {
    fn spare(self, stage: &StageMeasurement) -> u64 {
        match self {
            BottleneckPolicy::Planned => stage.spare_planned(),
            BottleneckPolicy::Received => stage.spare_received(),
            BottleneckPolicy::Strictest => stage.spare_planned().min(stage.spare_received()),
        }
    }
}

struct StageMeasurement {
    kind: StageKind,
    name: String,
    code: Option<String>,
    standard: u64,
    received: u64,
    planned: u64,
}

impl StageMeasurement {
    fn read(kind: StageKind, record: &RawFacilityRecord) -> Self {
        let f = kind.fields();
        let number = |keys: &[&str]| record.first_of(keys).map(parse_capacity).unwrap_or(0);

        Self {
            kind,
            name: kind.display_name(record),
            code: kind.code(record),
            standard: number(f.standard),
            received: number(f.received),
            planned: number(f.planned),
        }
    }

    /// Transformer and line fields are zero-filled when the chain ends at the substation.
    fn is_emitted(&self) -> bool {
        self.kind == StageKind::Substation || self.standard > 0
    }

    fn spare_received(&self) -> u64 {
        self.standard.saturating_sub(self.received)
    }

    fn spare_planned(&self) -> u64 {
        self.standard.saturating_sub(self.planned)
    }

    fn spare_ratio_pct(&self) -> f64 {
        let ratio = self.spare_received() as f64 / self.standard.max(1) as f64 * 100.0;
        (ratio * 10.0).round() / 10.0
    }
}

/// Turns raw capacity records into per-stage display rows.
///
/// Stateless apart from the configured policy; the same input always yields
/// the same output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityNormalizer {
    policy: BottleneckPolicy,
}

impl CapacityNormalizer {
    pub fn new(policy: BottleneckPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BottleneckPolicy {
        self.policy
    }

    /// Normalizes every record independently; chains never share a bottleneck.
    pub fn normalize(&self, records: &[RawFacilityRecord]) -> Vec<NormalizedFacilityRow> {
        records
            .iter()
            .enumerate()
            .flat_map(|(ordinal, record)| self.normalize_record(ordinal, record))
            .collect()
    }

    /// Rows for one facility chain, in substation, transformer, line order.
    ///
    /// Rules:
    /// - stages without any capacity field are skipped, not zero-filled.
    /// - a transformer or line with zero standard capacity is skipped too.
    /// - spares are floored at zero.
    /// - stages with zero standard capacity do not take part in the bottleneck.
    /// - no applicable stage means a bottleneck of zero.
    pub fn normalize_record(&self, ordinal: usize, record: &RawFacilityRecord) -> Vec<NormalizedFacilityRow> {
        let stages: Vec<StageMeasurement> = StageKind::CHAIN
            .into_iter()
            .filter(|kind| record.has_stage(*kind))
            .map(|kind| StageMeasurement::read(kind, record))
            .filter(StageMeasurement::is_emitted)
            .collect();

        let bottleneck = stages
            .iter()
            .filter(|s| s.standard > 0)
            .map(|s| self.policy.spare(s))
            .min()
            .unwrap_or(0);
        let status = CapacityStatus::from_available(bottleneck);
        let chain_id = ChainId::derive(ordinal, record);

        stages
            .into_iter()
            .map(|s| NormalizedFacilityRow {
                chain_id: chain_id.clone(),
                stage: s.kind,
                spare_received: s.spare_received(),
                spare_planned: s.spare_planned(),
                spare_ratio_pct: s.spare_ratio_pct(),
                standard_capacity: s.standard,
                received_capacity: s.received,
                planned_capacity: s.planned,
                name: s.name,
                code: s.code,
                bottleneck_capacity: bottleneck,
                status,
            })
            .collect()
    }
}

/// Chain-level roll-up of normalized rows.
///
/// Each chain counts once however many stage rows it has; the available
/// capacity is the smallest bottleneck among the chains.
pub fn summarize(rows: &[NormalizedFacilityRow]) -> CapacitySummary {
    let mut chains: BTreeMap<&ChainId, u64> = BTreeMap::new();
    for row in rows {
        chains
            .entry(&row.chain_id)
            .and_modify(|b| *b = (*b).min(row.bottleneck_capacity))
            .or_insert(row.bottleneck_capacity);
    }

    let total = chains.values().copied().min().unwrap_or(0);
    CapacitySummary {
        facility_count: chains.len(),
        total_available_capacity: total,
        overall_status: CapacityStatus::from_available(total),
    }
}

/// Reads a capacity in kW from a JSON number or a display string.
///
/// `"12,345 kW"` and `12345` both give 12345. Negative values give 0,
/// fractions are truncated, anything unreadable is 0.
pub fn parse_capacity(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
                    _ => 0,
                }
            }
        }
        Value::String(s) => parse_capacity_str(s),
        _ => 0,
    }
}

fn parse_capacity_str(raw: &str) -> u64 {
    let s = raw.trim();
    if s.starts_with('-') {
        return 0;
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut integer = String::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '0'..='9' => integer.push(ch),
            ',' => continue,
            // a space only separates digit groups when digits follow it
            ' ' if !integer.is_empty() && chars.peek().is_some_and(char::is_ascii_digit) => continue,
            // stop at the decimal point or the unit suffix
            _ => break,
        }
    }

    integer.parse().unwrap_or(0)
}
