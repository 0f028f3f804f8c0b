//! Cost modes, cost types, constraints, and ordinal ranking

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// How cost values are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMode {
    /// Raw non-negative magnitudes
    Numerical,
    /// Per-source rank, 1 = cheapest
    Ordinal,
}

impl CostMode {
    pub const ALL: [CostMode; 2] = [CostMode::Numerical, CostMode::Ordinal];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "numerical" => Some(CostMode::Numerical),
            "ordinal" => Some(CostMode::Ordinal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CostMode::Numerical => "numerical",
            CostMode::Ordinal => "ordinal",
        }
    }
}

impl fmt::Display for CostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric a cost table measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    RoutingCost,
    HopCount,
}

impl CostType {
    pub const ALL: [CostType; 2] = [CostType::RoutingCost, CostType::HopCount];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "routingcost" => Some(CostType::RoutingCost),
            "hopcount" => Some(CostType::HopCount),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CostType::RoutingCost => "routingcost",
            CostType::HopCount => "hopcount",
        }
    }
}

impl fmt::Display for CostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a cost constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
}

impl ConstraintOp {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "lt" => Some(ConstraintOp::Lt),
            "le" => Some(ConstraintOp::Le),
            "eq" => Some(ConstraintOp::Eq),
            "ge" => Some(ConstraintOp::Ge),
            "gt" => Some(ConstraintOp::Gt),
            _ => None,
        }
    }
}

/// A predicate such as `le 5` applied to reported cost values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub op: ConstraintOp,
    pub value: f64,
}

impl Constraint {
    /// Parse `"<op> <number>"`. Returns `None` on anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let op = ConstraintOp::parse(parts.next()?)?;
        let value: f64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || !value.is_finite() {
            return None;
        }
        Some(Self { op, value })
    }

    pub fn matches(&self, cost: f64) -> bool {
        match self.op {
            ConstraintOp::Lt => cost < self.value,
            ConstraintOp::Le => cost <= self.value,
            ConstraintOp::Eq => cost == self.value,
            ConstraintOp::Ge => cost >= self.value,
            ConstraintOp::Gt => cost > self.value,
        }
    }

    /// True when `cost` satisfies every constraint (vacuously for none)
    pub fn all_match(constraints: &[Constraint], cost: f64) -> bool {
        constraints.iter().all(|c| c.matches(cost))
    }
}

/// Rank-transform one source's costs.
///
/// Ranks start at 1 for the lowest cost. Equal costs share a rank and the next
/// distinct cost takes the following rank (dense ranking), so ranks are
/// monotonic in the underlying cost. Tied costs always share one rank, so the
/// result does not depend on key order.
pub fn rank_ordinal<K: Ord + Clone>(costs: &BTreeMap<K, f64>) -> BTreeMap<K, u32> {
    let mut ordered: Vec<(&K, f64)> = costs.iter().map(|(k, c)| (k, *c)).collect();
    ordered.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = BTreeMap::new();
    let mut rank = 0u32;
    let mut previous: Option<f64> = None;
    for (key, cost) in ordered {
        if previous != Some(cost) {
            rank += 1;
            previous = Some(cost);
        }
        ranks.insert(key.clone(), rank);
    }
    ranks
}
