//! Pluggable cost source
//!
//! The protocol layer never computes costs itself; it asks a [`CostSource`]
//! for the raw numerical cost between two PIDs. [`StaticCostTable`] is the
//! source used when costs come from the topology file.

use std::collections::BTreeMap;

use crate::cost::CostType;
use crate::error::TopologyError;
use crate::pid::Pid;

/// Supplies raw, non-negative costs between PIDs
pub trait CostSource: Send + Sync {
    /// Cost types this source can answer, in advertisement order
    fn cost_types(&self) -> Vec<CostType>;

    /// Numerical cost from `src` to `dst`, or `None` if the pair has no cost
    fn cost(&self, cost_type: CostType, src: &Pid, dst: &Pid) -> Option<f64>;

    fn supports(&self, cost_type: CostType) -> bool {
        self.cost_types().contains(&cost_type)
    }
}

/// In-memory cost tables, one per cost type
#[derive(Debug, Default, Clone)]
pub struct StaticCostTable {
    tables: BTreeMap<CostType, BTreeMap<Pid, BTreeMap<Pid, f64>>>,
}

impl StaticCostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cost. Negative or non-finite costs are rejected.
    pub fn insert(
        &mut self,
        cost_type: CostType,
        src: Pid,
        dst: Pid,
        cost: f64,
    ) -> Result<(), TopologyError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(TopologyError::InvalidCost {
                cost_type: cost_type.to_string(),
                src: src.to_string(),
                dst: dst.to_string(),
                cost,
            });
        }
        self.tables
            .entry(cost_type)
            .or_default()
            .entry(src)
            .or_default()
            .insert(dst, cost);
        Ok(())
    }

    /// Declare a cost type with no entries yet
    pub fn declare(&mut self, cost_type: CostType) {
        self.tables.entry(cost_type).or_default();
    }

    /// Every PID referenced by any table
    pub fn referenced_pids(&self) -> impl Iterator<Item = (CostType, &Pid)> {
        self.tables.iter().flat_map(|(ty, rows)| {
            rows.iter()
                .flat_map(move |(src, row)| std::iter::once(src).chain(row.keys()))
                .map(move |pid| (*ty, pid))
        })
    }
}

impl CostSource for StaticCostTable {
    fn cost_types(&self) -> Vec<CostType> {
        self.tables.keys().copied().collect()
    }

    fn cost(&self, cost_type: CostType, src: &Pid, dst: &Pid) -> Option<f64> {
        self.tables.get(&cost_type)?.get(src)?.get(dst).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_types() {
        let mut table = StaticCostTable::new();
        table
            .insert(CostType::RoutingCost, "a".into(), "b".into(), 5.0)
            .unwrap();
        table.declare(CostType::HopCount);

        assert_eq!(
            table.cost(CostType::RoutingCost, &"a".into(), &"b".into()),
            Some(5.0)
        );
        assert_eq!(table.cost(CostType::RoutingCost, &"b".into(), &"a".into()), None);
        assert_eq!(table.cost(CostType::HopCount, &"a".into(), &"b".into()), None);
        assert_eq!(
            table.cost_types(),
            vec![CostType::RoutingCost, CostType::HopCount]
        );
        assert!(table.supports(CostType::HopCount));
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        let mut table = StaticCostTable::new();
        assert!(matches!(
            table.insert(CostType::RoutingCost, "a".into(), "b".into(), -1.0),
            Err(TopologyError::InvalidCost { .. })
        ));
        assert!(table
            .insert(CostType::RoutingCost, "a".into(), "b".into(), f64::NAN)
            .is_err());
        assert!(table.cost_types().is_empty());
    }

    #[test]
    fn test_referenced_pids() {
        let mut table = StaticCostTable::new();
        table
            .insert(CostType::RoutingCost, "a".into(), "b".into(), 1.0)
            .unwrap();
        let pids: Vec<&str> = table.referenced_pids().map(|(_, p)| p.as_str()).collect();
        assert_eq!(pids, vec!["a", "b"]);
    }
}
