//! Topology store: the read-only model every request is answered from
//!
//! ## Topology file format
//!
//! ```json
//! {
//!   "vtag": "1266506139",
//!   "default-pid": "defaultpid",
//!   "pids": { "mypid1": ["10.0.0.0/8"], "mypid2": ["192.168.0.0/16"] },
//!   "costs": { "routingcost": { "mypid1": { "mypid2": 2 } } }
//! }
//! ```
//!
//! `vtag` defaults to the load time in unix seconds. The `default-pid`, when
//! present, owns `0.0.0.0/0` and `::/0`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::cost::CostType;
use crate::cost_map::{CostSource, StaticCostTable};
use crate::endpoint::{AddressFamily, IpPrefix};
use crate::error::TopologyError;
use crate::network_map::NetworkMap;
use crate::pid::Pid;
use crate::Result;

/// On-disk topology description
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TopologyFile {
    #[serde(default)]
    pub vtag: Option<String>,
    #[serde(default)]
    pub default_pid: Option<String>,
    pub pids: BTreeMap<String, Vec<String>>,
    /// cost-type -> src -> dst -> cost
    #[serde(default)]
    pub costs: BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>,
}

/// Network map and cost source, built once and shared read-only
pub struct TopologyStore {
    network_map: NetworkMap,
    costs: Box<dyn CostSource>,
    vtag: String,
}

impl TopologyStore {
    pub fn new(network_map: NetworkMap, costs: impl CostSource + 'static, vtag: String) -> Self {
        Self {
            network_map,
            costs: Box::new(costs),
            vtag,
        }
    }

    /// Load and validate a JSON topology file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            pids = store.network_map.len(),
            vtag = %store.vtag,
            "Loaded topology"
        );
        Ok(store)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: TopologyFile = serde_json::from_str(raw)?;
        Self::from_topology(file)
    }

    pub fn from_topology(file: TopologyFile) -> Result<Self> {
        let mut entries: BTreeMap<Pid, Vec<IpPrefix>> = BTreeMap::new();
        for (name, literals) in &file.pids {
            let mut prefixes = Vec::with_capacity(literals.len());
            for literal in literals {
                let prefix = literal.parse().map_err(|source| TopologyError::Prefix {
                    pid: name.clone(),
                    source,
                })?;
                prefixes.push(prefix);
            }
            entries.insert(Pid::new(name.as_str()), prefixes);
        }

        if let Some(default_pid) = &file.default_pid {
            entries.entry(Pid::new(default_pid.as_str())).or_default().extend([
                IpPrefix::any(AddressFamily::Ipv4),
                IpPrefix::any(AddressFamily::Ipv6),
            ]);
        }

        let network_map = NetworkMap::from_entries(entries)?;

        let mut costs = StaticCostTable::new();
        for (type_name, rows) in &file.costs {
            let cost_type = CostType::parse(type_name)
                .ok_or_else(|| TopologyError::UnknownCostType(type_name.clone()))?;
            costs.declare(cost_type);
            for (src, row) in rows {
                for (dst, cost) in row {
                    costs.insert(cost_type, Pid::new(src.as_str()), Pid::new(dst.as_str()), *cost)?;
                }
            }
        }
        if let Some((cost_type, pid)) = costs
            .referenced_pids()
            .find(|(_, pid)| !network_map.contains_pid(pid.as_str()))
        {
            return Err(TopologyError::UnknownPid {
                cost_type: cost_type.to_string(),
                pid: pid.to_string(),
            });
        }

        let vtag = file.vtag.unwrap_or_else(load_time_vtag);
        Ok(Self::new(network_map, costs, vtag))
    }

    pub fn network_map(&self) -> &NetworkMap {
        &self.network_map
    }

    /// Version tag reported as `map-vtag`
    pub fn vtag(&self) -> &str {
        &self.vtag
    }

    pub fn cost_types(&self) -> Vec<CostType> {
        self.costs.cost_types()
    }

    pub fn supports(&self, cost_type: CostType) -> bool {
        self.costs.supports(cost_type)
    }

    pub fn cost(&self, cost_type: CostType, src: &Pid, dst: &Pid) -> Option<f64> {
        self.costs.cost(cost_type, src, dst)
    }

    /// Raw costs from `src` to each of `dsts`; pairs without a cost are absent
    pub fn row<'a, I>(&self, cost_type: CostType, src: &Pid, dsts: I) -> BTreeMap<Pid, f64>
    where
        I: IntoIterator<Item = &'a Pid>,
    {
        dsts.into_iter()
            .filter_map(|dst| {
                self.costs
                    .cost(cost_type, src, dst)
                    .map(|cost| (dst.clone(), cost))
            })
            .collect()
    }
}

impl fmt::Debug for TopologyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyStore")
            .field("network_map", &self.network_map)
            .field("cost_types", &self.cost_types())
            .field("vtag", &self.vtag)
            .finish()
    }
}

fn load_time_vtag() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}
