//! Response documents
//!
//! Information resources are wrapped as `{"meta": {}, "data": {...}}`; the
//! directory is `{"meta": {}, "resources": [...]}`.

use std::collections::BTreeMap;

use alto_core::{CostMode, CostType, IpPrefix, Pid};
use serde::Serialize;

/// Empty `meta` object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Meta {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoResource<T> {
    pub meta: Meta,
    pub data: T,
}

impl<T> InfoResource<T> {
    pub fn new(data: T) -> Self {
        Self {
            meta: Meta::default(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryDocument {
    pub meta: Meta,
    pub resources: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DirectoryEntry {
    pub uri: String,
    pub media_types: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Capabilities::is_empty")]
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Capabilities {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cost_modes: Vec<CostMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cost_types: Vec<CostType>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cost_constraints: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prop_types: Vec<&'static str>,
}

impl Capabilities {
    pub fn is_empty(&self) -> bool {
        self.cost_modes.is_empty()
            && self.cost_types.is_empty()
            && !self.cost_constraints
            && self.prop_types.is_empty()
    }
}

/// Prefixes of one PID, split by family
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddressGroup {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ipv4: Vec<IpPrefix>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ipv6: Vec<IpPrefix>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkMapData {
    pub map_vtag: String,
    pub map: BTreeMap<Pid, AddressGroup>,
}

/// A reported cost: raw magnitude or ordinal rank
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CostValue {
    Numerical(f64),
    Ordinal(u32),
}

impl CostValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            CostValue::Numerical(cost) => cost,
            CostValue::Ordinal(rank) => rank as f64,
        }
    }
}

/// Cost map keyed by PID (cost map) or endpoint literal (endpoint cost)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CostMapData<K: Ord> {
    pub cost_mode: CostMode,
    pub cost_type: CostType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_vtag: Option<String>,
    pub map: BTreeMap<K, BTreeMap<K, CostValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EndpointPropData {
    pub map_vtag: String,
    /// endpoint literal as sent -> property name -> value (`null` when unknown)
    pub map: BTreeMap<String, BTreeMap<String, Option<Pid>>>,
}

/// Successful response body, one variant per resource family
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Directory(DirectoryDocument),
    NetworkMap(InfoResource<NetworkMapData>),
    CostMap(InfoResource<CostMapData<Pid>>),
    EndpointProperty(InfoResource<EndpointPropData>),
    EndpointCost(InfoResource<CostMapData<String>>),
}
