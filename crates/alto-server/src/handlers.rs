//! Resource handlers
//!
//! Each handler is a pure function of a validated request and the topology.
//! Nothing here can fail: every rejection happens in [`crate::request`].

use std::collections::{BTreeMap, BTreeSet};

use alto_core::{
    properties, rank_ordinal, AddressFamily, Constraint, CostMode, CostType, EndpointAddress, Pid,
    TopologyStore,
};

use crate::catalog::media;
use crate::payload::{
    AddressGroup, Capabilities, CostMapData, CostValue, DirectoryDocument, DirectoryEntry,
    EndpointPropData, InfoResource, Meta, NetworkMapData, ResponsePayload,
};
use crate::request::{
    CostMapFilterRequest, EndpointCostRequest, EndpointPropRequest, FilterRequest,
    RequestEnvelope,
};

/// Compute the response for a validated request
pub fn handle(envelope: &RequestEnvelope, store: &TopologyStore) -> ResponsePayload {
    match envelope {
        RequestEnvelope::Directory => ResponsePayload::Directory(directory(store)),
        RequestEnvelope::NetworkMap => ResponsePayload::NetworkMap(network_map(store, None)),
        RequestEnvelope::NetworkMapFilter(filter) => {
            ResponsePayload::NetworkMap(network_map(store, Some(filter)))
        }
        RequestEnvelope::CostMap(request) => ResponsePayload::CostMap(cost_map(store, request)),
        RequestEnvelope::EndpointProperty(request) => {
            ResponsePayload::EndpointProperty(endpoint_property(store, request))
        }
        RequestEnvelope::EndpointCost(request) => {
            ResponsePayload::EndpointCost(endpoint_cost(store, request))
        }
    }
}

/// Information resource directory, built from the catalog and loaded cost types
pub fn directory(store: &TopologyStore) -> DirectoryDocument {
    let cost_types = store.cost_types();
    let cost_capabilities = Capabilities {
        cost_modes: CostMode::ALL.to_vec(),
        cost_types: cost_types.clone(),
        cost_constraints: true,
        prop_types: Vec::new(),
    };

    let mut resources = vec![
        DirectoryEntry {
            uri: "/networkmap".to_string(),
            media_types: vec![media::NETWORK_MAP],
            accepts: None,
            capabilities: Capabilities::default(),
        },
        DirectoryEntry {
            uri: "/networkmap/filtered".to_string(),
            media_types: vec![media::NETWORK_MAP],
            accepts: Some(vec![media::NETWORK_MAP_FILTER]),
            capabilities: Capabilities::default(),
        },
    ];

    for cost_mode in CostMode::ALL {
        for cost_type in &cost_types {
            resources.push(DirectoryEntry {
                uri: format!("/costmap/{}/{}", cost_mode, cost_type),
                media_types: vec![media::COST_MAP],
                accepts: None,
                capabilities: Capabilities {
                    cost_modes: vec![cost_mode],
                    cost_types: vec![*cost_type],
                    ..Capabilities::default()
                },
            });
        }
    }

    resources.extend([
        DirectoryEntry {
            uri: "/costmap/filtered".to_string(),
            media_types: vec![media::COST_MAP],
            accepts: Some(vec![media::COST_MAP_FILTER]),
            capabilities: cost_capabilities.clone(),
        },
        DirectoryEntry {
            uri: "/endpoints/property".to_string(),
            media_types: vec![media::ENDPOINT_PROP],
            accepts: Some(vec![media::ENDPOINT_PROP_PARAMS]),
            capabilities: Capabilities {
                prop_types: properties::SUPPORTED.to_vec(),
                ..Capabilities::default()
            },
        },
        DirectoryEntry {
            uri: "/endpoints/cost".to_string(),
            media_types: vec![media::ENDPOINT_COST],
            accepts: Some(vec![media::ENDPOINT_COST_PARAMS]),
            capabilities: cost_capabilities,
        },
    ]);

    DirectoryDocument {
        meta: Meta::default(),
        resources,
    }
}

/// Full network map, or the PIDs named by `filter` (all of them if empty)
pub fn network_map(
    store: &TopologyStore,
    filter: Option<&FilterRequest>,
) -> InfoResource<NetworkMapData> {
    let selected = |pid: &Pid| match filter {
        Some(filter) if !filter.pids.is_empty() => filter.pids.contains(pid),
        _ => true,
    };

    let map = store
        .network_map()
        .iter()
        .filter(|(pid, _)| selected(*pid))
        .map(|(pid, prefixes)| {
            let (ipv4, ipv6) = prefixes
                .iter()
                .copied()
                .partition(|prefix| prefix.family() == AddressFamily::Ipv4);
            (pid.clone(), AddressGroup { ipv4, ipv6 })
        })
        .collect();

    InfoResource::new(NetworkMapData {
        map_vtag: store.vtag().to_string(),
        map,
    })
}

/// Turn one source's raw costs into reported values and apply constraints
fn report_row<K: Ord + Clone>(
    raw: BTreeMap<K, f64>,
    cost_mode: CostMode,
    constraints: &[Constraint],
) -> BTreeMap<K, CostValue> {
    let values: BTreeMap<K, CostValue> = match cost_mode {
        CostMode::Numerical => raw
            .into_iter()
            .map(|(dst, cost)| (dst, CostValue::Numerical(cost)))
            .collect(),
        CostMode::Ordinal => rank_ordinal(&raw)
            .into_iter()
            .map(|(dst, rank)| (dst, CostValue::Ordinal(rank)))
            .collect(),
    };

    values
        .into_iter()
        .filter(|(_, value)| Constraint::all_match(constraints, value.as_f64()))
        .collect()
}

fn or_every_pid(store: &TopologyStore, requested: &BTreeSet<Pid>) -> Vec<Pid> {
    if requested.is_empty() {
        store.network_map().pids().cloned().collect()
    } else {
        requested.iter().cloned().collect()
    }
}

/// Cost map over `srcs` x `dsts` (every PID when a side is empty).
///
/// Ordinal ranks are computed over the selected destinations before
/// constraints are applied; sources with no surviving pair are omitted.
pub fn cost_map(
    store: &TopologyStore,
    request: &CostMapFilterRequest,
) -> InfoResource<CostMapData<Pid>> {
    let srcs = or_every_pid(store, &request.srcs);
    let dsts = or_every_pid(store, &request.dsts);

    let map = srcs
        .into_iter()
        .filter_map(|src| {
            let raw = store.row(request.cost_type, &src, &dsts);
            let row = report_row(raw, request.cost_mode, &request.constraints);
            (!row.is_empty()).then_some((src, row))
        })
        .collect();

    InfoResource::new(CostMapData {
        cost_mode: request.cost_mode,
        cost_type: request.cost_type,
        map_vtag: Some(store.vtag().to_string()),
        map,
    })
}

/// Owning PID for each endpoint, keyed by the literal the client sent;
/// `null` when no prefix covers it
pub fn endpoint_property(
    store: &TopologyStore,
    request: &EndpointPropRequest,
) -> InfoResource<EndpointPropData> {
    let map = request
        .endpoints
        .iter()
        .map(|(literal, endpoint)| {
            let props = request
                .properties
                .iter()
                .map(|name| {
                    let value = match name.as_str() {
                        properties::PID => store.network_map().lookup_endpoint(endpoint).cloned(),
                        _ => None,
                    };
                    (name.clone(), value)
                })
                .collect();
            (literal.clone(), props)
        })
        .collect();

    InfoResource::new(EndpointPropData {
        map_vtag: store.vtag().to_string(),
        map,
    })
}

fn endpoint_row(
    store: &TopologyStore,
    cost_type: CostType,
    src: &EndpointAddress,
    dsts: &[(&String, &Pid)],
) -> BTreeMap<String, f64> {
    let Some(src_pid) = store.network_map().lookup_endpoint(src) else {
        tracing::debug!(endpoint = %src, "Source endpoint not covered by any PID");
        return BTreeMap::new();
    };
    dsts.iter()
        .filter_map(|(dst, dst_pid)| {
            store
                .cost(cost_type, src_pid, dst_pid)
                .map(|cost| ((*dst).clone(), cost))
        })
        .collect()
}

/// Costs between endpoints via their owning PIDs, keyed by the literals the
/// client sent.
///
/// Endpoints outside every prefix contribute no pairs. Pairs failing a
/// constraint are dropped, never replaced by a placeholder.
pub fn endpoint_cost(
    store: &TopologyStore,
    request: &EndpointCostRequest,
) -> InfoResource<CostMapData<String>> {
    let dsts: Vec<(&String, &Pid)> = request
        .dsts
        .iter()
        .filter_map(|(literal, dst)| {
            let pid = store.network_map().lookup_endpoint(dst);
            if pid.is_none() {
                tracing::debug!(endpoint = %dst, "Destination endpoint not covered by any PID");
            }
            pid.map(|pid| (literal, pid))
        })
        .collect();

    let map = request
        .srcs
        .iter()
        .filter_map(|(literal, src)| {
            let raw = endpoint_row(store, request.cost_type, src, &dsts);
            let row = report_row(raw, request.cost_mode, &request.constraints);
            (!row.is_empty()).then(|| (literal.clone(), row))
        })
        .collect();

    InfoResource::new(CostMapData {
        cost_mode: request.cost_mode,
        cost_type: request.cost_type,
        map_vtag: None,
        map,
    })
}
