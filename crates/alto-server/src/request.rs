//! Request decoding and validation
//!
//! Every body goes through the same fail-fast pipeline, and the first failure
//! wins:
//!
//! 1. parse JSON
//! 2. shape check (required keys present, JSON types correct)
//! 3. enumerated values (`cost-mode`, `cost-type`, `constraints`, `properties`)
//! 4. identifier syntax (typed endpoint addresses)
//! 5. identifier existence (PIDs must be in the network map)
//!
//! Within a step, fields are checked in declaration order: `cost-mode`,
//! `cost-type`, `constraints`, then `pids`/`endpoints` (`srcs` before `dsts`);
//! for property requests `properties` before `endpoints`.

use std::collections::{BTreeMap, BTreeSet};

use alto_core::{
    parse_endpoint, parse_pid, properties, Constraint, CostMode, CostType, EndpointAddress, Pid,
    TopologyStore,
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::{Resource, ResourceDescriptor};

/// A request rejected before reaching a handler (HTTP 400)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} must be {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("Unsupported value for {field}: {value}")]
    UnsupportedValue { field: String, value: String },

    #[error("Invalid identifier in {field}: {value}")]
    InvalidIdentifier { field: String, value: String },

    #[error("Unknown identifier in {field}: {value}")]
    UnknownIdentifier { field: String, value: String },
}

impl ValidationError {
    /// Machine-readable `error-code`
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MalformedJson(_) => "malformed-json",
            ValidationError::MissingField(_) => "missing-field",
            ValidationError::TypeMismatch { .. } => "type-mismatch",
            ValidationError::UnsupportedValue { .. } => "unsupported-value",
            ValidationError::InvalidIdentifier { .. } => "invalid-identifier",
            ValidationError::UnknownIdentifier { .. } => "unknown-identifier",
        }
    }

    /// Offending field, when the error is about one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MalformedJson(_) => None,
            ValidationError::MissingField(field)
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::UnsupportedValue { field, .. }
            | ValidationError::InvalidIdentifier { field, .. }
            | ValidationError::UnknownIdentifier { field, .. } => Some(field),
        }
    }

    /// Offending value, when the error is about one
    pub fn value(&self) -> Option<&str> {
        match self {
            ValidationError::UnsupportedValue { value, .. }
            | ValidationError::InvalidIdentifier { value, .. }
            | ValidationError::UnknownIdentifier { value, .. } => Some(value),
            _ => None,
        }
    }

    fn unsupported(field: &str, value: &str) -> Self {
        ValidationError::UnsupportedValue {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// `/networkmap/filtered` body. An empty set selects every PID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub pids: BTreeSet<Pid>,
}

/// Cost map query, from either `/costmap/{mode}/{type}` or `/costmap/filtered`.
/// Empty `srcs`/`dsts` select every PID.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMapFilterRequest {
    pub cost_mode: CostMode,
    pub cost_type: CostType,
    pub constraints: Vec<Constraint>,
    pub srcs: BTreeSet<Pid>,
    pub dsts: BTreeSet<Pid>,
}

/// Endpoint literal as sent by the client -> parsed address.
/// Responses are keyed by the literal.
pub type EndpointList = BTreeMap<String, EndpointAddress>;

/// `/endpoints/property` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPropRequest {
    pub properties: BTreeSet<String>,
    pub endpoints: EndpointList,
}

/// `/endpoints/cost` body
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCostRequest {
    pub cost_mode: CostMode,
    pub cost_type: CostType,
    pub constraints: Vec<Constraint>,
    pub srcs: EndpointList,
    pub dsts: EndpointList,
}

/// A fully validated request, one variant per resource
#[derive(Debug, Clone, PartialEq)]
pub enum RequestEnvelope {
    Directory,
    NetworkMap,
    NetworkMapFilter(FilterRequest),
    CostMap(CostMapFilterRequest),
    EndpointProperty(EndpointPropRequest),
    EndpointCost(EndpointCostRequest),
}

/// Decode and validate a request for an already-resolved resource
pub fn decode_and_validate(
    descriptor: &ResourceDescriptor,
    body: &[u8],
    store: &TopologyStore,
) -> Result<RequestEnvelope> {
    match &descriptor.resource {
        Resource::Directory => Ok(RequestEnvelope::Directory),
        Resource::NetworkMap => Ok(RequestEnvelope::NetworkMap),
        Resource::CostMap {
            cost_mode,
            cost_type,
        } => {
            let cost_mode = check_cost_mode(cost_mode)?;
            let cost_type = check_cost_type(cost_type, store)?;
            Ok(RequestEnvelope::CostMap(CostMapFilterRequest {
                cost_mode,
                cost_type,
                constraints: Vec::new(),
                srcs: BTreeSet::new(),
                dsts: BTreeSet::new(),
            }))
        }
        Resource::NetworkMapFiltered => {
            network_map_filter(&parse_body(body)?, store).map(RequestEnvelope::NetworkMapFilter)
        }
        Resource::CostMapFiltered => {
            cost_map_filter(&parse_body(body)?, store).map(RequestEnvelope::CostMap)
        }
        Resource::EndpointProperty => {
            endpoint_property(&parse_body(body)?).map(RequestEnvelope::EndpointProperty)
        }
        Resource::EndpointCost => {
            endpoint_cost(&parse_body(body)?, store).map(RequestEnvelope::EndpointCost)
        }
    }
}

// Step 1

fn parse_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| ValidationError::MalformedJson(e.to_string()))
}

// Step 2 helpers

fn root(value: &Value) -> Result<&Map<String, Value>> {
    value.as_object().ok_or_else(|| ValidationError::TypeMismatch {
        field: "(body)".to_string(),
        expected: "an object",
    })
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

fn as_object<'a>(value: &'a Value, field: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| ValidationError::TypeMismatch {
        field: field.to_string(),
        expected: "an object",
    })
}

fn as_str<'a>(value: &'a Value, field: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| ValidationError::TypeMismatch {
        field: field.to_string(),
        expected: "a string",
    })
}

fn as_str_list<'a>(value: &'a Value, field: &str) -> Result<Vec<&'a str>> {
    let mismatch = || ValidationError::TypeMismatch {
        field: field.to_string(),
        expected: "an array of strings",
    };
    value
        .as_array()
        .ok_or_else(mismatch)?
        .iter()
        .map(|item| item.as_str().ok_or_else(mismatch))
        .collect()
}

fn optional_str_list<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<Vec<&'a str>>> {
    obj.get(key).map(|value| as_str_list(value, key)).transpose()
}

/// `{"srcs": [...], "dsts": [...]}` under `key`
fn src_dst_lists<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> Result<(Vec<&'a str>, Vec<&'a str>)> {
    let inner = as_object(required(obj, key, key)?, key)?;
    let srcs_field = format!("{key}.srcs");
    let dsts_field = format!("{key}.dsts");
    let srcs = as_str_list(required(inner, &srcs_field, "srcs")?, &srcs_field)?;
    let dsts = as_str_list(required(inner, &dsts_field, "dsts")?, &dsts_field)?;
    Ok((srcs, dsts))
}

// Step 3 helpers

fn check_cost_mode(value: &str) -> Result<CostMode> {
    CostMode::parse(value).ok_or_else(|| ValidationError::unsupported("cost-mode", value))
}

fn check_cost_type(value: &str, store: &TopologyStore) -> Result<CostType> {
    CostType::parse(value)
        .filter(|ty| store.supports(*ty))
        .ok_or_else(|| ValidationError::unsupported("cost-type", value))
}

fn check_constraints(raw: Option<Vec<&str>>) -> Result<Vec<Constraint>> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|text| {
            Constraint::parse(text).ok_or_else(|| ValidationError::unsupported("constraints", text))
        })
        .collect()
}

// Step 4 helpers

fn parse_endpoints(literals: &[&str], field: &str) -> Result<EndpointList> {
    literals
        .iter()
        .map(|literal| {
            parse_endpoint(literal)
                .map(|addr| ((*literal).to_string(), addr))
                .map_err(|_| ValidationError::InvalidIdentifier {
                    field: field.to_string(),
                    value: (*literal).to_string(),
                })
        })
        .collect()
}

fn parse_pids(names: &[&str]) -> BTreeSet<Pid> {
    names.iter().map(|name| parse_pid(name)).collect()
}

// Step 5 helper

fn ensure_known(store: &TopologyStore, field: &str, pids: &BTreeSet<Pid>) -> Result<()> {
    match pids
        .iter()
        .find(|pid| !store.network_map().contains_pid(pid.as_str()))
    {
        Some(pid) => Err(ValidationError::UnknownIdentifier {
            field: field.to_string(),
            value: pid.to_string(),
        }),
        None => Ok(()),
    }
}

// Per-resource pipelines

fn network_map_filter(body: &Value, store: &TopologyStore) -> Result<FilterRequest> {
    let obj = root(body)?;
    let names = as_str_list(required(obj, "pids", "pids")?, "pids")?;

    let pids = parse_pids(&names);
    ensure_known(store, "pids", &pids)?;
    Ok(FilterRequest { pids })
}

fn cost_map_filter(body: &Value, store: &TopologyStore) -> Result<CostMapFilterRequest> {
    let obj = root(body)?;
    let cost_mode = as_str(required(obj, "cost-mode", "cost-mode")?, "cost-mode")?;
    let cost_type = as_str(required(obj, "cost-type", "cost-type")?, "cost-type")?;
    let constraints = optional_str_list(obj, "constraints")?;
    let (srcs, dsts) = src_dst_lists(obj, "pids")?;

    let cost_mode = check_cost_mode(cost_mode)?;
    let cost_type = check_cost_type(cost_type, store)?;
    let constraints = check_constraints(constraints)?;

    let srcs = parse_pids(&srcs);
    let dsts = parse_pids(&dsts);

    ensure_known(store, "pids.srcs", &srcs)?;
    ensure_known(store, "pids.dsts", &dsts)?;

    Ok(CostMapFilterRequest {
        cost_mode,
        cost_type,
        constraints,
        srcs,
        dsts,
    })
}

fn endpoint_property(body: &Value) -> Result<EndpointPropRequest> {
    let obj = root(body)?;
    let names = as_str_list(required(obj, "properties", "properties")?, "properties")?;
    let literals = as_str_list(required(obj, "endpoints", "endpoints")?, "endpoints")?;

    if let Some(name) = names.iter().find(|name| !properties::SUPPORTED.contains(*name)) {
        return Err(ValidationError::unsupported("properties", name));
    }

    let endpoints = parse_endpoints(&literals, "endpoints")?;

    Ok(EndpointPropRequest {
        properties: names.into_iter().map(str::to_string).collect(),
        endpoints,
    })
}

fn endpoint_cost(body: &Value, store: &TopologyStore) -> Result<EndpointCostRequest> {
    let obj = root(body)?;
    let cost_mode = as_str(required(obj, "cost-mode", "cost-mode")?, "cost-mode")?;
    let cost_type = as_str(required(obj, "cost-type", "cost-type")?, "cost-type")?;
    let constraints = optional_str_list(obj, "constraints")?;
    let (srcs, dsts) = src_dst_lists(obj, "endpoints")?;

    let cost_mode = check_cost_mode(cost_mode)?;
    let cost_type = check_cost_type(cost_type, store)?;
    let constraints = check_constraints(constraints)?;

    let srcs = parse_endpoints(&srcs, "endpoints.srcs")?;
    let dsts = parse_endpoints(&dsts, "endpoints.dsts")?;

    Ok(EndpointCostRequest {
        cost_mode,
        cost_type,
        constraints,
        srcs,
        dsts,
    })
}
