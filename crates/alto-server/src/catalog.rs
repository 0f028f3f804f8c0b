//! Resource catalog: which (method, path) pairs exist and what they speak

use axum::http::Method;

/// ALTO media types
pub mod media {
    pub const DIRECTORY: &str = "application/alto-directory+json";
    pub const NETWORK_MAP: &str = "application/alto-networkmap+json";
    pub const NETWORK_MAP_FILTER: &str = "application/alto-networkmapfilter+json";
    pub const COST_MAP: &str = "application/alto-costmap+json";
    pub const COST_MAP_FILTER: &str = "application/alto-costmapfilter+json";
    pub const ENDPOINT_PROP: &str = "application/alto-endpointprop+json";
    pub const ENDPOINT_PROP_PARAMS: &str = "application/alto-endpointpropparams+json";
    pub const ENDPOINT_COST: &str = "application/alto-endpointcost+json";
    pub const ENDPOINT_COST_PARAMS: &str = "application/alto-endpointcostparams+json";
    pub const ERROR: &str = "application/alto-error+json";
}

/// A recognized information resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Directory,
    NetworkMap,
    NetworkMapFiltered,
    /// Path segments are validated later, so a bad mode is a 400, not a 404
    CostMap { cost_mode: String, cost_type: String },
    CostMapFiltered,
    EndpointProperty,
    EndpointCost,
}

impl Resource {
    /// Stable label for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Directory => "directory",
            Resource::NetworkMap => "networkmap",
            Resource::NetworkMapFiltered => "networkmap-filtered",
            Resource::CostMap { .. } => "costmap",
            Resource::CostMapFiltered => "costmap-filtered",
            Resource::EndpointProperty => "endpoints-property",
            Resource::EndpointCost => "endpoints-cost",
        }
    }
}

/// What a resolved request expects and produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub resource: Resource,
    /// Body media type for POST resources, `None` for GET
    pub request_media_type: Option<&'static str>,
    pub response_media_type: &'static str,
}

impl ResourceDescriptor {
    fn new(
        resource: Resource,
        request_media_type: Option<&'static str>,
        response_media_type: &'static str,
    ) -> Self {
        Self {
            resource,
            request_media_type,
            response_media_type,
        }
    }

    pub fn takes_body(&self) -> bool {
        self.request_media_type.is_some()
    }
}

/// Map a request line onto a resource. `None` means 404.
pub fn resolve(method: &Method, path: &str) -> Option<ResourceDescriptor> {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    let descriptor = match (method.as_str(), segments.as_slice()) {
        ("GET", ["directory"]) => {
            ResourceDescriptor::new(Resource::Directory, None, media::DIRECTORY)
        }
        ("GET", ["networkmap"]) => {
            ResourceDescriptor::new(Resource::NetworkMap, None, media::NETWORK_MAP)
        }
        ("POST", ["networkmap", "filtered"]) => ResourceDescriptor::new(
            Resource::NetworkMapFiltered,
            Some(media::NETWORK_MAP_FILTER),
            media::NETWORK_MAP,
        ),
        ("POST", ["costmap", "filtered"]) => ResourceDescriptor::new(
            Resource::CostMapFiltered,
            Some(media::COST_MAP_FILTER),
            media::COST_MAP,
        ),
        ("GET", ["costmap", mode, cost_type])
            if !mode.is_empty() && !cost_type.is_empty() =>
        {
            ResourceDescriptor::new(
                Resource::CostMap {
                    cost_mode: (*mode).to_string(),
                    cost_type: (*cost_type).to_string(),
                },
                None,
                media::COST_MAP,
            )
        }
        ("POST", ["endpoints", "property"]) => ResourceDescriptor::new(
            Resource::EndpointProperty,
            Some(media::ENDPOINT_PROP_PARAMS),
            media::ENDPOINT_PROP,
        ),
        ("POST", ["endpoints", "cost"]) => ResourceDescriptor::new(
            Resource::EndpointCost,
            Some(media::ENDPOINT_COST_PARAMS),
            media::ENDPOINT_COST,
        ),
        _ => return None,
    };
    Some(descriptor)
}
