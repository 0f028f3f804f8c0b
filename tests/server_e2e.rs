//! End-to-end tests: a real server on an ephemeral port, driven over HTTP
//!
//! Replays the ALTO interop scenarios (IRD, EPS, ECS, MAPS, FILTER and
//! JSON-ERROR cases) against the demo topology.

use alto_portal::{ServerBuilder, ServerConfig, TopologyStore};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const DIRECTORY: &str = "application/alto-directory+json";
const NETWORK_MAP: &str = "application/alto-networkmap+json";
const COST_MAP: &str = "application/alto-costmap+json";
const ENDPOINT_PROP: &str = "application/alto-endpointprop+json";
const ENDPOINT_COST: &str = "application/alto-endpointcost+json";
const ERROR: &str = "application/alto-error+json";

struct TestServer {
    base: String,
    client: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let topology = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/topology.json");
        let store = TopologyStore::from_file(topology).unwrap();
        let server = ServerBuilder::new(ServerConfig::default())
            .store(store)
            .build()
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.serve(listener, async {
            let _ = rx.await;
        }));

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            _shutdown: tx,
        }
    }

    async fn get(&self, path: &str, accept: &str) -> (StatusCode, String, Value) {
        let response = self
            .client
            .get(format!("{}{path}", self.base))
            .header(ACCEPT, accept)
            .send()
            .await
            .unwrap();
        Self::read(response).await
    }

    async fn post(
        &self,
        path: &str,
        content_type: &str,
        accept: &str,
        body: &str,
    ) -> (StatusCode, String, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, accept)
            .body(body.to_string())
            .send()
            .await
            .unwrap();
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> (StatusCode, String, Value) {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = response.bytes().await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, content_type, json)
    }
}

fn pid_of(json: &Value, endpoint: &str) -> Value {
    json["data"]["map"][endpoint]["pid"].clone()
}

fn assert_error(
    (status, content_type, json): (StatusCode, String, Value),
    code: &str,
    field: Option<&str>,
) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "{json}");
    assert_eq!(content_type, ERROR);
    assert_eq!(json["error-code"], code);
    assert!(json["detail"].is_string());
    if let Some(field) = field {
        assert_eq!(json["field"], field);
    }
}

#[tokio::test]
async fn test_ird_1_directory() {
    let server = TestServer::start().await;
    let (status, content_type, json) = server
        .get("/directory", "application/alto-directory+json, application/alto-error+json")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, DIRECTORY);

    let uris: Vec<&str> = json["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["uri"].as_str().unwrap())
        .collect();
    assert!(uris.contains(&"/networkmap"));
    assert!(uris.contains(&"/costmap/numerical/routingcost"));
    assert!(uris.contains(&"/endpoints/property"));
}

#[tokio::test]
async fn test_eps_endpoint_properties() {
    let server = TestServer::start().await;
    let eps = |endpoints: Value| {
        json!({"properties": ["pid"], "endpoints": endpoints}).to_string()
    };

    // EPS-1
    let (status, content_type, json) = server
        .post(
            "/endpoints/property",
            "application/alto-endpointpropparams+json",
            ENDPOINT_PROP,
            &eps(json!(["ipv4:192.168.1.23"])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, ENDPOINT_PROP);
    assert_eq!(pid_of(&json, "ipv4:192.168.1.23"), "mypid2");
    assert_eq!(json["data"]["map-vtag"], "1266506139");

    // EPS-2: the /24 inside mypid2's /16 wins
    let (_, _, json) = server
        .post(
            "/endpoints/property",
            "application/alto-endpointpropparams+json",
            ENDPOINT_PROP,
            &eps(json!(["ipv4:192.168.10.23"])),
        )
        .await;
    assert_eq!(pid_of(&json, "ipv4:192.168.10.23"), "mypid3");

    // EPS-3: only the default PID covers it
    let (_, _, json) = server
        .post(
            "/endpoints/property",
            "application/alto-endpointpropparams+json",
            ENDPOINT_PROP,
            &eps(json!(["ipv4:201.1.13.12"])),
        )
        .await;
    assert_eq!(pid_of(&json, "ipv4:201.1.13.12"), "defaultpid");

    // EPS-4: mixed families
    let (status, _, json) = server
        .post(
            "/endpoints/property",
            "application/alto-endpointpropparams+json",
            ENDPOINT_PROP,
            &eps(json!(["ipv6:1234::192.168.1.23", "ipv4:132.0.10.12"])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pid_of(&json, "ipv4:132.0.10.12"), "transitpid2");
    assert_eq!(pid_of(&json, "ipv6:1234::192.168.1.23"), "defaultpid");
}

const ECS_SRCS: [&str; 3] = ["ipv4:10.0.0.0", "ipv4:192.168.11.0", "ipv4:192.168.10.0"];
const ECS_DSTS: [&str; 9] = [
    "ipv4:10.0.0.0",
    "ipv4:15.0.0.0",
    "ipv4:192.168.11.0",
    "ipv4:192.168.10.0",
    "ipv4:128.0.0.0",
    "ipv4:130.0.0.0",
    "ipv4:0.0.0.0",
    "ipv4:132.0.0.0",
    "ipv4:135.0.0.0",
];

#[tokio::test]
async fn test_ecs_endpoint_costs() {
    let server = TestServer::start().await;
    let accept = "application/alto-endpointcost+json, application/alto-error+json";
    let params = "application/alto-endpointcostparams+json";

    // ECS-1
    let body = json!({
        "cost-mode": "numerical",
        "cost-type": "routingcost",
        "endpoints": {"srcs": ECS_SRCS, "dsts": ECS_DSTS}
    });
    let (status, content_type, json) = server
        .post("/endpoints/cost", params, accept, &body.to_string())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, ENDPOINT_COST);
    assert_eq!(json["data"]["cost-mode"], "numerical");
    assert_eq!(json["data"]["map"]["ipv4:10.0.0.0"]["ipv4:192.168.11.0"], 5.0);
    assert_eq!(json["data"]["map"]["ipv4:192.168.10.0"]["ipv4:135.0.0.0"], 4.0);
    let full = json["data"]["map"]["ipv4:10.0.0.0"].as_object().unwrap().len();
    assert_eq!(full, ECS_DSTS.len());

    // ECS-2: ordinal, mixed families, keys echo the literals as sent
    let body = json!({
        "cost-mode": "ordinal",
        "cost-type": "routingcost",
        "endpoints": {
            "srcs": ["ipv6:2001:DB8::ABCD:6789", "ipv4:192.168.10.1"],
            "dsts": ["ipv6:2001:DB8::2345:5678", "ipv4:135.0.29.1", "ipv4:192.168.10.23"]
        }
    });
    let (status, _, json) = server
        .post("/endpoints/cost", params, accept, &body.to_string())
        .await;
    assert_eq!(status, StatusCode::OK);
    let row = &json["data"]["map"]["ipv6:2001:DB8::ABCD:6789"];
    assert_eq!(row["ipv6:2001:DB8::2345:5678"], 1);
    assert_eq!(row["ipv4:192.168.10.23"], 1);
    assert_eq!(row["ipv4:135.0.29.1"], 2);

    // ECS-3: constraints keep only 4 <= cost <= 5
    let body = json!({
        "constraints": ["le 5", "ge 4"],
        "cost-mode": "numerical",
        "cost-type": "routingcost",
        "endpoints": {"srcs": ECS_SRCS, "dsts": ECS_DSTS}
    });
    let (status, _, json) = server
        .post("/endpoints/cost", params, accept, &body.to_string())
        .await;
    assert_eq!(status, StatusCode::OK);
    for row in json["data"]["map"].as_object().unwrap().values() {
        for cost in row.as_object().unwrap().values() {
            let cost = cost.as_f64().unwrap();
            assert!((4.0..=5.0).contains(&cost), "{cost} outside constraints");
        }
    }
    assert_eq!(json["data"]["map"]["ipv4:10.0.0.0"]["ipv4:128.0.0.0"], 5.0);
}

#[tokio::test]
async fn test_maps_full_resources() {
    let server = TestServer::start().await;

    // MAPS-1
    let (status, content_type, json) = server
        .get("/networkmap", "application/alto-networkmap+json, application/alto-error+json")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, NETWORK_MAP);
    assert_eq!(json["meta"], json!({}));
    assert_eq!(
        json["data"]["map"]["mypid1"]["ipv4"],
        json!(["10.0.0.0/8", "15.0.0.0/8"])
    );
    assert_eq!(json["data"]["map"]["mypid3"]["ipv6"], json!(["2001:db8::/32"]));
    assert_eq!(json["data"]["map"]["defaultpid"]["ipv4"], json!(["0.0.0.0/0"]));

    // MAPS-2
    let (status, content_type, json) = server
        .get(
            "/costmap/numerical/routingcost",
            "application/alto-costmap+json, application/alto-error+json",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, COST_MAP);
    assert_eq!(json["data"]["cost-type"], "routingcost");
    assert_eq!(json["data"]["map"]["mypid1"]["mypid2"], 5.0);
    assert_eq!(json["data"]["map"].as_object().unwrap().len(), 6);

    // MAPS-3
    let (status, _, json) = server
        .get(
            "/costmap/ordinal/routingcost",
            "application/alto-costmap+json, application/alto-error+json",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let row = &json["data"]["map"]["mypid1"];
    assert_eq!(row["mypid1"], 1);
    assert_eq!(row["mypid2"], 2);
    assert_eq!(row["peeringpid1"], 2);
    assert_eq!(row["transitpid2"], 3);
}

#[tokio::test]
async fn test_filter_resources() {
    let server = TestServer::start().await;

    // FILTER-1
    let (status, content_type, json) = server
        .post(
            "/networkmap/filtered",
            "application/alto-networkmapfilter+json",
            "application/alto-networkmap+json, application/alto-error+json",
            r#"{"pids": ["mypid2"]}"#,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, NETWORK_MAP);
    assert_eq!(
        json["data"]["map"],
        json!({"mypid2": {"ipv4": ["192.168.0.0/16"]}})
    );

    // FILTER-2
    let (status, content_type, json) = server
        .post(
            "/costmap/filtered",
            "application/alto-costmapfilter+json",
            "application/alto-costmap+json, application/alto-error+json",
            r#"{"cost-mode" : "numerical","cost-type" : "routingcost","pids" : {"srcs" : [ "mypid1", "mypid3" ],"dsts" : [ "mypid2", "peeringpid1", "transitpid2" ]}}"#,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, COST_MAP);
    assert_eq!(
        json["data"]["map"],
        json!({
            "mypid1": {"mypid2": 5.0, "peeringpid1": 5.0, "transitpid2": 7.0},
            "mypid3": {"mypid2": 15.0, "peeringpid1": 8.0, "transitpid2": 4.0}
        })
    );
}

#[tokio::test]
async fn test_json_error_cases() {
    let server = TestServer::start().await;
    let ecs = "application/alto-endpointcostparams+json";
    let ecs_accept = "application/alto-endpointcost+json, application/alto-error+json";
    let cmf = "application/alto-costmapfilter+json";

    // JSON-ERROR-1: truncated body
    let truncated = r#"{
        "cost-mode" : "numberical",
        "cost-type" : "routingcost",
        "endpoints" : {
            "srcs": [ "ipv4:10.0.0.0" ],
            "dsts": [ "ipv4:10.0.0.0" ]
        }"#;
    assert_error(
        server.post("/endpoints/cost", ecs, ecs_accept, truncated).await,
        "malformed-json",
        None,
    );

    // JSON-ERROR-2: dsts missing
    let body = json!({"cost-mode": "numerical", "cost-type": "routingcost",
                      "endpoints": {"srcs": ["ipv4:192.168.10.1"]}});
    assert_error(
        server.post("/endpoints/cost", ecs, ecs_accept, &body.to_string()).await,
        "missing-field",
        Some("endpoints.dsts"),
    );

    // JSON-ERROR-3: srcs is a string
    let body = json!({"cost-mode": "numerical", "cost-type": "routingcost",
                      "endpoints": {"srcs": "ipv4:10.0.0.0", "dsts": ["ipv4:10.0.0.0"]}});
    assert_error(
        server.post("/endpoints/cost", ecs, ecs_accept, &body.to_string()).await,
        "type-mismatch",
        Some("endpoints.srcs"),
    );

    // JSON-ERROR-4: bad cost-mode
    let body = json!({"cost-mode": "foo", "cost-type": "routingcost",
                      "pids": {"srcs": [], "dsts": []}});
    assert_error(
        server.post("/costmap/filtered", cmf, COST_MAP, &body.to_string()).await,
        "unsupported-value",
        Some("cost-mode"),
    );

    // JSON-ERROR-5: bad cost-type
    let body = json!({"cost-mode": "numerical", "cost-type": "foo",
                      "pids": {"srcs": [], "dsts": []}});
    assert_error(
        server.post("/costmap/filtered", cmf, COST_MAP, &body.to_string()).await,
        "unsupported-value",
        Some("cost-type"),
    );

    // JSON-ERROR-6: unknown property
    let body = json!({"endpoints": ["ipv4:10.0.0.1"], "properties": ["foo"]});
    assert_error(
        server
            .post(
                "/endpoints/property",
                "application/alto-endpointpropparams+json",
                ENDPOINT_PROP,
                &body.to_string(),
            )
            .await,
        "unsupported-value",
        Some("properties"),
    );

    // JSON-ERROR-7: both bad, cost-mode reported first
    let body = json!({"cost-mode": "bar", "cost-type": "foo",
                      "pids": {"srcs": [], "dsts": []}});
    let response = server.post("/costmap/filtered", cmf, COST_MAP, &body.to_string()).await;
    assert_eq!(response.2["value"], "bar");
    assert_error(response, "unsupported-value", Some("cost-mode"));
}

#[tokio::test]
async fn test_unknown_pid_and_unknown_path() {
    let server = TestServer::start().await;

    let (status, content_type, json) = server
        .post(
            "/networkmap/filtered",
            "application/alto-networkmapfilter+json",
            NETWORK_MAP,
            r#"{"pids": ["mypid2", "asldkj"]}"#,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type, ERROR);
    assert_eq!(json["error-code"], "unknown-identifier");
    assert_eq!(json["value"], "asldkj");

    let (status, content_type, json) = server.get("/foo/foo", "*/*").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type, ERROR);
    assert_eq!(json["error-code"], "not-found");
}

#[tokio::test]
async fn test_not_acceptable() {
    let server = TestServer::start().await;
    let (status, content_type, json) = server.get("/networkmap", "text/html").await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(content_type, ERROR);
    assert_eq!(json["error-code"], "not-acceptable");
}

#[tokio::test]
async fn test_concurrent_requests_are_isolated() {
    let server = TestServer::start().await;
    let (good, bad) = tokio::join!(
        server.post(
            "/endpoints/property",
            "application/alto-endpointpropparams+json",
            ENDPOINT_PROP,
            r#"{"properties": ["pid"], "endpoints": ["ipv4:10.1.2.3"]}"#,
        ),
        server.post(
            "/endpoints/property",
            "application/alto-endpointpropparams+json",
            ENDPOINT_PROP,
            r#"{"properties": ["pid"], "endpoints": ["ipv4:10.1.2"#,
        ),
    );
    assert_eq!(good.0, StatusCode::OK);
    assert_eq!(pid_of(&good.2, "ipv4:10.1.2.3"), "mypid1");
    assert_error(bad, "malformed-json", None);
}
