use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;
use warp::Rejection;
use warp::Reply;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref POLL_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("poll_requests_total", "Long-poll requests by outcome"),
        &["outcome"]
    )
    .expect("metric can be created");
    pub static ref PARKED_CLIENTS: IntGauge = IntGauge::new(
        "parked_clients",
        "Long-poll requests currently waiting for new data"
    )
    .expect("metric can be created");
    pub static ref DOCUMENT_PUBLISHES: IntCounter = IntCounter::new(
        "document_publishes_total",
        "Successful document generations published"
    )
    .expect("metric can be created");
    pub static ref PROBE_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("probe_requests_total", "Hash-probe requests by outcome"),
        &["outcome"]
    )
    .expect("metric can be created");
}

pub fn register_custom_metrics() {
    REGISTRY
        .register(Box::new(POLL_REQUESTS.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PARKED_CLIENTS.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(DOCUMENT_PUBLISHES.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PROBE_REQUESTS.clone()))
        .expect("collector can be registered");
}

pub async fn metrics_handler() -> Result<impl Reply, Rejection> {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {:?}", e);
    };
    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("could not encode prometheus metrics: {:?}", e);
    };
    let res_custom = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("prometheus metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    res.push_str(&res_custom);

    Ok(res)
}
