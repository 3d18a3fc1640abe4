use autometrics::prometheus_exporter::{self, PrometheusResponse};
use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, register_histogram_vec, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry,
};
use tokio::sync::watch;
use warp::{Filter, Rejection, Reply};

lazy_static! {
    pub static ref ACTIVE_ENGINES_METRIC: IntGauge = IntGauge::new(
        "active_engines_metric",
        "Number of engines currently registered on this node"
    )
    .expect("metric can not be created");

    pub static ref ENGINES_CREATED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("engines_created", "engines_created"),
        &["kind"]
    )
    .expect("Should succeed to create metric");

    pub static ref ENGINES_DESTROYED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("engines_destroyed", "engines_destroyed"),
        &["reason"]
    )
    .expect("Should succeed to create metric");

    pub static ref ENGINE_BUSY_REJECTIONS_METRIC: IntCounter = IntCounter::new(
        "engine_busy_rejections",
        "Calls rejected because the engine was already in use"
    )
    .expect("metric can not be created");

    pub static ref ENGINE_STEP_DURATION_METRIC: HistogramVec = register_histogram_vec!(
        "engine_step_duration_metric",
        "Histogram of engine step duration in ms",
        &["kind"],
        exponential_buckets(1.0, 2.0, 12).unwrap()
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(ACTIVE_ENGINES_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ENGINES_CREATED_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ENGINES_DESTROYED_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ENGINE_BUSY_REJECTIONS_METRIC.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ENGINE_STEP_DURATION_METRIC.clone()))
        .expect("collector can be registered");
}

pub async fn start_server(port: u16, mut shutdown_signal: watch::Receiver<()>) {
    register_custom_metrics(&REGISTRY);

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    server.await;
}

async fn metrics_handler(registry: Registry) -> Result<impl Reply, Rejection> {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        eprintln!("could not encode custom metrics: {}", e);
    };
    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    let autometrics_metrics = get_metrics_body();
    res.push_str(&autometrics_metrics);
    Ok(res)
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    let autometrics_response = prometheus_exporter::encode_http_response();
    autometrics_response.into_body()
}
/// Export metrics for Prometheus to scrape
pub fn get_metrics() -> PrometheusResponse {
    prometheus_exporter::encode_http_response()
}
