use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::error;
use tracing::info;
use warp::http::Response;
use warp::hyper::Body;
use warp::Filter;
use warp::Rejection;

use crate::metrics::PROBE_REQUESTS;
use crate::probe::probe_position;
use crate::probe::Prober;

use super::poll_document;
use super::AppState;
use super::Reply;

/// Full route table. Unknown paths fall through to a plain 404, never
/// to warp's rejection machinery.
pub fn routes(
    state: Arc<AppState>,
    prober: Arc<Prober>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let poll = {
        let state = state.clone();
        let path = state.config.serve_path.clone();
        warp::get()
            .and(path_is(path))
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::header::optional::<String>("accept-encoding"))
            .and_then(
                move |query: HashMap<String, String>, accept_encoding: Option<String>| {
                    let state = state.clone();
                    async move {
                        Ok::<_, Rejection>(handle_poll(state, query, accept_encoding).await)
                    }
                },
            )
    };

    let hash = {
        let path = state.config.hash_path.clone();
        warp::get()
            .and(path_is(path))
            .and(warp::query::<HashMap<String, String>>())
            .and_then(move |query: HashMap<String, String>| {
                let prober = prober.clone();
                async move { Ok::<_, Rejection>(handle_hash(prober, query).await) }
            })
    };

    let control = {
        let state = state.clone();
        let path = state.config.control_path.clone();
        warp::get()
            .and(path_is(path))
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::addr::remote())
            .and(warp::header::optional::<String>("x-forwarded-for"))
            .and_then(
                move |query: HashMap<String, String>,
                      remote: Option<SocketAddr>,
                      forwarded: Option<String>| {
                    let state = state.clone();
                    async move {
                        Ok::<_, Rejection>(handle_control(state, query, remote, forwarded))
                    }
                },
            )
    };

    let metrics = warp::get()
        .and(path_is("/metrics".to_string()))
        .and_then(crate::metrics::metrics_handler);

    let fallback = warp::any().and_then(|| async { Ok::<_, Rejection>(not_found()) });

    poll.or(hash).or(control).or(metrics).or(fallback)
}

/// Exact-path match; the serve paths are flat strings, not segment
/// trees.
fn path_is(expected: String) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and_then(move |path: warp::path::FullPath| {
            let matched = path.as_str() == expected;
            async move {
                if matched {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one()
}

async fn handle_poll(
    state: Arc<AppState>,
    query: HashMap<String, String>,
    accept_encoding: Option<String>,
) -> Response<Body> {
    // An unparseable version claim means "send me everything".
    let ims = query.get("ims").and_then(|v| v.parse::<u64>().ok());
    let client_id = query.get("unique").filter(|v| !v.is_empty()).cloned();
    let wants_compressed = accepts_gzip(accept_encoding.as_deref());

    let min_client_version = state.config.min_client_version;
    match poll_document(state, ims, client_id, wants_compressed).await {
        Some(reply) => document_response(&reply, min_client_version),
        None => not_found(),
    }
}

fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    accept_encoding.map_or(false, |header| {
        header.split(',').any(|token| {
            token
                .trim()
                .split(';')
                .next()
                .unwrap_or("")
                .eq_ignore_ascii_case("gzip")
        })
    })
}

fn document_response(reply: &Reply, min_client_version: Option<u32>) -> Response<Body> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", "text/json; charset=utf-8")
        .header("Access-Control-Expose-Headers", "X-RGLM, X-RGNV, X-RGMV")
        .header("Vary", "Accept-Encoding")
        .header("X-RGLM", reply.last_modified)
        .header("X-RGNV", reply.num_viewers);
    if let Some(version) = min_client_version {
        builder = builder.header("X-RGMV", version);
    }
    if reply.compressed {
        builder = builder.header("Content-Encoding", "gzip");
    }
    builder
        .body(Body::from(reply.body.clone()))
        .expect("statically valid response headers")
}

async fn handle_hash(prober: Arc<Prober>, query: HashMap<String, String>) -> Response<Body> {
    let Some(fen) = query.get("fen") else {
        PROBE_REQUESTS.with_label_values(&["invalid"]).inc();
        return status_response(400);
    };
    match probe_position(&prober, fen).await {
        Ok(rendered) => {
            PROBE_REQUESTS.with_label_values(&["ok"]).inc();
            Response::builder()
                .status(200)
                .header("Content-Type", "text/json; charset=utf-8")
                .body(Body::from(rendered.to_string()))
                .expect("statically valid response headers")
        }
        Err(e) if e.is_client_error() => {
            PROBE_REQUESTS.with_label_values(&["invalid"]).inc();
            status_response(400)
        }
        Err(e) => {
            error!("hash probe failed: {}", e);
            PROBE_REQUESTS.with_label_values(&["error"]).inc();
            status_response(500)
        }
    }
}

/// Operator-only override of the reported viewer count. Loopback
/// connections only, and a forwarded request is never a loopback
/// request no matter what its socket says.
fn handle_control(
    state: Arc<AppState>,
    query: HashMap<String, String>,
    remote: Option<SocketAddr>,
    forwarded: Option<String>,
) -> Response<Body> {
    let local = remote.map_or(false, |addr| addr.ip().is_loopback());
    if !local || forwarded.is_some() {
        return status_response(403);
    }
    match query.get("count").map(|v| v.parse::<usize>()) {
        Some(Ok(count)) => {
            info!(count, "viewer count override set");
            state.viewers.set_override(Some(count));
            Response::builder()
                .status(200)
                .header("Content-Type", "text/plain; charset=utf-8")
                .body(Body::from("ok"))
                .expect("statically valid response headers")
        }
        _ => status_response(400),
    }
}

fn status_response(status: u16) -> Response<Body> {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .expect("statically valid response headers")
}

fn not_found() -> Response<Body> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Body::from("Something went wrong. Sorry."))
        .expect("statically valid response headers")
}
