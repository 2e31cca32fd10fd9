//! HTTP forwarding adapter.
//!
//! # Responsibilities
//! - Bind a backend to its parsed target URI at construction
//! - Rewrite inbound requests onto the target (scheme, authority, path, query)
//! - Strip hop-by-hop headers in both directions, append `X-Forwarded-For`
//! - Keep `TE: trailers` on requests, the only TE value meaningful end to end
//! - Stream the upstream response back unchanged otherwise
//!
//! # Design Decisions
//! - One pooled hyper client shared by every backend
//! - Only plain `http` targets; TLS to upstreams is not supported
//! - Upstream deadline covers the wait for response headers

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::config::{BackendConfig, TimeoutConfig};
use crate::load_balancer::backend::{Backend, ForwardFuture, Liveness};
use crate::load_balancer::error::{BuildError, ForwardError};

/// Pooled client shared by all HTTP backends and the health monitor.
pub type UpstreamClient = Client<HttpConnector, Body>;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Build the upstream client with the configured connect timeout.
pub fn build_client(timeouts: &TimeoutConfig) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    Client::builder(TokioExecutor::new()).build(connector)
}

/// Parsed destination of a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    authority: Authority,
    path: String,
    query: Option<String>,
}

impl Target {
    fn parse(address: &str) -> Result<Self, BuildError> {
        let url = Url::parse(address).map_err(|source| BuildError::InvalidAddress {
            address: address.to_string(),
            source,
        })?;

        if url.scheme() != "http" {
            return Err(BuildError::UnsupportedScheme {
                address: address.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| BuildError::MissingHost(address.to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)
            .map_err(|_| BuildError::MissingHost(address.to_string()))?;

        Ok(Self {
            authority,
            path: url.path().to_string(),
            query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    /// Map an inbound URI onto this target.
    fn rewrite(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_path(&self.path, uri.path());
        let path_and_query = match merge_query(self.query.as_deref(), uri.query()) {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

/// Health check URI for a backend address: `path` joined onto the target
/// path, target and path queries merged.
pub fn health_uri(address: &str, path: &str) -> Result<Uri, BuildError> {
    let target = Target::parse(address)?;
    let invalid = || BuildError::InvalidHealthPath(path.to_string());
    let path: Uri = path.parse().map_err(|_| invalid())?;
    target.rewrite(&path).map_err(|_| invalid())
}

fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn merge_query(base: Option<&str>, request: Option<&str>) -> Option<String> {
    match (base, request.filter(|q| !q.is_empty())) {
        (Some(base), Some(request)) => Some(format!("{}&{}", base, request)),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn accepts_trailers(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::TE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("trailers"))
}

/// A backend reached over plain HTTP.
#[derive(Debug)]
pub struct HttpBackend {
    address: String,
    name: Option<String>,
    target: Target,
    preserve_host: bool,
    liveness: Liveness,
    client: UpstreamClient,
    timeout: Duration,
}

impl HttpBackend {
    /// Parse the configured address and bind the backend to it.
    pub fn new(
        config: &BackendConfig,
        client: UpstreamClient,
        timeout: Duration,
    ) -> Result<Self, BuildError> {
        let target = Target::parse(&config.address)?;
        Ok(Self {
            address: config.address.clone(),
            name: config.name.clone(),
            target,
            preserve_host: config.preserve_host,
            liveness: Liveness::new(),
            client,
            timeout,
        })
    }

    /// Rewrite an inbound request into the request sent upstream.
    fn upstream_request(&self, request: Request<Body>) -> Result<Request<Body>, ForwardError> {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let (mut parts, body) = request.into_parts();

        parts.uri = self.target.rewrite(&parts.uri)?;
        parts.version = Version::HTTP_11;
        let trailers = accepts_trailers(&parts.headers);
        strip_hop_by_hop(&mut parts.headers);
        if trailers {
            parts
                .headers
                .insert(header::TE, HeaderValue::from_static("trailers"));
        }

        if !(self.preserve_host && parts.headers.contains_key(header::HOST)) {
            let host = HeaderValue::from_str(self.target.authority.as_str())
                .map_err(axum::http::Error::from)?;
            parts.headers.insert(header::HOST, host);
        }

        if let Some(ip) = client_ip {
            let prior: Vec<&str> = parts
                .headers
                .get_all(&X_FORWARDED_FOR)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            let chain = if prior.is_empty() {
                ip.to_string()
            } else {
                format!("{}, {}", prior.join(", "), ip)
            };
            let chain = HeaderValue::from_str(&chain).map_err(axum::http::Error::from)?;
            parts.headers.insert(X_FORWARDED_FOR, chain);
        }

        Ok(Request::from_parts(parts, body))
    }
}

impl Backend for HttpBackend {
    fn address(&self) -> &str {
        &self.address
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    fn forward(&self, request: Request<Body>) -> ForwardFuture<'_> {
        Box::pin(async move {
            let request = self.upstream_request(request)?;
            let response: Response<Incoming> =
                tokio::time::timeout(self.timeout, self.client.request(request))
                    .await
                    .map_err(|_| ForwardError::Timeout(self.timeout))??;

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}
