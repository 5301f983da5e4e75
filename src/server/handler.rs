// src/server/handler.rs
use super::error::ApiError;
use crate::dashboard::Dashboard;
use crate::metrics::MetricsCollector;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;
use tracing::{debug, error};

pub const STATUS_PATH: &str = "/api/check-status";
pub const DASHBOARD_PATH: &str = "/";
pub const REFRESH_PATH: &str = "/refresh";
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Clone)]
pub struct RequestHandler {
    dashboard: Arc<Dashboard>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RequestHandler {
    pub fn new(dashboard: Arc<Dashboard>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self { dashboard, metrics }
    }

    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let method = req.method().clone();
        let route = route_label(req.uri().path());

        let response = match route_request(&self.dashboard, req).await {
            Ok(response) => response,
            Err(e) => {
                if e.status().is_server_error() {
                    error!(%method, route, "request failed: {}", e);
                }
                e.into()
            }
        };

        debug!(%method, route, status = response.status().as_u16(), "request served");
        if let Some(metrics) = &self.metrics {
            metrics.record_http_request(route, response.status().as_u16());
        }
        response
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

async fn route_request(
    dashboard: &Arc<Dashboard>,
    req: Request<Body>,
) -> Result<Response<Body>, ApiError> {
    match req.uri().path() {
        STATUS_PATH => {
            require_method(&req, Method::GET)?;
            let snapshot = dashboard
                .aggregator()
                .check_all(dashboard.groups())
                .await?;
            json(StatusCode::OK, &snapshot)
        }
        DASHBOARD_PATH => {
            require_method(&req, Method::GET)?;
            let mut response = Response::new(Body::from(dashboard.page()));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            response
                .headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok(response)
        }
        REFRESH_PATH => {
            require_method(&req, Method::POST)?;
            dashboard.trigger();
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::SEE_OTHER;
            response
                .headers_mut()
                .insert(LOCATION, HeaderValue::from_static(DASHBOARD_PATH));
            Ok(response)
        }
        HEALTH_PATH => {
            require_method(&req, Method::GET)?;
            Ok(Response::new(Body::from("ok")))
        }
        _ => Err(ApiError::NotFound),
    }
}

fn require_method(req: &Request<Body>, allowed: Method) -> Result<(), ApiError> {
    if req.method() == allowed {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed(allowed))
    }
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, ApiError> {
    let body = serde_json::to_vec(value)?;
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

/// Bounded label set for request metrics.
fn route_label(path: &str) -> &'static str {
    match path {
        STATUS_PATH => STATUS_PATH,
        DASHBOARD_PATH => DASHBOARD_PATH,
        REFRESH_PATH => REFRESH_PATH,
        HEALTH_PATH => HEALTH_PATH,
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_is_bounded() {
        assert_eq!(route_label("/api/check-status"), STATUS_PATH);
        assert_eq!(route_label("/"), DASHBOARD_PATH);
        assert_eq!(route_label("/wp-admin"), "other");
    }
}
