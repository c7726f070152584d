//! Request logging middleware, trimmed from the teacher's
//! `conhub-observability` crate down to what a same-process demo
//! deployment needs: method, path, status, and latency per request. Trace
//! header propagation and body/header redaction are dropped since there is
//! no downstream service call here to propagate a trace context to.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::time::Instant;

use crate::metrics::Metrics;

const EXCLUDED_PATHS: &[&str] = &["/health", "/metrics"];

pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingMiddleware { service }))
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().to_string();
        let path = req.path().to_string();
        let excluded = EXCLUDED_PATHS.contains(&path.as_str());
        if let Some(metrics) = req.app_data::<web::Data<Metrics>>() {
            metrics.record_request();
        }
        let start = Instant::now();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            if !excluded {
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = res.status().as_u16(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "request handled"
                );
            }
            Ok(res)
        })
    }
}
