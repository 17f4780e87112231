use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue, RETRY_AFTER},
    Error, HttpResponse,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{limiter::rate_limiter::RateLimiterStore, utils::get_client_ip::get_client_ip};

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Per-client-IP request budget. Over-budget requests get 429 with `Retry-After`.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    store: RateLimiterStore,
    trust_proxy: bool,
}

impl RateLimitMiddleware {
    pub fn new(store: RateLimiterStore, trust_proxy: bool) -> Self {
        RateLimitMiddleware { store, trust_proxy }
    }
}

impl<S> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            store: self.store.clone(),
            trust_proxy: self.trust_proxy,
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    store: RateLimiterStore,
    trust_proxy: bool,
}

impl<S> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let client = get_client_ip(&req, self.trust_proxy);
        let decision = self.store.check(&client);

        Box::pin(async move {
            if !decision.allowed {
                let retry_after = decision.retry_after.unwrap_or(1);
                tracing::warn!(client = %client, retry_after, "Rate limit exceeded");

                let response = HttpResponse::TooManyRequests()
                    .insert_header((RETRY_AFTER, retry_after.to_string()))
                    .insert_header((LIMIT_HEADER, decision.limit.to_string()))
                    .insert_header((REMAINING_HEADER, "0"))
                    .json(serde_json::json!({
                        "success": false,
                        "error": "Too many requests, please try again later."
                    }));
                return Ok(req.into_response(response));
            }

            let mut res = service.call(req).await?;
            let headers = res.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
                headers.insert(HeaderName::from_static(LIMIT_HEADER), value);
            }
            if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
                headers.insert(HeaderName::from_static(REMAINING_HEADER), value);
            }
            Ok(res)
        })
    }
}
