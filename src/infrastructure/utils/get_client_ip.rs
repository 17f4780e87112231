use actix_web::dev::ServiceRequest;

/// Client address used as the rate-limit key.
///
/// The first `X-Forwarded-For` hop is honoured only when the proxy is trusted.
pub fn get_client_ip(req: &ServiceRequest, trust_x_forwarded_for: bool) -> String {
    if trust_x_forwarded_for {
        if let Some(first_hop) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return first_hop.to_string();
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn forwarded_header_is_ignored_unless_trusted() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .peer_addr("192.0.2.1:4000".parse().unwrap())
            .to_srv_request();

        assert_eq!(get_client_ip(&req, true), "203.0.113.9");
        assert_eq!(get_client_ip(&req, false), "192.0.2.1");
    }
}
