use axum::http::HeaderMap;
use std::net::IpAddr;

/// Client identity for rate-limit keying: first `x-forwarded-for` hop, then
/// `x-real-ip`, then the transport address, defaulting to loopback.
pub fn extract_ip_from_headers(headers: &HeaderMap, fallback: Option<IpAddr>) -> IpAddr {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return ip;
    }

    fallback.unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.9, 172.16.0.1"));
        assert_eq!(extract_ip_from_headers(&headers, None), "10.0.0.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_falls_back_to_transport_then_loopback() {
        let headers = HeaderMap::new();
        let fallback: IpAddr = "192.168.1.4".parse().unwrap();
        assert_eq!(extract_ip_from_headers(&headers, Some(fallback)), fallback);
        assert_eq!(extract_ip_from_headers(&headers, None), IpAddr::from([127, 0, 0, 1]));
    }
}
