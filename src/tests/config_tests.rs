#[cfg(test)]
mod tests {
    use crate::config::{validate, AppConfig};

    #[test]
    fn test_embedded_defaults_parse() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.session.cookie_name, "session");
        assert_eq!(cfg.session.expiry_days, 30);
        assert!(!cfg.session.single_session_per_user);
        assert!(!cfg.security.production);
        assert_eq!(cfg.rate_limit.global.max_requests, 60);
        assert_eq!(cfg.rate_limit.auth.max_requests, 10);
        assert_eq!(cfg.rate_limit.auth.window_secs, 900);
        assert_eq!(cfg.rate_limit.write.max_requests, 30);
        assert_eq!(cfg.cors.preflight_status, 204);
        assert!(cfg.cors.credentials);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_port_zero() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_empty_cookie_name() {
        let mut cfg = AppConfig::default();
        cfg.session.cookie_name.clear();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_expiry() {
        let mut cfg = AppConfig::default();
        cfg.session.expiry_days = 0;
        assert!(validate(&cfg).is_err());
        cfg.session.expiry_days = 366;
        assert!(validate(&cfg).is_err());
        cfg.session.expiry_days = 365;
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_rejects_zero_rate_budgets() {
        let mut cfg = AppConfig::default();
        cfg.rate_limit.write.max_requests = 0;
        assert!(validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.rate_limit.global.window_secs = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_rejects_error_preflight_status() {
        let mut cfg = AppConfig::default();
        cfg.cors.preflight_status = 500;
        assert!(validate(&cfg).is_err());
        cfg.cors.preflight_status = 200;
        assert!(validate(&cfg).is_ok());
    }
}
