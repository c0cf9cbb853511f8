use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Security-relevant environment switches. `production` toggles the `Secure`
/// cookie attribute and strips debug details from error responses.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub production: bool,
    pub cookie_domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub expiry_days: i64,
    pub single_session_per_user: bool,
}

/// One fixed-window budget: `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateTierConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub global: RateTierConfig,
    pub auth: RateTierConfig,
    pub write: RateTierConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allow_any_origin: bool,
    pub origins: Vec<String>,
    pub origin_patterns: Vec<String>,
    pub methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub credentials: bool,
    pub max_age_secs: u64,
    pub preflight_status: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: barkeep.toml (in CWD)
        .add_source(::config::File::with_name("barkeep").required(false));

    if let Ok(custom_path) = std::env::var("BARKEEP_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("BARKEEP").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Session
    if cfg.session.cookie_name.is_empty() {
        return Err(anyhow::anyhow!("session.cookie_name must not be empty"));
    }
    if cfg.session.expiry_days <= 0 || cfg.session.expiry_days > 365 {
        return Err(anyhow::anyhow!("session.expiry_days must be in 1..=365"));
    }

    // Rate limiting
    for (name, tier) in [
        ("global", &cfg.rate_limit.global),
        ("auth", &cfg.rate_limit.auth),
        ("write", &cfg.rate_limit.write),
    ] {
        if tier.max_requests == 0 {
            return Err(anyhow::anyhow!("rate_limit.{}.max_requests must be > 0", name));
        }
        if tier.window_secs == 0 {
            return Err(anyhow::anyhow!("rate_limit.{}.window_secs must be > 0", name));
        }
    }

    // CORS
    if !(200..400).contains(&cfg.cors.preflight_status) {
        return Err(anyhow::anyhow!("cors.preflight_status must be a 2xx/3xx status"));
    }
    if cfg.security.production && cfg.cors.allow_any_origin {
        tracing::warn!("cors.allow_any_origin is enabled in production - consider an explicit allow-list");
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
