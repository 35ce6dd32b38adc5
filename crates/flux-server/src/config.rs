//! Server configuration from the environment.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub const DEFAULT_BIND: &str = "0.0.0.0:8001";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Allowed origins. `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8001)),
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// Read `FLUX_BIND` and `CORS_ORIGINS`.
    pub fn from_env() -> Result<Self, String> {
        Self::from_vars(
            std::env::var("FLUX_BIND").ok().as_deref(),
            std::env::var("CORS_ORIGINS").ok().as_deref(),
        )
    }

    pub fn from_vars(bind: Option<&str>, cors_origins: Option<&str>) -> Result<Self, String> {
        let bind = bind
            .unwrap_or(DEFAULT_BIND)
            .parse()
            .map_err(|e| format!("Invalid FLUX_BIND: {}", e))?;
        Ok(Self {
            bind,
            cors_origins: cors_origins.and_then(parse_origins),
        })
    }

    pub fn cors_layer(&self) -> CorsLayer {
        match &self.cors_origins {
            None => CorsLayer::permissive(),
            Some(origins) => {
                let origins: Vec<HeaderValue> = origins
                    .iter()
                    .filter_map(|o| match HeaderValue::from_str(o) {
                        Ok(value) => Some(value),
                        Err(_) => {
                            tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                            None
                        }
                    })
                    .collect();
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
    }
}

/// `*` or an empty list means any origin.
fn parse_origins(raw: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        None
    } else {
        Some(origins)
    }
}
