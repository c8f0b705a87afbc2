mod extractor;
mod routes;
mod server_config;
mod state;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use schedulify_core::Settings;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::server_config::ServerSettings;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin: {}", origin))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let settings = Settings::load()?;
    let server_settings = ServerSettings::load_from(Settings::config_path().ok().as_deref())?;

    let extractor = extractor::from_settings(&server_settings)?;
    let state = AppState::new(settings, extractor);

    let app = routes::router(state).layer(cors_layer(&server_settings.cors_origins)?);

    let listener = tokio::net::TcpListener::bind(server_settings.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", server_settings.bind))?;
    tracing::info!(addr = %server_settings.bind, "schedulify-server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_wildcard_and_lists() {
        assert!(cors_layer(&["*".to_string()]).is_ok());
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
