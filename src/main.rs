use anyhow::{Context, Result};

use api_schemas::{app, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env().context("Failed to load settings")?;

    // Initialize logging
    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        per_page = settings.pagination_per_page,
        max_page_size = settings.pagination_max_page_size,
        "Starting api-schemas demo service"
    );

    let server_addr = settings.server_addr.clone();

    // Build application
    let app = app::create_app(settings)?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind {server_addr}"))?;
    tracing::info!("Listening on {}", server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
