mod api_doc;
mod error;
mod handlers;
mod setup;
mod state;
mod telemetry;

use qrbox_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    telemetry::init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, storage, worker, routes).
    // A store that never becomes reachable propagates an error here and the
    // process exits non-zero without serving a single request.
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router, state).await?;

    Ok(())
}
