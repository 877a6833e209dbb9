use dotenvy::dotenv;
use fintrack::{
    clock::{Clock, SystemClock},
    config::{self, database},
    errors::Result,
    scheduler::{RecurrencePassHandler, Scheduler},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the scheduler configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Start the timers and workers
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let handler = Arc::new(RecurrencePassHandler::new(
        Arc::new(db),
        Arc::clone(&clock),
        app_config.scheduler.skip_completed_periods,
    ));
    let scheduler = Scheduler::start(&app_config.scheduler, clock, handler)?;

    // 6. Run until interrupted, then let queued passes finish
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    scheduler.shutdown().await;

    Ok(())
}
