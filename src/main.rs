#![allow(clippy::result_large_err)]

use chrono::Local;
use dotenvy::dotenv;
use groomdesk::{
    config::{self, accounts, database},
    core::{account, board, catalog},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Plan policy and price list
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Open the store and create the tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))?;

    // 5. Seed the price list and the bootstrap owner
    catalog::seed_catalog(&db, &app_config.catalog).await?;
    let owner = accounts::bootstrap_owner_from_env()
        .inspect_err(|e| error!("Bootstrap owner is not configured: {}", e))?;
    account::seed_bootstrap_owner(&db, &owner).await?;

    // 6. Report the day
    let today = Local::now().date_naive();
    let summary = board::daily_summary(&db, today).await?;
    info!(
        "{}: {} appointment(s) - {} scheduled, {} in progress, {} completed",
        today,
        summary.total(),
        summary.scheduled,
        summary.in_progress,
        summary.completed
    );
    for column in board::stage_board(&db).await? {
        info!(
            "{}: {} pet(s)",
            column.stage.label(),
            column.appointments.len()
        );
    }
    info!(
        "Plan policy: {} baths, renewals add {}, valid {} day(s)",
        app_config.plan.default_baths, app_config.plan.renewal_baths, app_config.plan.validity_days
    );

    Ok(())
}
