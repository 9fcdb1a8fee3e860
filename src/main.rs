use dotenvy::dotenv;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tuition_billing::{
    config::{self, database},
    core::billing,
    errors::Result,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load billing.toml (defaults when absent)
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    // The scan never prices invoices; the table is for create_invoices callers.
    debug!(pricing = ?app_config.pricing_table(), "Active pricing table.");

    // 4. Connect and make sure the schema exists
    let database_url = app_config.database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect(|_| info!("Connected to database."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Overdue scan, once or on a fixed interval
    if app_config.reconcile_interval_secs == 0 {
        let report = billing::reconcile_overdue_invoices_now(&db)
            .await
            .inspect_err(|e| error!("Overdue scan failed: {}", e))?;
        info!(
            scanned = report.scanned,
            marked_overdue = report.marked_overdue.len(),
            late_fees_created = report.late_fees_created.len(),
            "Overdue scan finished."
        );
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(app_config.reconcile_interval_secs));
    info!(
        interval_secs = app_config.reconcile_interval_secs,
        "Running overdue scan periodically."
    );
    loop {
        ticker.tick().await;
        // A failed scan is logged and retried on the next tick.
        if let Err(e) = billing::reconcile_overdue_invoices_now(&db).await {
            error!("Overdue scan failed: {}", e);
        }
    }
}
