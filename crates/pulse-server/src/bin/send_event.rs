//! Writes one sample event into the configured history database.
//!
//! Usage: `pulse-send-event [operation]`. The operation defaults to
//! `venta`. The config file comes from `PULSE_CONFIG_PATH`, else
//! `config.toml`.

use pulse_history::{EventStore, SqliteEventStore};
use pulse_server::{config, sample::sample_event};
use tracing_subscriber::EnvFilter;

fn main() {
    let config_path = std::env::var("PULSE_CONFIG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "config.toml".to_string());
    let config = config::load_config(Some(config_path.as_str())).expect("failed to load configuration");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let operation = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "venta".to_string());

    let pool = pulse_db::create_pool(&config.database.path, config.database.runtime_settings())
        .expect("failed to create database pool");
    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        pulse_db::run_migrations(&conn).expect("failed to run database migrations");
    }

    let event = sample_event(&operation);
    SqliteEventStore::new(pool)
        .put(&event)
        .expect("failed to write event");

    tracing::info!(
        id = %event.id,
        operation = %operation,
        db = %config.database.path,
        "sample event written"
    );
}
