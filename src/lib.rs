pub mod alerts; // Alert dispatch: primary/urgent routing, emergency log
pub mod batch;
pub mod collaborators; // Store, channel, metrics and log contracts
pub mod config;
pub mod error;
pub mod insights; // Trends, health score, recommendations
pub mod medications; // Frequency parsing, reminders, adherence
pub mod models;
pub mod monitoring; // Threshold table + vital classifier
pub mod service;

use tracing_subscriber::EnvFilter;

pub use error::{CollaboratorError, CoreError};
pub use service::{Collaborators, HealthService, ServiceRequest, ServiceResponse};

/// Install the global tracing subscriber. `RUST_LOG` wins over the built-in
/// filter. Call once, from the binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
