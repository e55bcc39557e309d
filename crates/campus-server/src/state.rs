//! Shared handler state.

use std::sync::Arc;

use campus_config::{CampusConfig, GeneralConfig, PaymentsConfig};
use campus_db::service::CampusService;

/// Cloned into every handler. The service is shared; its gate
/// serializes database access across requests.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CampusService>,
    pub payments: Arc<PaymentsConfig>,
    pub general: Arc<GeneralConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(service: CampusService, config: &CampusConfig) -> Self {
        Self {
            service: Arc::new(service),
            payments: Arc::new(config.payments.clone()),
            general: Arc::new(config.general.clone()),
        }
    }
}
