use std::sync::Arc;

use tripline_core::ValidationOptions;
use tripline_crm::HubSpotClient;

#[derive(Clone)]
pub struct AppState {
    pub crm: Arc<HubSpotClient>,
    pub validation: ValidationOptions,
}
