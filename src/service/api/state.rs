use std::sync::Arc;

use crate::config::Settings;
use crate::service::finance::FinanceService;
use crate::service::food::FoodScanner;

/// Handles shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub finance: Arc<FinanceService>,
    pub food: Arc<FoodScanner>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(finance: Arc<FinanceService>, food: Arc<FoodScanner>, settings: Settings) -> Self {
        Self {
            finance,
            food,
            settings: Arc::new(settings),
        }
    }
}
