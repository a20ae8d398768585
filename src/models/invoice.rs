use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub booking_id: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub paid: bool,
}
