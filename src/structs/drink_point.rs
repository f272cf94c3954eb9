use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DrinkPoint {
    /// Store-assigned id, stable for the record's lifetime
    pub id: u64,

    /// Timestamp of when the drink was recorded
    pub timestamp: i64,

    /// Amount of water drank in milliliters. Negative amounts are
    /// corrections that walk a day's total back down; records are never
    /// edited after creation.
    pub amount: f64,
}

impl DrinkPoint {
    pub fn new(id: u64, amount: f64, timestamp: i64) -> Self {
        Self {
            id,
            timestamp,
            amount,
        }
    }
}
