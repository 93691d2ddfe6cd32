use serde::Deserialize;
use serde::Serialize;

/// the scalar state a resumed run needs beyond the store
/// itself. written as the `.meta` member of the checkpoint
/// triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub format_version: u32,
    pub iteration: usize,
    pub rng_state: u64,
    pub epsilon: f64,
    pub epsilon_schedule_index: usize,
    pub discount_state: DiscountState,
    pub bucket_hash: String,
    pub timestamp: u64,
}

/// discounting bookkeeping across a save/load boundary. the
/// lazy scalars are materialized into the store on save, so
/// they reload as exactly 1; the tick counter keeps the
/// dcfr factor sequence aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountState {
    pub gamma_r: f64,
    pub gamma_s: f64,
    pub ticks: usize,
}

impl Default for DiscountState {
    fn default() -> Self {
        Self {
            gamma_r: 1.0,
            gamma_s: 1.0,
            ticks: 0,
        }
    }
}
