use serde::Serialize;

/// One projection request. Built once from caller-supplied fields and never
/// mutated; retirement_age is expected to be >= current_age but the engine
/// does not enforce it (an inverted range yields a zero-growth projection).
#[derive(Debug, Clone, Copy)]
pub struct Inputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    pub expected_return_percent: f64,
    pub inflation_percent: f64,
    pub withdrawal_rate_percent: f64,
    /// 0.0 means no target was supplied.
    pub target_monthly_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub projected_balance_at_retirement: f64,
    pub estimated_monthly_income_nominal: f64,
    pub estimated_monthly_income_todays_dollars: f64,
    pub track_indicator: String,
}
