use super::types::{Inputs, Projection};

/// Future value of a present sum plus an ordinary annuity of equal monthly
/// payments, compounded at a fixed monthly rate.
///
/// Non-positive month counts return the starting amount untouched, and a
/// zero rate accumulates contributions linearly so the annuity formula never
/// divides by zero. Negative rates are accepted as-is (decay), and extreme
/// inputs follow ordinary float semantics rather than erroring.
pub fn future_value(
    current_savings: f64,
    monthly_contribution: f64,
    monthly_return: f64,
    months: i64,
) -> f64 {
    if months <= 0 {
        return current_savings;
    }
    if monthly_return == 0.0 {
        return current_savings + monthly_contribution * months as f64;
    }

    let growth = (1.0 + monthly_return).powf(months as f64);
    let contribution_fv = monthly_contribution * ((growth - 1.0) / monthly_return);
    current_savings * growth + contribution_fv
}

/// Runs one full projection: compounds savings to retirement age, converts
/// the balance into a monthly income at the given withdrawal rate, deflates
/// it back to today's dollars, and grades it against the optional target.
pub fn project(inputs: &Inputs) -> Projection {
    let years = i64::from(inputs.retirement_age) - i64::from(inputs.current_age);
    let months = years * 12;

    let monthly_return = inputs.expected_return_percent / 100.0 / 12.0;
    let projected_balance = future_value(
        inputs.current_savings,
        inputs.monthly_contribution,
        monthly_return,
        months,
    );

    let annual_income_nominal = projected_balance * (inputs.withdrawal_rate_percent / 100.0);
    let monthly_income_nominal = annual_income_nominal / 12.0;

    // A non-positive factor is only reachable with inflation below -100%;
    // the deflation step is skipped there rather than treated as an error.
    let inflation_factor = (1.0 + inputs.inflation_percent / 100.0).powf(years as f64);
    let monthly_income_today = if inflation_factor > 0.0 {
        monthly_income_nominal / inflation_factor
    } else {
        monthly_income_nominal
    };

    Projection {
        projected_balance_at_retirement: round_currency(projected_balance),
        estimated_monthly_income_nominal: round_currency(monthly_income_nominal),
        estimated_monthly_income_todays_dollars: round_currency(monthly_income_today),
        track_indicator: track_indicator(inputs.target_monthly_income, monthly_income_today),
    }
}

fn track_indicator(target_monthly_income: f64, monthly_income_today: f64) -> String {
    if target_monthly_income > 0.0 {
        if monthly_income_today >= target_monthly_income {
            "On track for your target income".to_string()
        } else {
            let gap = target_monthly_income - monthly_income_today;
            format!(
                "Not on track yet (estimated shortfall: ${}/month in today's dollars)",
                format_whole(gap)
            )
        }
    } else {
        "Target income not provided".to_string()
    }
}

fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whole-unit amount with thousands separators, e.g. 1234.6 -> "1,235".
fn format_whole(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && c.is_ascii_digit() && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
