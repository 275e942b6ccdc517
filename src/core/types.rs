use serde::{Deserialize, Serialize};

use super::calendar::{MonthNames, month_labels};

/// Return rate applied to each period's opening principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateSchedule {
    Uniform(f64),
    PerPeriod(Vec<f64>),
}

impl RateSchedule {
    /// Builds a schedule from a flat list: one value is uniform, several are per-period.
    pub fn from_values(values: Vec<f64>) -> Self {
        match values.as_slice() {
            [single] => RateSchedule::Uniform(*single),
            _ => RateSchedule::PerPeriod(values),
        }
    }

    pub fn rate_at(&self, index: usize) -> f64 {
        match self {
            RateSchedule::Uniform(rate) => *rate,
            RateSchedule::PerPeriod(rates) => rates[index],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSet {
    pub initial_principal: f64,
    pub withdrawals: Vec<f64>,
    pub rates: RateSchedule,
    pub support_rate: f64,
    pub support_delay: usize,
    pub period_labels: Vec<String>,
}

impl InputSet {
    /// Monthly projection over `months` periods labelled from `names`.
    ///
    /// An empty `withdrawals` list means nothing is withdrawn in any month.
    pub fn monthly(
        initial_principal: f64,
        withdrawals: Vec<f64>,
        rates: RateSchedule,
        support_rate: f64,
        support_delay: usize,
        months: usize,
        names: MonthNames,
    ) -> Self {
        let withdrawals = if withdrawals.is_empty() {
            vec![0.0; months]
        } else {
            withdrawals
        };
        Self {
            initial_principal,
            withdrawals,
            rates,
            support_rate,
            support_delay,
            period_labels: month_labels(months, names),
        }
    }

    pub fn period_count(&self) -> usize {
        self.period_labels.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecord {
    pub index: usize,
    pub label: String,
    pub opening_principal: f64,
    pub return_amount: f64,
    pub support_income: f64,
    pub support_applied: bool,
    /// Delayed support income added to this period's carried principal.
    pub support_credited: f64,
    pub withdrawal: f64,
    pub carried_principal: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub opening_principal: f64,
    pub return_amount: f64,
    pub support_income: f64,
    pub support_credited: f64,
    pub withdrawal: f64,
    pub carried_principal: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTable {
    pub rows: Vec<PeriodRecord>,
    pub totals: Totals,
}

/// One line of the display table. The trailing totals line leaves
/// `label` and `support_applied` blank.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub label: Option<String>,
    pub opening_principal: f64,
    pub return_amount: f64,
    pub support_income: f64,
    pub support_applied: Option<bool>,
    pub support_credited: f64,
    pub withdrawal: f64,
    pub carried_principal: f64,
    pub profit: f64,
}
