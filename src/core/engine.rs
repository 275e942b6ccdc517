use tracing::debug;

use super::error::{ProjectionError, ProjectionResult};
use super::summary::summarize;
use super::types::{InputSet, PeriodRecord, RateSchedule, ResultTable};

/// Runs the recurrence and aggregates the totals in one call.
pub fn project(inputs: &InputSet) -> ProjectionResult<ResultTable> {
    let records = compute(inputs)?;
    let table = summarize(&records);
    let t = &table.totals;
    for value in [
        t.opening_principal,
        t.return_amount,
        t.support_income,
        t.carried_principal,
        t.profit,
    ] {
        if !value.is_finite() {
            return Err(ProjectionError::invalid(
                "column totals exceed the representable range",
            ));
        }
    }
    Ok(table)
}

/// Computes one record per period.
///
/// Each period earns `rate * opening` and banks `support_rate * opening` as
/// support income. Banked income is credited `support_delay` periods later.
/// The carried principal (next period's opening) is the return, less the
/// withdrawal, plus any credited support.
pub fn compute(inputs: &InputSet) -> ProjectionResult<Vec<PeriodRecord>> {
    validate(inputs)?;

    let period_count = inputs.period_count();
    debug!(
        period_count,
        support_delay = inputs.support_delay,
        "computing projection"
    );

    let mut records: Vec<PeriodRecord> = Vec::with_capacity(period_count);
    let mut opening = inputs.initial_principal;

    for (index, label) in inputs.period_labels.iter().enumerate() {
        let withdrawal = inputs.withdrawals[index];
        let return_amount = opening * inputs.rates.rate_at(index);
        let support_income = opening * inputs.support_rate;
        let support_applied = index >= inputs.support_delay;
        let support_credited = if support_applied {
            records[index - inputs.support_delay].support_income
        } else {
            0.0
        };

        let carried_principal = return_amount - withdrawal + support_credited;
        let profit = return_amount - withdrawal + support_credited;
        if !(return_amount.is_finite()
            && support_income.is_finite()
            && carried_principal.is_finite())
        {
            return Err(ProjectionError::invalid(format!(
                "projection exceeds the representable range in period {index} ({label})"
            )));
        }

        records.push(PeriodRecord {
            index,
            label: label.clone(),
            opening_principal: opening,
            return_amount,
            support_income,
            support_applied,
            support_credited,
            withdrawal,
            carried_principal,
            profit,
        });
        opening = carried_principal;
    }

    Ok(records)
}

/// Checks every precondition of [`compute`] without running the recurrence.
pub fn validate(inputs: &InputSet) -> ProjectionResult<()> {
    let period_count = inputs.period_count();
    if period_count < 1 {
        return Err(ProjectionError::invalid("period count must be >= 1"));
    }

    if inputs.support_delay < 1 {
        return Err(ProjectionError::invalid("support delay must be >= 1"));
    }

    if inputs.withdrawals.len() != period_count {
        return Err(ProjectionError::invalid(format!(
            "expected {period_count} withdrawals, got {}",
            inputs.withdrawals.len()
        )));
    }

    if let RateSchedule::PerPeriod(rates) = &inputs.rates {
        if rates.len() != period_count {
            return Err(ProjectionError::invalid(format!(
                "expected {period_count} rates, got {}",
                rates.len()
            )));
        }
    }

    check_non_negative("initial principal", inputs.initial_principal)?;
    check_non_negative("support rate", inputs.support_rate)?;
    match &inputs.rates {
        RateSchedule::Uniform(rate) => check_non_negative("rate", *rate)?,
        RateSchedule::PerPeriod(rates) => {
            for (idx, rate) in rates.iter().enumerate() {
                check_non_negative(&format!("rates[{idx}]"), *rate)?;
            }
        }
    }
    for (idx, withdrawal) in inputs.withdrawals.iter().enumerate() {
        check_non_negative(&format!("withdrawals[{idx}]"), *withdrawal)?;
    }

    Ok(())
}

/// Negative values, `-inf` included, are `NegativeValue`; NaN and `+inf` are `InvalidInput`.
fn check_non_negative(field: &str, value: f64) -> ProjectionResult<()> {
    if value < 0.0 {
        return Err(ProjectionError::NegativeValue {
            field: field.to_string(),
            value,
        });
    }
    if !value.is_finite() {
        return Err(ProjectionError::invalid(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(())
}
