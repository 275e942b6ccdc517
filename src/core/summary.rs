use super::types::{DisplayRow, PeriodRecord, ResultTable, Totals};

/// Sums every numeric column of `records` into a [`ResultTable`].
///
/// `records` must be period rows only; nothing guards against summing twice.
pub fn summarize(records: &[PeriodRecord]) -> ResultTable {
    let totals = Totals {
        opening_principal: column_sum(records, |r| r.opening_principal),
        return_amount: column_sum(records, |r| r.return_amount),
        support_income: column_sum(records, |r| r.support_income),
        support_credited: column_sum(records, |r| r.support_credited),
        withdrawal: column_sum(records, |r| r.withdrawal),
        carried_principal: column_sum(records, |r| r.carried_principal),
        profit: column_sum(records, |r| r.profit),
    };

    ResultTable {
        rows: records.to_vec(),
        totals,
    }
}

fn column_sum(records: &[PeriodRecord], value: fn(&PeriodRecord) -> f64) -> f64 {
    records.iter().map(value).sum()
}

impl ResultTable {
    pub fn total_return(&self) -> f64 {
        self.totals.return_amount
    }

    pub fn total_support(&self) -> f64 {
        self.totals.support_income
    }

    /// Sum of every period's opening principal.
    pub fn total_investment(&self) -> f64 {
        self.totals.opening_principal
    }

    pub fn total_profit(&self) -> f64 {
        self.totals.profit
    }

    /// Period rows followed by a totals row with blank label and support flag.
    pub fn display_rows(&self) -> Vec<DisplayRow> {
        let mut rows: Vec<DisplayRow> = self
            .rows
            .iter()
            .map(|r| DisplayRow {
                label: Some(r.label.clone()),
                opening_principal: r.opening_principal,
                return_amount: r.return_amount,
                support_income: r.support_income,
                support_applied: Some(r.support_applied),
                support_credited: r.support_credited,
                withdrawal: r.withdrawal,
                carried_principal: r.carried_principal,
                profit: r.profit,
            })
            .collect();

        let t = &self.totals;
        rows.push(DisplayRow {
            label: None,
            opening_principal: t.opening_principal,
            return_amount: t.return_amount,
            support_income: t.support_income,
            support_applied: None,
            support_credited: t.support_credited,
            withdrawal: t.withdrawal,
            carried_principal: t.carried_principal,
            profit: t.profit,
        });
        rows
    }
}
