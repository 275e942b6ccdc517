use super::types::{DisplayRow, ResultTable};

const HEADERS: [&str; 9] = [
    "Month",
    "Opening",
    "Return",
    "Support income",
    "Support applied",
    "Support credited",
    "Withdrawal",
    "Carried",
    "Profit",
];

/// Renders the display table as right-aligned plain text, with a rule
/// above the totals row.
pub fn render_text_table(table: &ResultTable) -> String {
    let display = table.display_rows();
    let cells: Vec<[String; 9]> = display.iter().map(row_cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    push_rule(&mut out, &widths);
    let totals_at = cells.len() - 1;
    for (idx, row) in cells.iter().enumerate() {
        if idx == totals_at {
            push_rule(&mut out, &widths);
        }
        push_line(&mut out, row, &widths);
    }
    out
}

fn row_cells(row: &DisplayRow) -> [String; 9] {
    [
        row.label.clone().unwrap_or_default(),
        amount(row.opening_principal),
        amount(row.return_amount),
        amount(row.support_income),
        match row.support_applied {
            Some(true) => "yes".to_string(),
            Some(false) => "no".to_string(),
            None => String::new(),
        },
        amount(row.support_credited),
        amount(row.withdrawal),
        amount(row.carried_principal),
        amount(row.profit),
    ]
}

fn amount(value: f64) -> String {
    format!("{value:.2}")
}

fn push_line(out: &mut String, cells: &[String; 9], widths: &[usize; 9]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{cell}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&line);
    out.push('\n');
}

fn push_rule(out: &mut String, widths: &[usize; 9]) {
    let total = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    out.push_str(&"-".repeat(total));
    out.push('\n');
}
