use std::fmt::Write as _;

/// Renders rows as an aligned plain-text table. Cells that parse as numbers
/// are right-aligned; embedded line breaks and tabs become spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, false));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths, false));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, true));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_row(values: &[String], widths: &[usize], align_numbers: bool) -> String {
    let line = values
        .iter()
        .zip(widths.iter().copied())
        .map(|(value, pad)| {
            let cell = sanitize(value);
            if align_numbers && cell.parse::<f64>().is_ok() {
                format!("{cell:>pad$}")
            } else {
                format!("{cell:<pad$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn width(value: &str) -> usize {
    value.chars().count().max(1)
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|ch| if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch })
        .collect()
}
