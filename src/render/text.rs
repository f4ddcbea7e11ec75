use super::{display_width, Align, Table};

/// Render `table` as a `+---+` ruled grid.
///
/// Rules go above and below the header and after every logical row; the
/// continuation lines of a multi-line row are not separated.
pub fn render_grid(table: &Table) -> String {
    if table.rows.is_empty() {
        return String::new();
    }
    let widths = table.widths();
    let divider = rule(&widths);

    let mut out = String::new();
    out.push_str(&divider);
    let headers: Vec<&str> = table.columns.iter().map(|c| c.title.as_str()).collect();
    out.push_str(&line(table, &widths, &headers));
    out.push_str(&divider);

    for row in &table.rows {
        for index in 0..row.height() {
            let cells: Vec<_> = (0..table.columns.len()).map(|col| row.line(col, index)).collect();
            out.push_str(&line(table, &widths, &cells));
        }
        out.push_str(&divider);
    }
    out
}

fn rule(widths: &[usize]) -> String {
    let mut out = String::from("+");
    for width in widths {
        out.push_str(&"-".repeat(*width));
        out.push('+');
    }
    out.push('\n');
    out
}

fn line<S: AsRef<str>>(table: &Table, widths: &[usize], cells: &[S]) -> String {
    let mut out = String::from("|");
    for ((column, width), cell) in table.columns.iter().zip(widths).zip(cells) {
        let cell = cell.as_ref();
        match column.align {
            Align::Center => out.push_str(&center(cell, *width)),
            Align::Left => {
                out.push(' ');
                out.push_str(&format!("{cell:<width$}", width = width.saturating_sub(1)));
            }
        }
        out.push('|');
    }
    out.push('\n');
    out
}

/// Pads `cell` to `width`. An odd margin puts the spare space on the left
/// when `width` is odd and on the right when it is even.
fn center(cell: &str, width: usize) -> String {
    let margin = width.saturating_sub(display_width(cell));
    let left = margin / 2 + (margin & width & 1);
    format!("{}{cell}{}", " ".repeat(left), " ".repeat(margin - left))
}
