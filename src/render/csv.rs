use super::Table;

/// Separator joining a multi-line cell into one CSV field.
pub const LINE_SEPARATOR: &str = " | ";

/// Render `table` as CSV: one record per logical row, `\n` terminated.
///
/// Fields containing a comma, quote, CR or LF are quoted with embedded
/// quotes doubled.
pub fn render_csv(table: &Table) -> String {
    let mut out = String::new();
    let headers: Vec<&str> = table.columns.iter().map(|c| c.csv_title.as_str()).collect();
    push_record(&mut out, &headers);

    for row in &table.rows {
        let fields: Vec<String> = (0..table.columns.len())
            .map(|col| {
                row.cells
                    .get(col)
                    .map(|lines| lines.join(LINE_SEPARATOR))
                    .unwrap_or_default()
            })
            .collect();
        let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
        push_record(&mut out, &fields);
    }
    out
}

fn push_record(out: &mut String, fields: &[&str]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
