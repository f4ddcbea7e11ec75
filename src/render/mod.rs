//! Table layout shared by the text grid and the CSV export.
//!
//! A [`Table`] is a list of columns and logical rows. Each cell holds zero or
//! more lines, so one logical row can span several physical lines in the grid
//! while staying a single record in the CSV. Line breaks embedded in a stored
//! line also start a new physical line in the grid.

pub mod csv;
pub mod text;
pub mod writer;

use std::borrow::Cow;

use crate::model::summary::ProjectSummary;

/// Blank cells added around the widest value of every column.
pub const CELL_PADDING: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Center,
    /// Left-justified after a single leading space.
    Left,
}

#[derive(Debug, Clone)]
pub struct Column {
    /// Label in the text grid.
    pub title: String,
    /// Label in the CSV header row.
    pub csv_title: String,
    pub align: Align,
}

impl Column {
    pub fn new(title: &str, csv_title: &str, align: Align) -> Self {
        Self {
            title: title.to_string(),
            csv_title: csv_title.to_string(),
            align,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<Vec<String>>,
}

impl Row {
    /// Physical lines this row occupies; never less than one.
    pub fn height(&self) -> usize {
        (0..self.cells.len())
            .map(|col| self.physical_lines(col).len())
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Physical line `index` of column `col`, blank where the cell is shorter.
    pub fn line(&self, col: usize, index: usize) -> Cow<'_, str> {
        self.physical_lines(col)
            .into_iter()
            .nth(index)
            .unwrap_or(Cow::Borrowed(""))
    }

    fn physical_lines(&self, col: usize) -> Vec<Cow<'_, str>> {
        self.cells
            .get(col)
            .map(|cell| cell.iter().flat_map(|line| grid_lines(line)).collect())
            .unwrap_or_default()
    }
}

/// Splits a stored line at `\n`, `\r\n` or `\r`; any other control character
/// becomes a space so every physical line keeps its measured width.
fn grid_lines(line: &str) -> impl Iterator<Item = Cow<'_, str>> {
    line.split('\n')
        .map(|part| part.strip_suffix('\r').unwrap_or(part))
        .flat_map(|part| part.split('\r'))
        .map(|part| {
            if part.chars().any(char::is_control) {
                Cow::Owned(part.chars().map(|c| if c.is_control() { ' ' } else { c }).collect())
            } else {
                Cow::Borrowed(part)
            }
        })
}

#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<Vec<String>>) {
        self.rows.push(Row { cells });
    }

    /// Column widths in character cells, padding included.
    pub fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let content = self
                    .rows
                    .iter()
                    .flat_map(|row| row.physical_lines(i))
                    .map(|line| display_width(&line))
                    .max()
                    .unwrap_or(0);
                display_width(&column.title).max(content) + CELL_PADDING
            })
            .collect()
    }
}

/// Width in character cells; one per Unicode scalar value.
pub fn display_width(s: &str) -> usize {
    s.chars().count()
}

/// The four-column summary layout used by both report artifacts.
pub fn summary_table(summaries: &[ProjectSummary]) -> Table {
    let mut table = Table::new(vec![
        Column::new("Project", "Project", Align::Center),
        Column::new("Active (WIP)", "Active Count", Align::Center),
        Column::new("Completed/Review", "Completed Count", Align::Center),
        Column::new("Detailed Task List", "Tasks", Align::Left),
    ]);
    for summary in summaries {
        table.push_row(vec![
            vec![summary.project_name.clone()],
            vec![summary.active_count.to_string()],
            vec![summary.completed_count.to_string()],
            summary.task_lines.clone(),
        ]);
    }
    table
}
