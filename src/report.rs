use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{OptimizeError, Result};
use crate::model::{PRODUCT_A, PRODUCT_B};
use crate::solver::Solution;

const TITLE: &str = "Optimization Results:";
const VARIABLE_HEADER: &str = "Variable";
const VALUE_HEADER: &str = "Optimal_Value";
const PROFIT_PREFIX: &str = "Total Profit: ";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub variable: String,
    pub optimal_value: f64,
}

/// Values substituted into the narrative block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insights {
    pub product_a: f64,
    pub product_b: f64,
    pub profit: f64,
}

impl Insights {
    pub fn render(&self) -> String {
        format!(
            "\n\
             1. The optimal solution suggests producing {a} units of Product A and {b} units of Product B.\n\
             2. The maximum achievable profit is ${profit}.\n\
             3. The machine time constraint and labor time constraint are binding at optimal levels,\n   \
             meaning they are fully utilized in the optimal solution.\n\
             4. If more resources are available (e.g., additional machine or labor hours), the profit could increase further.\n",
            a = format_number(self.product_a),
            b = format_number(self.product_b),
            profit = format_number(self.profit),
        )
    }
}

/// A solved plan ready to be rendered; holds no text until asked for it
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub total_profit: f64,
    pub insights: Insights,
}

impl Report {
    pub fn from_solution(solution: &Solution) -> Result<Self> {
        let lookup = |name: &str| {
            solution
                .value(name)
                .ok_or_else(|| OptimizeError::UnknownVariable {
                    name: name.to_owned(),
                })
        };

        let insights = Insights {
            product_a: lookup(PRODUCT_A)?,
            product_b: lookup(PRODUCT_B)?,
            profit: solution.objective_value,
        };

        let rows = solution
            .values
            .iter()
            .map(|(name, &value)| ReportRow {
                variable: name.clone(),
                optimal_value: value,
            })
            .collect();

        Ok(Self {
            rows,
            total_profit: solution.objective_value,
            insights,
        })
    }

    /// Text of the `result.txt` artifact
    pub fn render(&self) -> String {
        format!(
            "{TITLE}\n{table}\n\n{PROFIT_PREFIX}{profit}\n\n{insights}",
            table = render_table(&self.table_rows(), false),
            profit = format_number(self.total_profit),
            insights = self.insights.render(),
        )
    }

    /// Text for standard output; the table carries a row index column
    pub fn render_console(&self) -> String {
        format!(
            "\n{TITLE}\n{table}\n\n{PROFIT_PREFIX}{profit}\n{insights}",
            table = render_table(&self.table_rows(), true),
            profit = format_number(self.total_profit),
            insights = self.insights.render(),
        )
    }

    /// Create or truncate `path` and write the rendered report into it
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let io_error = |source: io::Error| OptimizeError::IoWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.render().as_bytes()).map_err(io_error)?;
        writer.flush().map_err(io_error)?;

        info!(path = %path.display(), "report written");
        Ok(())
    }

    fn table_rows(&self) -> Vec<[String; 2]> {
        self.rows
            .iter()
            .map(|row| [row.variable.clone(), format_number(row.optimal_value)])
            .collect()
    }
}

/// Table and total profit read back from a rendered artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReport {
    pub values: BTreeMap<String, f64>,
    pub total_profit: f64,
}

pub fn parse_artifact(text: &str) -> Result<ParsedReport> {
    let mut lines = text.lines();

    match lines.next() {
        Some(TITLE) => {}
        other => {
            return Err(OptimizeError::MalformedReport(format!(
                "expected `{TITLE}`, found {other:?}"
            )));
        }
    }

    let header: Vec<&str> = lines.next().unwrap_or_default().split_whitespace().collect();
    if header != [VARIABLE_HEADER, VALUE_HEADER] {
        return Err(OptimizeError::MalformedReport(format!(
            "unexpected table header {header:?}"
        )));
    }

    let mut values = BTreeMap::new();
    for line in lines.by_ref().take_while(|line| !line.trim().is_empty()) {
        let cells: Vec<&str> = line.split_whitespace().collect();
        let [name, value] = cells.as_slice() else {
            return Err(OptimizeError::MalformedReport(format!(
                "unexpected table row `{line}`"
            )));
        };
        values.insert(name.to_string(), parse_number(value)?);
    }

    let total_profit = lines
        .find_map(|line| line.strip_prefix(PROFIT_PREFIX))
        .ok_or_else(|| OptimizeError::MalformedReport("missing total profit".to_owned()))
        .and_then(parse_number)?;

    Ok(ParsedReport {
        values,
        total_profit,
    })
}

/// Shortest text that reads back to the same float, e.g. `70.0`
fn format_number(value: f64) -> String {
    format!("{value:?}")
}

fn parse_number(text: &str) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| OptimizeError::MalformedReport(format!("not a number: `{text}`")))
}

/// Right-aligned columns separated by two spaces
fn render_table(rows: &[[String; 2]], with_index: bool) -> String {
    let headers = [VARIABLE_HEADER, VALUE_HEADER];
    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .map(|row| row[col].len())
                .fold(headers[col].len(), usize::max)
        })
        .collect();
    let index_width = rows.len().saturating_sub(1).to_string().len();

    let format_line = |index: &str, cells: [&str; 2]| {
        let mut line = String::new();
        if with_index {
            line.push_str(&format!("{index:>index_width$}  "));
        }
        let cells: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .collect();
        line.push_str(&cells.join("  "));
        line
    };

    let mut lines = vec![format_line("", headers)];
    for (i, row) in rows.iter().enumerate() {
        lines.push(format_line(&i.to_string(), [row[0].as_str(), row[1].as_str()]));
    }
    lines.join("\n")
}
