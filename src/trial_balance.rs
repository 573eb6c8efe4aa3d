use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

static ACCOUNT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)*)\s+(.*)").expect("valid account regex"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrialBalanceAccount {
    pub code: String,
    pub name: String,
}

/// Reads the accounts of a trial balance export, in sheet order.
///
/// Spreadsheets (`xlsx`, `xls`, `xlsb`, `ods`) are read from their first
/// sheet; `csv` and `tsv` files are read as delimited text.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn read_trial_balance(path: &Path, skip_rows: usize) -> Result<Vec<TrialBalanceAccount>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_delimited(path, b',')?,
        "tsv" => read_delimited(path, b'\t')?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_spreadsheet(path)?,
        other => bail!("Unsupported trial balance format: {:?}", other),
    };

    let accounts = extract_accounts(&rows, skip_rows);
    tracing::info!(rows = rows.len(), accounts = accounts.len(), "Trial balance read");
    Ok(accounts)
}

fn read_spreadsheet(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open spreadsheet {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("Spreadsheet contains no sheets")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    reader
        .records()
        .enumerate()
        .map(|(i, record)| {
            let record = record.with_context(|| format!("CSV parse error at row {}", i + 1))?;
            Ok(record.iter().map(str::to_string).collect())
        })
        .collect()
}

/// Pulls `(code, name)` pairs out of raw trial balance rows.
///
/// The first `skip_rows` rows are the report header. Columns that are blank in
/// every remaining row are ignored; the first column left holds lines such as
/// `1000 Cash on Hand`. The code is the first numeric run followed by
/// whitespace anywhere in the cell, so `Acct 1000 Cash` still yields `1000`.
/// Rows without such a run (headings, totals) are dropped.
pub fn extract_accounts(rows: &[Vec<String>], skip_rows: usize) -> Vec<TrialBalanceAccount> {
    let body = rows.get(skip_rows..).unwrap_or_default();

    let Some(account_column) = (0..body.iter().map(Vec::len).max().unwrap_or(0)).find(|&col| {
        body.iter()
            .any(|row| row.get(col).is_some_and(|cell| !cell.trim().is_empty()))
    }) else {
        return Vec::new();
    };

    body.iter()
        .filter_map(|row| {
            let cell = row.get(account_column)?.trim();
            let captures = ACCOUNT_LINE.captures(cell)?;
            let name = captures[2].trim();
            if name.is_empty() {
                return None;
            }
            Some(TrialBalanceAccount {
                code: captures[1].to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
