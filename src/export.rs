use crate::classify::Classified;
use crate::error::ExportError;
use crate::registry::Category;
use crate::types::{AggregateRow, DetailRow};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Spreadsheet applications reject longer sheet names.
pub const MAX_SHEET_NAME: usize = 31;

fn replace_unsafe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sheet name for a canonical label: characters outside `[A-Za-z0-9 _-]`
/// become `_`, then the result is cut to 31 characters. Two labels can end
/// up with the same name; they are not de-duplicated.
pub fn sanitize_sheet_name(label: &str) -> String {
    replace_unsafe(label).chars().take(MAX_SHEET_NAME).collect()
}

/// Category name with the same substitution as sheet names, untruncated.
pub fn category_file_stem(category: Category) -> String {
    replace_unsafe(category.name())
}

/// `{category}_Details.xlsx`.
pub fn export_file_name(category: Category) -> String {
    format!("{}_Details.xlsx", category_file_stem(category))
}

fn detail_row(c: &Classified<'_>) -> DetailRow {
    let r = c.record;
    DetailRow {
        mapped: c.label.to_string(),
        date: r.date,
        pole: r.pole.clone(),
        project_manager: r.project_manager.clone(),
        qsub: r.qsub.clone(),
        project: r.project.clone(),
        shire: r.shire.clone(),
        segment_desc: r.segment_desc.clone(),
        source_file: r.source_file.clone(),
    }
}

/// Source rows behind one bar of a category chart.
pub fn drill_down(classified: &[Classified<'_>], label: &str) -> Vec<DetailRow> {
    classified
        .iter()
        .filter(|c| c.label == label)
        .map(detail_row)
        .collect()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    rows: &[DetailRow],
    header: &Format,
) -> Result<(), XlsxError> {
    worksheet.set_name(name)?;
    for (c, h) in DetailRow::HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *h, header)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.mapped)?;
        if let Some(date) = row.date {
            worksheet.write_string(r, 1, date.format("%Y-%m-%d").to_string())?;
        }
        for (offset, value) in row.text_columns().iter().enumerate() {
            if let Some(v) = value {
                worksheet.write_string(r, (offset + 2) as u16, *v)?;
            }
        }
    }
    Ok(())
}

/// One sheet per bar of the category, each holding only that label's rows.
pub fn build_workbook(
    category: Category,
    bars: &[AggregateRow],
    classified: &[Classified<'_>],
) -> Result<Vec<u8>, ExportError> {
    if bars.is_empty() {
        return Err(ExportError::Empty(category.name().to_string()));
    }
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    for bar in bars {
        let rows = drill_down(classified, &bar.label);
        let name = sanitize_sheet_name(&bar.label);
        debug!(sheet = %name, rows = rows.len(), "writing sheet");
        write_sheet(workbook.add_worksheet(), &name, &rows, &header)?;
    }
    Ok(workbook.save_to_buffer()?)
}

/// Build the category workbook and write it into `out_dir`.
pub fn export_category(
    category: Category,
    bars: &[AggregateRow],
    classified: &[Classified<'_>],
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = build_workbook(category, bars, classified)?;
    let path = out_dir.join(export_file_name(category));
    std::fs::write(&path, bytes).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!(category = %category, path = %path.display(), sheets = bars.len(), "workbook exported");
    Ok(path)
}
