use crate::error::LoadError;
use crate::registry::{resolve_project_manager, resolve_source_file};
use crate::types::{col, CompletionRow, CompletionTable, Dataset, Record};
use crate::util::{parse_date_safe, parse_locale_decimal};
use csv::ReaderBuilder;
use polars::prelude::{DataType, LazyFrame, ScanArgsParquet};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub dropped_dates: usize,
    pub derived_fields: usize,
}

/// Untyped cells straight from the file, before column normalization.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    parse_errors: usize,
}

/// Trimmed, lower-cased header -> first column index carrying it.
struct ColumnIndex(HashMap<String, usize>);

impl ColumnIndex {
    fn new(headers: &[String]) -> Self {
        let mut map = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // Repeated names keep their first occurrence.
            map.entry(h.trim().to_lowercase()).or_insert(i);
        }
        ColumnIndex(map)
    }

    fn names(&self) -> BTreeSet<String> {
        self.0.keys().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    fn get(&self, row: &[Option<String>], name: &str) -> Option<String> {
        let i = *self.0.get(name)?;
        row.get(i).cloned().flatten()
    }
}

fn cell(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn read_table(path: &Path) -> Result<RawTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "parquet" => read_parquet(path),
        "csv" => read_csv(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    let mut parse_errors = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "skipping unreadable CSV row");
                parse_errors += 1;
                continue;
            }
        };
        rows.push(record.iter().map(cell).collect());
    }
    Ok(RawTable { headers, rows, parse_errors })
}

fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let df = LazyFrame::scan_parquet(path, ScanArgsParquet::default())?.collect()?;

    // Only the columns the dashboard reads are converted, first occurrence
    // of each normalized name. They are read as text; numbers and dates are
    // coerced later with the same rules as CSV input.
    let mut seen = BTreeSet::new();
    let mut headers = Vec::new();
    let mut columns: Vec<Vec<Option<String>>> = Vec::new();
    for name in df.get_column_names() {
        let normalized = name.trim().to_lowercase();
        if !col::KNOWN.contains(&normalized.as_str()) || !seen.insert(normalized) {
            continue;
        }
        let text = match df.column(name)?.cast(&DataType::String) {
            Ok(text) => text,
            Err(e) => {
                warn!(column = name, error = %e, "skipping parquet column that cannot be read as text");
                continue;
            }
        };
        let values = text
            .str()?
            .into_iter()
            .map(|v| v.and_then(cell))
            .collect();
        headers.push(name.to_string());
        columns.push(values);
    }

    let height = df.height();
    let mut rows = vec![Vec::with_capacity(columns.len()); height];
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }
    Ok(RawTable { headers, rows, parse_errors: 0 })
}

/// Fill blank organisational fields from the project-manager and
/// source-file tables. Returns how many fields were filled.
fn derive_fields(r: &mut Record, derived: &mut BTreeSet<&'static str>) -> usize {
    let mut filled = 0usize;
    let mut fill = |slot: &mut Option<String>, value: &str, column: &'static str| {
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.to_string());
            derived.insert(column);
            filled += 1;
        }
    };

    if let Some((shire, segment_type)) = r
        .project_manager
        .as_deref()
        .and_then(resolve_project_manager)
    {
        fill(&mut r.shire, shire, col::SHIRE);
        fill(&mut r.work_type, segment_type, col::TYPE);
    }
    if let Some((shire, project)) = r.source_file.as_deref().and_then(resolve_source_file) {
        fill(&mut r.shire, shire, col::SHIRE);
        fill(&mut r.project, project, col::PROJECT);
    }
    filled
}

/// Load the works dataset from a `.parquet` or `.csv` file.
///
/// Column names are trimmed and lower-cased. When a `datetouse` column is
/// present, rows whose date cannot be parsed are dropped and the rest are
/// normalized to the calendar day.
pub fn load_dataset(path: &Path) -> Result<(Dataset, LoadReport), LoadError> {
    let raw = read_table(path)?;
    let index = ColumnIndex::new(&raw.headers);
    let has_date = index.contains(col::DATE);
    if !has_date {
        warn!(path = %path.display(), "no datetouse column; date filters will not restrict rows");
    }

    let mut report = LoadReport {
        total_rows: raw.rows.len(),
        parse_errors: raw.parse_errors,
        ..LoadReport::default()
    };
    let mut derived = BTreeSet::new();
    let mut records = Vec::with_capacity(raw.rows.len());

    for row in &raw.rows {
        let date = if has_date {
            match parse_date_safe(index.get(row, col::DATE).as_deref()) {
                Some(d) => Some(d),
                None => {
                    report.dropped_dates += 1;
                    continue;
                }
            }
        } else {
            None
        };

        let mut record = Record {
            date,
            shire: index.get(row, col::SHIRE),
            project: index.get(row, col::PROJECT),
            project_manager: index.get(row, col::PROJECT_MANAGER),
            segment_code: index.get(row, col::SEGMENT_CODE),
            work_type: index.get(row, col::TYPE),
            item: index.get(row, col::ITEM),
            qsub: index.get(row, col::QSUB),
            total: index.get(row, col::TOTAL),
            orig: index.get(row, col::ORIG),
            region: index.get(row, col::REGION),
            segment: index.get(row, col::SEGMENT),
            pole: index.get(row, col::POLE),
            segment_desc: index.get(row, col::SEGMENT_DESC),
            source_file: index.get(row, col::SOURCE_FILE),
        };
        report.derived_fields += derive_fields(&mut record, &mut derived);
        records.push(record);
    }

    let mut columns = index.names();
    columns.extend(derived.into_iter().map(str::to_string));
    report.loaded_rows = records.len();

    info!(
        path = %path.display(),
        total = report.total_rows,
        loaded = report.loaded_rows,
        dropped_dates = report.dropped_dates,
        derived = report.derived_fields,
        "dataset loaded"
    );
    Ok((Dataset { columns, records }, report))
}

/// Load the completion dataset (`section`, `%complete`). A file without
/// both columns loads as an empty table rather than failing.
pub fn load_completion(path: &Path) -> Result<CompletionTable, LoadError> {
    let raw = read_table(path)?;
    let index = ColumnIndex::new(&raw.headers);
    if !(index.contains(col::SECTION) && index.contains(col::PERCENT_COMPLETE)) {
        warn!(path = %path.display(), "completion file lacks section/%complete columns");
        return Ok(CompletionTable::default());
    }
    let rows: Vec<CompletionRow> = raw
        .rows
        .iter()
        .map(|row| CompletionRow {
            section: index.get(row, col::SECTION),
            percent_complete: parse_locale_decimal(
                index.get(row, col::PERCENT_COMPLETE).as_deref(),
            ),
        })
        .collect();
    info!(path = %path.display(), rows = rows.len(), "completion data loaded");
    Ok(CompletionTable { has_columns: true, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut f = Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn headers_are_normalized_and_first_duplicate_wins() {
        let f = csv_file(
            " DateToUse ,Item,ITEM ,QSub\n\
             2025-01-02,9x220 CREOSOTE LV POLE,ignored,\"2,5\"\n",
        );
        let (ds, report) = load_dataset(f.path()).unwrap();
        assert!(ds.has_column("datetouse"));
        assert!(ds.has_column("item"));
        assert!(ds.has_column("qsub"));
        assert_eq!(report.loaded_rows, 1);
        let r = &ds.records[0];
        assert_eq!(r.item.as_deref(), Some("9x220 CREOSOTE LV POLE"));
        assert_eq!(r.qsub.as_deref(), Some("2,5"));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2025, 1, 2));
    }

    #[test]
    fn unparseable_dates_drop_rows_only_when_column_exists() {
        let f = csv_file(
            "datetouse,item\n\
             2025-01-02 10:30:00,a\n\
             garbage,b\n\
             ,c\n",
        );
        let (ds, report) = load_dataset(f.path()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.dropped_dates, 2);
        assert_eq!(ds.records.len(), 1);
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2025, 1, 2));

        let f = csv_file("item\na\nb\n");
        let (ds, report) = load_dataset(f.path()).unwrap();
        assert_eq!(report.dropped_dates, 0);
        assert_eq!(ds.records.len(), 2);
        assert!(ds.records.iter().all(|r| r.date.is_none()));
    }

    #[test]
    fn blank_cells_are_missing() {
        let f = csv_file("item,shire\nx,  \n");
        let (ds, _) = load_dataset(f.path()).unwrap();
        assert_eq!(ds.records[0].shire, None);
    }

    #[test]
    fn organisational_fields_are_derived_from_tables() {
        let f = csv_file(
            "projectmanager,shire,sourcefile\n\
             Lee Frazer,,\n\
             Lee Frazer,Lanark,\n\
             Unknown Person,,\n\
             ,,Storms W12.xlsx\n",
        );
        let (ds, report) = load_dataset(f.path()).unwrap();
        assert!(ds.has_column("type"));
        assert!(ds.has_column("project"));
        let r = &ds.records;
        assert_eq!(r[0].shire.as_deref(), Some("Ayrshire"));
        assert_eq!(r[0].work_type.as_deref(), Some("Connections"));
        // Existing values are never overwritten.
        assert_eq!(r[1].shire.as_deref(), Some("Lanark"));
        assert_eq!(r[2].shire, None);
        assert_eq!(r[2].work_type, None);
        assert_eq!(r[3].project.as_deref(), Some("Storms"));
        assert_eq!(report.derived_fields, 5);
    }

    #[test]
    fn unsupported_and_missing_files_are_errors() {
        let f = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(load_dataset(f.path()), Err(LoadError::UnsupportedFormat(_))));
        assert!(matches!(
            load_dataset(Path::new("/definitely/not/here.csv")),
            Err(LoadError::FileNotFound(_))
        ));
    }

    #[test]
    fn completion_loads_and_degrades() {
        let f = csv_file("Section,%Complete\n Seg A ,\"87,5\"\nSeg B,n/a\n");
        let table = load_completion(f.path()).unwrap();
        assert!(table.has_columns);
        assert_eq!(table.rows[0].section.as_deref(), Some(" Seg A "));
        assert_eq!(table.rows[0].percent_complete, Some(87.5));
        assert_eq!(table.rows[1].percent_complete, None);

        let f = csv_file("section,other\nx,1\n");
        let table = load_completion(f.path()).unwrap();
        assert!(!table.has_columns);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn parquet_columns_outside_the_schema_are_ignored() {
        use polars::prelude::*;
        crate::logging::init_test();

        let item = Series::new("Item", &["9x220 CREOSOTE LV POLE", "cable cleats"]);
        let tags = Series::new(
            "tags",
            &[Series::new("", &[1i32, 2]), Series::new("", &[3i32])],
        );
        let mut frame = DataFrame::new(vec![item, tags]).unwrap();
        let f = Builder::new().suffix(".parquet").tempfile().unwrap();
        let out = std::fs::File::create(f.path()).unwrap();
        ParquetWriter::new(out).finish(&mut frame).unwrap();

        let (ds, report) = load_dataset(f.path()).unwrap();
        assert_eq!(report.loaded_rows, 2);
        assert!(ds.has_column("item"));
        assert!(!ds.has_column("tags"));
        assert_eq!(ds.records[1].item.as_deref(), Some("cable cleats"));
    }

    #[test]
    fn parquet_input_is_read_as_text() {
        use polars::df;
        use polars::prelude::*;

        let mut frame = df!(
            "DateToUse" => &["2025-02-03", "bad"],
            "Item" => &["9x275 CREOSOTE LV POLE", "x"],
            "qsub" => &["1,0", "2"]
        )
        .unwrap();
        let f = Builder::new().suffix(".parquet").tempfile().unwrap();
        let out = std::fs::File::create(f.path()).unwrap();
        ParquetWriter::new(out).finish(&mut frame).unwrap();

        let (ds, report) = load_dataset(f.path()).unwrap();
        assert_eq!(report.dropped_dates, 1);
        assert_eq!(ds.records.len(), 1);
        assert_eq!(ds.records[0].item.as_deref(), Some("9x275 CREOSOTE LV POLE"));
        assert_eq!(ds.records[0].date, NaiveDate::from_ymd_opt(2025, 2, 3));
    }
}
