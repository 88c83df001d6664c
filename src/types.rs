use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tabled::Tabled;

/// Normalized (trimmed, lower-cased) column names the core knows about.
pub mod col {
    pub const DATE: &str = "datetouse";
    pub const SHIRE: &str = "shire";
    pub const PROJECT: &str = "project";
    pub const PROJECT_MANAGER: &str = "projectmanager";
    pub const SEGMENT_CODE: &str = "segmentcode";
    pub const TYPE: &str = "type";
    pub const ITEM: &str = "item";
    pub const QSUB: &str = "qsub";
    pub const TOTAL: &str = "total";
    pub const ORIG: &str = "orig";
    pub const REGION: &str = "region";
    pub const SEGMENT: &str = "segment";
    pub const POLE: &str = "pole";
    pub const SEGMENT_DESC: &str = "segmentdesc";
    pub const SOURCE_FILE: &str = "sourcefile";

    pub const SECTION: &str = "section";
    pub const PERCENT_COMPLETE: &str = "%complete";

    /// Every name read from either dataset.
    pub const KNOWN: [&str; 17] = [
        DATE,
        SHIRE,
        PROJECT,
        PROJECT_MANAGER,
        SEGMENT_CODE,
        TYPE,
        ITEM,
        QSUB,
        TOTAL,
        ORIG,
        REGION,
        SEGMENT,
        POLE,
        SEGMENT_DESC,
        SOURCE_FILE,
        SECTION,
        PERCENT_COMPLETE,
    ];
}

/// One row of the works dataset after ingestion.
///
/// Everything except the date stays as text: quantities and money are
/// locale-formatted strings and are only parsed where they are summed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub date: Option<NaiveDate>,
    pub shire: Option<String>,
    pub project: Option<String>,
    pub project_manager: Option<String>,
    pub segment_code: Option<String>,
    pub work_type: Option<String>,
    pub item: Option<String>,
    pub qsub: Option<String>,
    pub total: Option<String>,
    pub orig: Option<String>,
    pub region: Option<String>,
    pub segment: Option<String>,
    pub pole: Option<String>,
    pub segment_desc: Option<String>,
    pub source_file: Option<String>,
}

/// The loaded dataset. `columns` records which normalized columns the
/// source actually carried, which is what drives graceful degradation.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: BTreeSet<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRow {
    pub section: Option<String>,
    pub percent_complete: Option<f64>,
}

/// Secondary dataset holding `%complete` per section.
#[derive(Debug, Clone, Default)]
pub struct CompletionTable {
    pub has_columns: bool,
    pub rows: Vec<CompletionRow>,
}

/// One bar of a category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MoneySummary {
    pub total: f64,
    pub variation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    Percent(f64),
    NoData,
}

/// Fixed projection used for drill-down display and every export sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DetailRow {
    #[tabled(rename = "mapped")]
    pub mapped: String,
    #[tabled(rename = "datetouse", display_with = "display_date")]
    pub date: Option<NaiveDate>,
    #[tabled(rename = "pole", display_with = "display_text")]
    pub pole: Option<String>,
    #[tabled(rename = "projectmanager", display_with = "display_text")]
    pub project_manager: Option<String>,
    #[tabled(rename = "qsub", display_with = "display_text")]
    pub qsub: Option<String>,
    #[tabled(rename = "project", display_with = "display_text")]
    pub project: Option<String>,
    #[tabled(rename = "shire", display_with = "display_text")]
    pub shire: Option<String>,
    #[tabled(rename = "segmentdesc", display_with = "display_text")]
    pub segment_desc: Option<String>,
    #[tabled(rename = "sourcefile", display_with = "display_text")]
    pub source_file: Option<String>,
}

impl DetailRow {
    pub const HEADERS: [&'static str; 9] = [
        "mapped",
        "datetouse",
        "pole",
        "projectmanager",
        "qsub",
        "project",
        "shire",
        "segmentdesc",
        "sourcefile",
    ];

    /// Text columns after `mapped` and `datetouse`, in header order.
    pub fn text_columns(&self) -> [Option<&str>; 7] {
        [
            self.pole.as_deref(),
            self.project_manager.as_deref(),
            self.qsub.as_deref(),
            self.project.as_deref(),
            self.shire.as_deref(),
            self.segment_desc.as_deref(),
            self.source_file.as_deref(),
        ]
    }
}

fn display_text(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

fn display_date(v: &Option<NaiveDate>) -> String {
    v.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// Rendered bar row for console previews and the CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AggregateLine {
    #[serde(rename = "Mapped")]
    #[tabled(rename = "Mapped")]
    pub label: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub unit: String,
    pub rows: Vec<AggregateRow>,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub description: String,
    pub filtered_rows: usize,
    pub total: f64,
    pub variation: f64,
    pub percent_complete: Option<f64>,
    pub active_wards: Vec<String>,
    pub categories: Vec<CategorySummary>,
}
