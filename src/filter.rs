// Cascading facet filters and the date window.
//
// Every function here is pure: it borrows from the immutable dataset and
// returns a new subset, so a filter change is just a re-run from the base.
use crate::types::{col, Dataset, Record};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Sentinel offered first in every option list.
pub const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    /// An empty selection, or one that includes the sentinel, means no
    /// restriction.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() || set.contains(ALL) {
            Selection::All
        } else {
            Selection::Only(set)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn allows(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => value.map_or(false, |v| set.contains(v)),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "[{}]", ALL),
            Selection::Only(set) => {
                let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "[{}]", joined.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    Shire,
    Project,
    ProjectManager,
    SegmentCode,
    Type,
}

impl Facet {
    /// Evaluation order of the chain.
    pub const ORDER: [Facet; 5] = [
        Facet::Shire,
        Facet::Project,
        Facet::ProjectManager,
        Facet::SegmentCode,
        Facet::Type,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Facet::Shire => col::SHIRE,
            Facet::Project => col::PROJECT,
            Facet::ProjectManager => col::PROJECT_MANAGER,
            Facet::SegmentCode => col::SEGMENT_CODE,
            Facet::Type => col::TYPE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Facet::Shire => "Shire",
            Facet::Project => "Project",
            Facet::ProjectManager => "Project Manager",
            Facet::SegmentCode => "Segment Code",
            Facet::Type => "Type",
        }
    }

    /// Facet whose selection narrows this facet's options.
    pub fn parent(self) -> Option<Facet> {
        match self {
            Facet::Project | Facet::ProjectManager => Some(Facet::Shire),
            _ => None,
        }
    }

    pub fn value(self, r: &Record) -> Option<&str> {
        match self {
            Facet::Shire => r.shire.as_deref(),
            Facet::Project => r.project.as_deref(),
            Facet::ProjectManager => r.project_manager.as_deref(),
            Facet::SegmentCode => r.segment_code.as_deref(),
            Facet::Type => r.work_type.as_deref(),
        }
    }
}

/// Exactly one date window is active per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    Day(NaiveDate),
    /// Seven days starting at the given date, both ends inclusive.
    Week(NaiveDate),
    /// Any day in the month (and year) of the given date.
    Month(NaiveDate),
    Year(i32),
    Range { start: NaiveDate, end: NaiveDate },
}

impl DateFilter {
    pub fn contains(&self, d: NaiveDate) -> bool {
        match *self {
            DateFilter::Day(day) => d == day,
            DateFilter::Week(start) => d >= start && d <= start + Duration::days(6),
            DateFilter::Month(m) => d.year() == m.year() && d.month() == m.month(),
            DateFilter::Year(y) => d.year() == y,
            DateFilter::Range { start, end } => d >= start && d <= end,
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            DateFilter::Day(day) => day.to_string(),
            DateFilter::Week(start) => format!("{} to {}", start, start + Duration::days(6)),
            DateFilter::Month(m) => m.format("%B %Y").to_string(),
            DateFilter::Year(y) => y.to_string(),
            DateFilter::Range { start, end } => format!("{} to {}", start, end),
        }
    }
}

/// Current filter state, handed in by whatever front end drives the core.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub shire: Selection,
    pub project: Selection,
    pub project_manager: Selection,
    pub segment_code: Selection,
    pub work_type: Selection,
    pub date: DateFilter,
}

impl FilterConfig {
    pub fn new(date: DateFilter) -> Self {
        FilterConfig {
            shire: Selection::All,
            project: Selection::All,
            project_manager: Selection::All,
            segment_code: Selection::All,
            work_type: Selection::All,
            date,
        }
    }

    pub fn selection(&self, facet: Facet) -> &Selection {
        match facet {
            Facet::Shire => &self.shire,
            Facet::Project => &self.project,
            Facet::ProjectManager => &self.project_manager,
            Facet::SegmentCode => &self.segment_code,
            Facet::Type => &self.work_type,
        }
    }
}

/// Options offered for one facet and the subset left after applying it.
#[derive(Debug, Clone)]
pub struct FacetStep<'a> {
    pub options: Vec<String>,
    pub records: Vec<&'a Record>,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub records: Vec<&'a Record>,
    pub options: BTreeMap<Facet, Vec<String>>,
    pub description: String,
}

fn restrict<'a>(subset: &[&'a Record], facet: Facet, selection: &Selection) -> Vec<&'a Record> {
    if selection.is_all() {
        return subset.to_vec();
    }
    subset
        .iter()
        .copied()
        .filter(|r| selection.allows(facet.value(r)))
        .collect()
}

/// `"All"` followed by the sorted distinct values of `facet` in `subset`,
/// after narrowing by the parent selection.
pub fn facet_options(
    column_present: bool,
    subset: &[&Record],
    facet: Facet,
    parent: Option<(Facet, &Selection)>,
) -> Vec<String> {
    let mut options = vec![ALL.to_string()];
    if !column_present {
        return options;
    }
    let parent_ok = |r: &Record| parent.map_or(true, |(p, sel)| sel.allows(p.value(r)));
    let distinct: BTreeSet<&str> = subset
        .iter()
        .filter(|r| parent_ok(r))
        .filter_map(|r| facet.value(r))
        .collect();
    options.extend(distinct.into_iter().map(str::to_string));
    options
}

/// One link of the chain: options for `facet` and the narrowed subset.
/// A missing column offers only `"All"` and restricts nothing.
pub fn facet_step<'a>(
    column_present: bool,
    subset: &[&'a Record],
    facet: Facet,
    selection: &Selection,
    parent: Option<(Facet, &Selection)>,
) -> FacetStep<'a> {
    let options = facet_options(column_present, subset, facet, parent);
    if !column_present {
        return FacetStep { options, records: subset.to_vec() };
    }
    let narrowed = match parent {
        Some((p, sel)) => restrict(subset, p, sel),
        None => subset.to_vec(),
    };
    FacetStep { options, records: restrict(&narrowed, facet, selection) }
}

/// Keep records whose date falls in the window. Without a date column the
/// window restricts nothing.
pub fn apply_date<'a>(dataset: &Dataset, subset: Vec<&'a Record>, date: &DateFilter) -> Vec<&'a Record> {
    if !dataset.has_column(col::DATE) {
        return subset;
    }
    subset
        .into_iter()
        .filter(|r| r.date.map_or(false, |d| date.contains(d)))
        .collect()
}

static NO_RESTRICTION: Selection = Selection::All;

/// A facet without a column restricts nothing, neither on its own nor as
/// the parent of another facet.
fn effective_selection<'c>(dataset: &Dataset, config: &'c FilterConfig, facet: Facet) -> &'c Selection {
    if dataset.has_column(facet.column()) {
        config.selection(facet)
    } else {
        &NO_RESTRICTION
    }
}

/// Run the whole chain: shire, project, project manager, segment code,
/// type, then the date window.
///
/// Project and project-manager options are both narrowed by the shire
/// selection only; the project-manager list is taken from the subset as it
/// stood before the project selection was applied.
pub fn apply_filters<'a>(dataset: &'a Dataset, config: &FilterConfig) -> FilterOutcome<'a> {
    let base: Vec<&Record> = dataset.records.iter().collect();
    let mut options = BTreeMap::new();
    let mut after: BTreeMap<Facet, Vec<&Record>> = BTreeMap::new();
    let mut current = base;

    let effective = |facet: Facet| effective_selection(dataset, config, facet);

    for facet in Facet::ORDER {
        let present = dataset.has_column(facet.column());
        let selection = effective(facet);
        let parent = facet.parent().map(|p| (p, effective(p)));
        let step = facet_step(present, &current, facet, selection, parent);

        let offered = match facet.parent() {
            Some(p) if facet != Facet::Project => {
                let source = after.get(&p).map(Vec::as_slice).unwrap_or(&[]);
                facet_options(present, source, facet, parent)
            }
            _ => step.options,
        };
        options.insert(facet, offered);
        after.insert(facet, step.records.clone());
        current = step.records;
    }

    let records = apply_date(dataset, current, &config.date);
    let date_str = if dataset.has_column(col::DATE) {
        config.date.describe()
    } else {
        "all dates".to_string()
    };
    let description = format!(
        "({}, Shires: {}, Projects: {}, PMs: {})",
        date_str,
        effective(Facet::Shire),
        effective(Facet::Project),
        effective(Facet::ProjectManager)
    );
    debug!(rows = records.len(), %description, "filters applied");
    FilterOutcome { records, options, description }
}
