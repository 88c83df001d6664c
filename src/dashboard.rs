// Assembles one full recomputation of the dashboard from the immutable
// dataset: filters, money totals, completion, wards and the three
// category charts.
use crate::aggregate::{category_totals, completion_indicator, money_totals, project_segments, subset_wards};
use crate::classify::{classify, Classified};
use crate::filter::{apply_filters, FilterConfig, FilterOutcome};
use crate::registry::Category;
use crate::types::{
    AggregateRow, CategorySummary, Completion, CompletionTable, Dataset, MoneySummary, SummaryStats,
};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CategoryView<'a> {
    pub category: Category,
    pub unit: &'static str,
    pub classified: Vec<Classified<'a>>,
    pub bars: Vec<AggregateRow>,
}

/// Why a category has no chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skipped {
    NoItemColumn,
    NoMatches,
}

#[derive(Debug, Clone)]
pub struct Dashboard<'a> {
    pub filtered: FilterOutcome<'a>,
    pub money: MoneySummary,
    pub completion: Completion,
    pub wards: Vec<String>,
    pub project_segments: Option<BTreeMap<String, Vec<String>>>,
    pub categories: Vec<CategoryView<'a>>,
    pub skipped: Vec<(Category, Skipped)>,
}

impl<'a> Dashboard<'a> {
    pub fn category(&self, category: Category) -> Option<&CategoryView<'a>> {
        self.categories.iter().find(|v| v.category == category)
    }
}

pub fn build<'a>(
    dataset: &'a Dataset,
    completion: &CompletionTable,
    config: &FilterConfig,
    in_miles: bool,
) -> Dashboard<'a> {
    let filtered = apply_filters(dataset, config);
    let records = &filtered.records;

    let mut categories = Vec::new();
    let mut skipped = Vec::new();
    for category in Category::ALL {
        match classify(dataset, records, category) {
            None => skipped.push((category, Skipped::NoItemColumn)),
            Some(classified) if classified.is_empty() => {
                skipped.push((category, Skipped::NoMatches))
            }
            Some(classified) => {
                let bars = category_totals(dataset, &classified, category, in_miles);
                categories.push(CategoryView {
                    category,
                    unit: category.unit(in_miles),
                    classified,
                    bars,
                });
            }
        }
    }

    let dashboard = Dashboard {
        money: money_totals(dataset, records),
        completion: completion_indicator(dataset, records, completion),
        wards: subset_wards(dataset, records),
        project_segments: project_segments(dataset, records),
        categories,
        skipped,
        filtered,
    };
    info!(
        rows = dashboard.filtered.records.len(),
        charts = dashboard.categories.len(),
        "dashboard recomputed"
    );
    dashboard
}

pub fn summary(d: &Dashboard<'_>) -> SummaryStats {
    SummaryStats {
        description: d.filtered.description.clone(),
        filtered_rows: d.filtered.records.len(),
        total: d.money.total,
        variation: d.money.variation,
        percent_complete: match d.completion {
            Completion::Percent(p) => Some(p),
            Completion::NoData => None,
        },
        active_wards: d.wards.clone(),
        categories: d
            .categories
            .iter()
            .map(|v| CategorySummary {
                category: v.category.name().to_string(),
                unit: v.unit.to_string(),
                rows: v.bars.clone(),
            })
            .collect(),
    }
}
