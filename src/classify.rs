use crate::registry::Category;
use crate::types::{col, Dataset, Record};
use tracing::debug;

/// A filtered record together with the canonical label it matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified<'a> {
    pub label: &'static str,
    pub record: &'a Record,
}

/// Label every record whose `item` matches a key of `category`.
///
/// Records without a match are left out. Returns `None` when the dataset
/// has no `item` column, in which case the category is simply not shown.
pub fn classify<'a>(
    dataset: &Dataset,
    records: &[&'a Record],
    category: Category,
) -> Option<Vec<Classified<'a>>> {
    if !dataset.has_column(col::ITEM) {
        debug!(category = %category, "no item column; skipping category");
        return None;
    }
    let classified: Vec<Classified<'a>> = records
        .iter()
        .filter_map(|&record| {
            let label = category.label_for(record.item.as_deref()?)?;
            Some(Classified { label, record })
        })
        .collect();
    debug!(category = %category, matched = classified.len(), of = records.len(), "classified");
    Some(classified)
}
