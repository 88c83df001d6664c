use crate::classify::Classified;
use crate::registry::{active_wards, Category};
use crate::types::{col, AggregateRow, Completion, CompletionTable, Dataset, MoneySummary, Record};
use crate::util::{average, normalize_key, parse_locale_decimal};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const KM_TO_MILES: f64 = 0.621371;

/// Sum of `total`, and of `total - orig` over rows where both parse.
/// Absent columns and unparseable cells contribute zero.
pub fn money_totals(dataset: &Dataset, records: &[&Record]) -> MoneySummary {
    if !dataset.has_column(col::TOTAL) {
        return MoneySummary::default();
    }
    let has_orig = dataset.has_column(col::ORIG);
    let mut summary = MoneySummary::default();
    for r in records {
        let total = parse_locale_decimal(r.total.as_deref());
        if let Some(t) = total {
            summary.total += t;
        }
        if has_orig {
            if let (Some(t), Some(o)) = (total, parse_locale_decimal(r.orig.as_deref())) {
                summary.variation += t - o;
            }
        }
    }
    summary
}

/// Per-label totals for one category, ordered by label.
///
/// With a `qsub` column the parsed quantities are summed (unparseable
/// values count as zero); without one, rows are counted. `in_miles`
/// rescales equipment/conductor lengths only.
pub fn category_totals(
    dataset: &Dataset,
    classified: &[Classified<'_>],
    category: Category,
    in_miles: bool,
) -> Vec<AggregateRow> {
    let has_qsub = dataset.has_column(col::QSUB);
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for c in classified {
        let contribution = if has_qsub {
            parse_locale_decimal(c.record.qsub.as_deref()).unwrap_or(0.0)
        } else {
            1.0
        };
        *totals.entry(c.label).or_insert(0.0) += contribution;
    }
    let factor = if in_miles && category == Category::EquipmentConductor {
        KM_TO_MILES
    } else {
        1.0
    };
    totals
        .into_iter()
        .map(|(label, total)| AggregateRow { label: label.to_string(), total: total * factor })
        .collect()
}

/// Average `%complete` of the completion sections that appear among the
/// filtered segments, clamped to [0, 100]. Names are compared trimmed and
/// lower-cased.
pub fn completion_indicator(
    dataset: &Dataset,
    records: &[&Record],
    completion: &CompletionTable,
) -> Completion {
    if !dataset.has_column(col::SEGMENT) || !completion.has_columns {
        return Completion::NoData;
    }
    let segments: HashSet<String> = records
        .iter()
        .filter_map(|r| r.segment.as_deref())
        .map(normalize_key)
        .collect();
    let matched: Vec<f64> = completion
        .rows
        .iter()
        .filter(|row| {
            row.section
                .as_deref()
                .map_or(false, |s| segments.contains(&normalize_key(s)))
        })
        .filter_map(|row| row.percent_complete)
        .collect();
    match average(&matched) {
        Some(avg) => Completion::Percent(clamp_percent(avg)),
        None => Completion::NoData,
    }
}

pub fn clamp_percent(v: f64) -> f64 {
    v.clamp(0.0, 100.0)
}

/// Wards for every distinct region in the subset, for a map layer.
pub fn subset_wards(dataset: &Dataset, records: &[&Record]) -> Vec<String> {
    if !dataset.has_column(col::REGION) {
        return Vec::new();
    }
    let regions: BTreeSet<&str> = records.iter().filter_map(|r| r.region.as_deref()).collect();
    active_wards(regions)
}

/// Distinct segment codes under each project. `None` when either column
/// is missing.
pub fn project_segments(
    dataset: &Dataset,
    records: &[&Record],
) -> Option<BTreeMap<String, Vec<String>>> {
    if !(dataset.has_column(col::PROJECT) && dataset.has_column(col::SEGMENT_CODE)) {
        return None;
    }
    let mut map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for r in records {
        if let Some(project) = r.project.as_deref() {
            let entry = map.entry(project.to_string()).or_default();
            if let Some(code) = r.segment_code.as_deref() {
                entry.insert(code.to_string());
            }
        }
    }
    Some(
        map.into_iter()
            .map(|(project, codes)| (project, codes.into_iter().collect()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::types::CompletionRow;

    fn dataset(columns: &[&str], records: Vec<Record>) -> Dataset {
        Dataset {
            columns: columns.iter().map(|s| s.to_string()).collect(),
            records,
        }
    }

    fn money(total: Option<&str>, orig: Option<&str>) -> Record {
        Record {
            total: total.map(str::to_string),
            orig: orig.map(str::to_string),
            ..Record::default()
        }
    }

    fn item(text: &str, qsub: Option<&str>) -> Record {
        Record {
            item: Some(text.to_string()),
            qsub: qsub.map(str::to_string),
            ..Record::default()
        }
    }

    #[test]
    fn money_scenario() {
        let ds = dataset(&["total", "orig"], vec![money(Some("1 000,00"), Some("900,00"))]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        let m = money_totals(&ds, &refs);
        assert_eq!(m.total, 1000.0);
        assert_eq!(m.variation, 100.0);
    }

    #[test]
    fn variation_only_counts_rows_where_both_parse() {
        let ds = dataset(
            &["total", "orig"],
            vec![
                money(Some("500,00"), Some("x")),
                money(Some("200,00"), Some("150,00")),
                money(Some("bad"), Some("10,00")),
                money(None, None),
            ],
        );
        let refs: Vec<&Record> = ds.records.iter().collect();
        let m = money_totals(&ds, &refs);
        assert_eq!(m.total, 700.0);
        assert_eq!(m.variation, 50.0);
    }

    #[test]
    fn missing_money_columns_sum_to_zero() {
        let ds = dataset(&["orig"], vec![money(Some("5"), Some("1"))]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        assert_eq!(money_totals(&ds, &refs), MoneySummary::default());

        let ds = dataset(&["total"], vec![money(Some("5"), Some("1"))]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        let m = money_totals(&ds, &refs);
        assert_eq!((m.total, m.variation), (5.0, 0.0));

        let empty = dataset(&["total", "orig"], vec![]);
        assert_eq!(money_totals(&empty, &[]), MoneySummary::default());
    }

    #[test]
    fn pole_scenario() {
        let ds = dataset(
            &["item", "qsub"],
            vec![
                item("9x220 CREOSOTE LV POLE", Some("2,5")),
                item("9x275 CREOSOTE LV POLE", Some("1,0")),
            ],
        );
        let refs: Vec<&Record> = ds.records.iter().collect();
        let classified = classify(&ds, &refs, Category::Poles).unwrap();
        let rows = category_totals(&ds, &classified, Category::Poles, false);
        assert_eq!(
            rows,
            vec![
                AggregateRow { label: "9m".into(), total: 2.5 },
                AggregateRow { label: "9s".into(), total: 1.0 },
            ]
        );
    }

    #[test]
    fn totals_equal_classified_quantity_sum() {
        let ds = dataset(
            &["item", "qsub"],
            vec![
                item("9x220 CREOSOTE LV POLE", Some("2")),
                item("9x220 HV SINGLE POLE", Some("3,5")),
                item("12x305 H POLE HV Creosote", Some("oops")),
                item("12x305 HV SINGLE POLE", Some("1 000")),
                item("not a pole", Some("99")),
            ],
        );
        let refs: Vec<&Record> = ds.records.iter().collect();
        let classified = classify(&ds, &refs, Category::Poles).unwrap();
        let rows = category_totals(&ds, &classified, Category::Poles, false);
        let sum: f64 = rows.iter().map(|r| r.total).sum();
        let expected: f64 = classified
            .iter()
            .map(|c| parse_locale_decimal(c.record.qsub.as_deref()).unwrap_or(0.0))
            .sum();
        assert_eq!(sum, expected);
        assert_eq!(sum, 1005.5);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn counts_rows_without_quantity_column() {
        let ds = dataset(
            &["item"],
            vec![
                item("Transformer 1ph 50kVA", None),
                item("Transformer 1ph 50kVA", None),
                item("Transformer 3ph 200kVA", None),
            ],
        );
        let refs: Vec<&Record> = ds.records.iter().collect();
        let classified = classify(&ds, &refs, Category::Transformers).unwrap();
        let rows = category_totals(&ds, &classified, Category::Transformers, false);
        assert_eq!(rows[0], AggregateRow { label: "TX 1ph (50kVA)".into(), total: 2.0 });
        assert_eq!(rows[1], AggregateRow { label: "TX 3ph (200kVA)".into(), total: 1.0 });
    }

    #[test]
    fn miles_toggle_only_touches_equipment() {
        let ds = dataset(
            &["item", "qsub"],
            vec![
                item("Oak - 100mm² AAAC bare (1000m drums)", Some("10")),
                item("LV Marker Tape (365m roll)", Some("2,5")),
                item("9x220 CREOSOTE LV POLE", Some("4")),
                item("Transformer 1ph 25kVA", Some("1")),
            ],
        );
        let refs: Vec<&Record> = ds.records.iter().collect();
        for category in Category::ALL {
            let classified = classify(&ds, &refs, category).unwrap();
            let km = category_totals(&ds, &classified, category, false);
            let miles = category_totals(&ds, &classified, category, true);
            for (a, b) in km.iter().zip(&miles) {
                assert_eq!(a.label, b.label);
                if category == Category::EquipmentConductor {
                    assert_eq!(b.total, a.total * KM_TO_MILES);
                } else {
                    assert_eq!(b.total, a.total);
                }
            }
        }
    }

    fn completion(rows: &[(&str, Option<f64>)]) -> CompletionTable {
        CompletionTable {
            has_columns: true,
            rows: rows
                .iter()
                .map(|(s, p)| CompletionRow { section: Some(s.to_string()), percent_complete: *p })
                .collect(),
        }
    }

    fn segment(name: &str) -> Record {
        Record { segment: Some(name.to_string()), ..Record::default() }
    }

    #[test]
    fn completion_averages_matching_sections() {
        let ds = dataset(&["segment"], vec![segment(" Kilmarnock North "), segment("TROON 11kV")]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        let table = completion(&[
            ("kilmarnock north", Some(40.0)),
            ("troon 11kv  ", Some(80.0)),
            ("elsewhere", Some(0.0)),
            ("troon 11kv", None),
        ]);
        assert_eq!(completion_indicator(&ds, &refs, &table), Completion::Percent(60.0));
    }

    #[test]
    fn completion_without_overlap_is_no_data() {
        let ds = dataset(&["segment"], vec![segment("a")]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        let table = completion(&[("b", Some(50.0))]);
        assert_eq!(completion_indicator(&ds, &refs, &table), Completion::NoData);

        let no_segment = dataset(&[], vec![segment("a")]);
        let refs: Vec<&Record> = no_segment.records.iter().collect();
        let table = completion(&[("a", Some(50.0))]);
        assert_eq!(completion_indicator(&no_segment, &refs, &table), Completion::NoData);
        assert_eq!(
            completion_indicator(&ds, &[], &CompletionTable::default()),
            Completion::NoData
        );
    }

    #[test]
    fn completion_is_clamped() {
        let ds = dataset(&["segment"], vec![segment("a")]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        assert_eq!(
            completion_indicator(&ds, &refs, &completion(&[("a", Some(130.0))])),
            Completion::Percent(100.0)
        );
        assert_eq!(
            completion_indicator(&ds, &refs, &completion(&[("a", Some(-5.0))])),
            Completion::Percent(0.0)
        );
        assert_eq!(clamp_percent(55.5), 55.5);
    }

    #[test]
    fn ayrshire_region_expands_to_troon() {
        let r = Record { region: Some("Ayrshire".to_string()), ..Record::default() };
        let ds = dataset(&["region"], vec![r]);
        let refs: Vec<&Record> = ds.records.iter().collect();
        let wards = subset_wards(&ds, &refs);
        assert!(wards.iter().any(|w| w == "Troon"));
        assert_eq!(wards.len(), 27);
    }

    #[test]
    fn project_segments_overview() {
        let mk = |p: &str, s: Option<&str>| Record {
            project: Some(p.to_string()),
            segment_code: s.map(str::to_string),
            ..Record::default()
        };
        let ds = dataset(
            &["project", "segmentcode"],
            vec![mk("Storms", Some("S2")), mk("Storms", Some("S1")), mk("Storms", Some("S2")), mk("PCB", None)],
        );
        let refs: Vec<&Record> = ds.records.iter().collect();
        let overview = project_segments(&ds, &refs).unwrap();
        assert_eq!(overview["Storms"], vec!["S1", "S2"]);
        assert!(overview["PCB"].is_empty());

        let ds = dataset(&["project"], vec![]);
        assert!(project_segments(&ds, &[]).is_none());
    }
}
