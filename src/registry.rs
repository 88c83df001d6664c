// Curated lookup tables that turn the long descriptions found in works
// exports into short canonical labels, plus the organisational tables used
// to derive shire/project columns and to expand regions into wards.
//
// All tables are ordered: lookups that can hit several keys resolve to the
// first key in table order.
use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};
use std::collections::BTreeSet;
use std::fmt;

const POLE_KEYS: &[(&str, &str)] = &[
    ("9x220 BIOCIDE LV POLE", "9m B"),
    ("9x275 BIOCIDE LV POLE", "9s B"),
    ("9x220 CREOSOTE LV POLE", "9m"),
    ("9x275 CREOSOTE LV POLE", "9s"),
    ("9x220 HV SINGLE POLE", "9m"),
    ("9x275 HV SINGLE POLE", "9s"),
    ("9x295 HV SINGLE POLE", "9es"),
    ("9x315 HV SINGLE POLE", "9esp"),
    ("10x230 BIOCIDE LV POLE", "10m B"),
    ("10x230 HV SINGLE POLE", "10m"),
    ("10x285 BIOCIDE LV POLE", "10s B"),
    ("10x285 H POLE HV Creosote", "10s"),
    ("10x285 HV SINGLE POLE", "10s"),
    ("10x305 HV SINGLE POLE", "10es"),
    ("11x295 HV SINGLE POLE", "11s"),
    ("11x295 H POLE HV Creosote", "11s"),
    ("11x295 BIOCIDE LV POLE", "11sB"),
    ("12x250 BIOCIDE LV POLE", "12m B"),
    ("12x305 BIOCIDE LV POLE", "12s B"),
    ("12x250 CREOSOTE LV POLE", "12m"),
    ("12x305 CREOSOTE LV POLE", "12s"),
    ("12x305 H POLE HV Creosote", "12s"),
    ("12x250 HV SINGLE POLE", "12m"),
    ("12x305 HV SINGLE POLE", "12s"),
    ("12x325 HV SINGLE POLE", "12es"),
    ("12x345 HV SINGLE POLE", "12esp"),
    ("13x260 BIOCIDE LV POLE", "13m B"),
    ("13x320 BIOCIDE LV POLE", "13s B"),
    ("13x260 CREOSOTE LV POLE", "13m"),
    ("13x320 CREOSOTE LV POLE", "13s"),
    ("13x260 HV SINGLE POLE", "13m"),
    ("13x320 HV SINGLE POLE", "13s"),
    ("13x340 HV SINGLE POLE", "13es"),
    ("13x365 HV SINGLE POLE", "13esp"),
    ("14x275 BIOCIDE LV POLE", "14m B"),
    ("14x335 BIOCIDE LV POLE", "14s B"),
    ("14x275 CREOSOTE LV POLE", "14m"),
    ("14x335 CREOSOTE LV POLE", "14s"),
    ("14x275 HV SINGLE POLE", "14m"),
    ("14x335 HV SINGLE POLE", "14s"),
    ("14x355 HV SINGLE POLE", "14es"),
    ("14x375 HV SINGLE POLE", "14esp"),
    ("16x305 BIOCIDE LV POLE", "16m B"),
    ("16x365 BIOCIDE LV POLE", "16s B"),
    ("16x305 CREOSOTE LV POLE", "16m"),
    ("16x365 CREOSOTE LV POLE", "16s"),
    ("16x305 HV SINGLE POLE", "16m"),
    ("16x365 HV SINGLE POLE", "16s"),
    ("16x385 HV SINGLE POLE", "16es"),
    ("16x405 HV SINGLE POLE", "16esp"),
];

const EQUIPMENT_KEYS: &[(&str, &str)] = &[
    // AAAC
    ("Hazel - 50mm² AAAC bare (1000m drums)", "Hazel 50mm²"),
    ("Oak - 100mm² AAAC bare (1000m drums)", "Oak 100mm²"),
    ("Ash - 150mm² AAAC bare (1000m drums)", "Ash 150mm²"),
    ("Poplar - 200mm² AAAC bare (1000m drums)", "Poplar 200mm²"),
    ("Upas - 300mm² AAAC bare (1000m drums)", "Upas 300mm²"),
    ("Poplar OPPC - 200mm² AAAC equivalent bare", "Poplar OPPC 200mm²"),
    ("Upas OPPC - 300mm² AAAC equivalent bare", "Upas OPPC 300mm²"),
    // ACSR
    ("Gopher - 25mm² ACSR bare (1000m drums)", "Gopher 25mm²"),
    ("Caton - 25mm² Compacted ACSR bare (1000m drums)", "Caton 25mm²"),
    ("Rabbit - 50mm² ACSR bare (1000m drums)", "Rabbit 50mm²"),
    ("Wolf - 150mm² ACSR bare (1000m drums)", "Wolf 150mm²"),
    ("Horse - 70mm² ACSR bare", "Horse 70mm²"),
    ("Dog - 100mm² ACSR bare (1000m drums)", "Dog 100mm²"),
    ("Dingo - 150mm² ACSR bare (1000m drums)", "Dingo 150mm²"),
    // Copper
    ("Hard Drawn Copper 16mm² ( 3/2.65mm ) (500m drums)", "Copper 16mm²"),
    ("Hard Drawn Copper 32mm² ( 3/3.75mm ) (1000m drums)", "Copper 32mm²"),
    ("Hard Drawn Copper 70mm² (500m drums)", "Copper 70mm²"),
    ("Hard Drawn Copper 100mm² (500m drums)", "Copper 100mm²"),
    // PVC covered
    ("35mm² Copper (Green / Yellow PVC covered) (50m drums)", "Copper 35mm² GY PVC"),
    ("70mm² Copper (Green / Yellow PVC covered) (50m drums)", "Copper 70mm² GY PVC"),
    ("35mm² Copper (Blue PVC covered) (50m drums)", "Copper 35mm² Blue PVC"),
    ("70mm² Copper (Blue PVC covered) (50m drums)", "Copper 70mm² Blue PVC"),
    // Double insulated
    ("35mm² Double Insulated (Brown) (50m drums)", "Double Insulated 35mm² Brown"),
    ("35mm² Double Insulated (Blue) (50m drums)", "Double Insulated 35mm² Blue"),
    ("70mm² Double Insulated (Brown) (50m drums)", "Double Insulated 70mm² Brown"),
    ("70mm² Double Insulated (Blue) (50m drums)", "Double Insulated 70mm² Blue"),
    ("120mm² Double Insulated (Brown) (50m drums)", "Double Insulated 120mm² Brown"),
    ("120mm² Double Insulated (Blue) (50m drums)", "Double Insulated 120mm² Blue"),
    // LV cable
    ("LV Cable 1ph 4mm Concentric (250m drums)", "LV 1ph 4mm Concentric"),
    ("LV Cable 1ph 25mm CNE (250m drums)", "LV 1ph 25mm CNE"),
    ("LV Cable 1ph 25mm SNE (100m drums)", "LV 1ph 25mm SNE"),
    ("LV Cable 1ph 35mm CNE (250m drums)", "LV 1ph 35mm CNE"),
    ("LV Cable 1ph 35mm SNE (100m drums)", "LV 1ph 35mm SNE"),
    ("LV Cable 3ph 35mm Cu Split Con (250m drums)", "LV 3ph 35mm Cu Split Con"),
    ("LV Cable 3ph 35mm SNE (250m drums)", "LV 3ph 35mm SNE"),
    ("LV Cable 3ph 35mm CNE (250m drums)", "LV 3ph 35mm CNE"),
    ("LV Cable 3ph 35mm CNE Al (LSOH) (250m drums)", "LV 3ph 35mm CNE Al LSOH"),
    ("LV Cable 3c 95mm W/F (250m drums)", "LV 3c 95mm W/F"),
    ("LV Cable 3c 185mm W/F (250m drums)", "LV 3c 185mm W/F"),
    ("LV Cable 3c 300mm W/F (250m drums)", "LV 3c 300mm W/F"),
    ("LV Cable 4c 95mm W/F (250m drums)", "LV 4c 95mm W/F"),
    ("LV Cable 4c 185mm W/F (250m drums)", "LV 4c 185mm W/F"),
    ("LV Cable 4c 240mm W/F (250m drums)", "LV 4c 240mm W/F"),
    ("LV Marker Tape (365m roll)", "LV Marker Tape"),
    // 11kV
    ("11kv Cable 95mm 3c Poly (250m drums)", "11kV 3c 95mm Poly"),
    ("11kv Cable 185mm 3c Poly (250m drums)", "11kV 3c 185mm Poly"),
    ("11kv Cable 300mm 3c Poly (250m drums)", "11kV 3c 300mm Poly"),
    ("11kv Cable 95mm 1c Poly (250m drums)", "11kV 1c 95mm Poly"),
    ("11kv Cable 185mm 1c Poly (250m drums)", "11kV 1c 185mm Poly"),
    ("11kv Cable 300mm 1c Poly (250m drums)", "11kV 1c 300mm Poly"),
    ("11kV Marker Tape (40m roll)", "11kV Marker Tape"),
];

const TRANSFORMER_KEYS: &[(&str, &str)] = &[
    ("Transformer 1ph 50kVA", "TX 1ph (50kVA)"),
    ("Transformer 3ph 50kVA", "TX 3ph (50kVA)"),
    ("Transformer 1ph 100kVA", "TX 1ph (100kVA)"),
    ("Transformer 1ph 25kVA", "TX 1ph (25kVA)"),
    ("Transformer 3ph 200kVA", "TX 3ph (200kVA)"),
    ("Transformer 3ph 100kVA", "TX 3ph (100kVA)"),
];

/// Project manager name (including known misspellings) -> (shire, segment type).
const PROJECT_MANAGERS: &[(&str, (&str, &str))] = &[
    ("Jonathon Mcclung", ("Ayrshire", "PCB")),
    ("Gary MacDonald", ("Ayrshire", "LV")),
    ("Jim Gaffney", ("Lanark", "PCB")),
    ("Calum Thomson", ("Ayrshire", "Connections")),
    ("Calum Thomsom", ("Ayrshire", "Connections")),
    ("Calum Thompson", ("Ayrshire", "Connections")),
    ("Andrew Galt", ("Ayrshire", "-")),
    ("Henry Gordon", ("Ayrshire", "-")),
    ("Jonathan Douglas", ("Ayrshire", "11 kV")),
    ("Jonathon Douglas", ("Ayrshire", "11 kV")),
    ("Matt", ("Lanark", "")),
    ("Lee Fraser", ("Ayrshire", "Connections")),
    ("Lee Frazer", ("Ayrshire", "Connections")),
    ("Mark", ("Lanark", "Connections")),
    ("Mark Nicholls", ("Ayrshire", "Connections")),
    ("Cameron Fleming", ("Lanark", "Connections")),
    ("Ronnie Goodwin", ("Lanark", "Connections")),
    ("Ian Young", ("Ayrshire", "Connections")),
    ("Matthew Watson", ("Lanark", "Connections")),
    ("Aileen Brese", ("Ayrshire", "Connections")),
    ("Mark McGoldrick", ("Lanark", "Connections")),
];

const REGIONS: &[(&str, &[&str])] = &[
    ("Newmilns", &["Irvine Valley"]),
    ("New Cumnock", &["New Cumnock"]),
    ("Kilwinning", &["Kilwinning"]),
    ("Stewarton", &["Irvine Valley"]),
    ("Kilbirnie", &["Kilbirnie and Beith"]),
    ("Coylton", &["Ayr East"]),
    ("Irvine", &["Irvine Valley", "Irvine East", "Irvine West"]),
    ("TROON", &["Troon"]),
    ("Ayr", &["Ayr East", "Ayr North", "Ayr West"]),
    ("Maybole", &["Maybole, North Carrick and Coylton"]),
    ("Clerkland", &["Irvine Valley"]),
    ("Glengarnock", &["Kilbirnie and Beith"]),
    (
        "Ayrshire",
        &[
            "North Coast and Cumbraes",
            "Prestwick",
            "Saltcoats and Stevenston",
            "Troon",
            "Ayr East",
            "Ayr North",
            "Ayr West",
            "Annick",
            "Ardrossan and Arran",
            "Dalry and West Kilbride",
            "Girvan and South Carrick",
            "Irvine East",
            "Irvine Valley",
            "Irvine West",
            "Kilbirnie and Beith",
            "Kilmarnock East and Hurlford",
            "Kilmarnock North",
            "Kilmarnock South",
            "Kilmarnock West and Crosshouse",
            "Kilwinning",
            "Kyle",
            "Maybole, North Carrick and Coylton",
            "Ayr, Carrick and Cumnock",
            "East_Ayrshire",
            "North_Ayrshre",
            "South_Ayrshre",
            "Doon Valley",
        ],
    ),
    (
        "Lanark",
        &[
            "Abronhill, Kildrum and the Village",
            "Airdrie Central",
            "Airdrie North",
            "Airdrie South",
            "Avondale and Stonehouse",
            "Ballochmyle",
            "Bellshill",
            "Blantyre",
            "Bothwell and Uddingston",
            "Cambuslang East",
            "Cambuslang West",
            "Clydesdale East",
            "Clydesdale North",
            "Clydesdale South",
            "Clydesdale West",
            "Coatbridge North and Glenboig",
            "Coatbridge South",
            "Coatbridge West",
            "Cumbernauld North",
            "Cumbernauld South",
            "East Kilbride Central North",
            "East Kilbride Central South",
            "East Kilbride East",
            "East Kilbride South",
            "East Kilbride West",
            "Fortissat",
            "Hamilton North and East",
            "Hamilton South",
            "Hamilton West and Earnock",
            "Mossend and Holytown",
            "Motherwell North",
            "Motherwell South East and Ravenscraig",
            "Motherwell West",
            "Rutherglen Central and North",
            "Rutherglen South",
            "Strathkelvin",
            "Thorniewood",
            "Wishaw",
            "Larkhall",
            "Airdrie and Shotts",
            "Cumbernauld, Kilsyth and Kirkintilloch East",
            "East Kilbride, Strathaven and Lesmahagow",
            "Lanark and Hamilton East",
            "Motherwell and Wishaw",
            "North_Lanarkshire",
            "South_Lanarkshire",
        ],
    ),
];

/// Lower-case keyword found in a source file name -> (shire, project).
const SOURCE_FILES: &[(&str, (&str, &str))] = &[
    ("33kv refurb", ("Ayrshire", "33kv Refurb")),
    ("connections", ("Ayrshire", "Connections")),
    ("storms", ("Ayrshire", "Storms")),
    ("11kv refurb", ("Ayrshire", "11kv Refurb")),
    ("aurs road", ("Ayrshire", "Aurs Road")),
    ("spen labour", ("Ayrshire", "SPEN Labour")),
    ("lvhi5", ("Ayrshire", "LV")),
    ("pcb", ("Ayrshire", "PCB")),
    ("lanark", ("Lanark", "")),
    ("11kv refur", ("Lanark", "11kv Refurb")),
    ("lv & esqcr", ("Lanark", "LV")),
    ("11kv rebuilt", ("Lanark", "11kV Rebuilt")),
    ("33kv rebuilt", ("Lanark", "33kV Rebuilt")),
];

fn key_set(keys: &[(&str, &str)]) -> RegexSet {
    RegexSetBuilder::new(keys.iter().map(|(k, _)| regex::escape(k)))
        .case_insensitive(true)
        .build()
        .expect("escaped registry keys always compile")
}

static POLE_SET: Lazy<RegexSet> = Lazy::new(|| key_set(POLE_KEYS));
static EQUIPMENT_SET: Lazy<RegexSet> = Lazy::new(|| key_set(EQUIPMENT_KEYS));
static TRANSFORMER_SET: Lazy<RegexSet> = Lazy::new(|| key_set(TRANSFORMER_KEYS));

/// The three item categories charted on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Poles,
    EquipmentConductor,
    Transformers,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Poles,
        Category::EquipmentConductor,
        Category::Transformers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Poles => "Poles",
            Category::EquipmentConductor => "Equipment / Conductor",
            Category::Transformers => "Transformers",
        }
    }

    /// Axis label for the summed quantity.
    pub fn unit(self, in_miles: bool) -> &'static str {
        match self {
            Category::EquipmentConductor if in_miles => "Length (Miles)",
            Category::EquipmentConductor => "Length (Km)",
            _ => "Quantity",
        }
    }

    /// Ordered `(long description, canonical label)` pairs.
    pub fn entries(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Category::Poles => POLE_KEYS,
            Category::EquipmentConductor => EQUIPMENT_KEYS,
            Category::Transformers => TRANSFORMER_KEYS,
        }
    }

    pub(crate) fn key_set(self) -> &'static RegexSet {
        match self {
            Category::Poles => &POLE_SET,
            Category::EquipmentConductor => &EQUIPMENT_SET,
            Category::Transformers => &TRANSFORMER_SET,
        }
    }

    /// Canonical label for a free-text item, case-insensitive substring
    /// match, first key in table order wins.
    pub fn label_for(self, item: &str) -> Option<&'static str> {
        let first = self.key_set().matches(item).into_iter().next()?;
        Some(self.entries()[first].1)
    }

    /// Distinct canonical labels in first-seen order.
    pub fn labels(self) -> Vec<&'static str> {
        let mut seen = BTreeSet::new();
        self.entries()
            .iter()
            .filter(|(_, label)| seen.insert(*label))
            .map(|(_, label)| *label)
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exact-name lookup; unknown managers resolve to nothing.
pub fn resolve_project_manager(name: &str) -> Option<(&'static str, &'static str)> {
    PROJECT_MANAGERS
        .iter()
        .find(|(pm, _)| *pm == name)
        .map(|(_, pair)| *pair)
}

/// Wards covered by a region. A name missing from the table is taken to
/// be a ward itself.
pub fn expand_region(region: &str) -> Vec<&str> {
    match REGIONS.iter().find(|(name, _)| *name == region) {
        Some((_, wards)) => wards.to_vec(),
        None => vec![region],
    }
}

/// Sorted, de-duplicated wards for a set of active regions.
pub fn active_wards<'a, I>(regions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let wards: BTreeSet<String> = regions
        .into_iter()
        .flat_map(expand_region)
        .map(str::to_string)
        .collect();
    wards.into_iter().collect()
}

/// (shire, project) for a source file name, keyed on the first keyword the
/// lower-cased name contains.
pub fn resolve_source_file(file_name: &str) -> Option<(&'static str, &'static str)> {
    let lower = file_name.to_lowercase();
    SOURCE_FILES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, pair)| *pair)
}
