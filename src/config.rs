use crate::filter::{DateFilter, FilterConfig, Selection};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateMode {
    Day,
    Week,
    Month,
    Year,
    Range,
}

/// Works dashboard: filter, classify and export utilities work records.
#[derive(Parser, Debug)]
#[command(name = "works-dashboard", version, about)]
pub struct Args {
    /// Aggregated works dataset (.parquet or .csv)
    #[arg(long, env = "WORKS_DATA", default_value = "aggregated.parquet")]
    pub data: PathBuf,

    /// Section completion dataset (.parquet or .csv)
    #[arg(long, env = "WORKS_COMPLETION")]
    pub completion: Option<PathBuf>,

    /// Directory receiving workbooks, CSV tables and summary.json
    #[arg(long, env = "WORKS_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Shires to keep (repeatable; "All" or nothing keeps every shire)
    #[arg(long)]
    pub shire: Vec<String>,

    #[arg(long)]
    pub project: Vec<String>,

    #[arg(long = "pm")]
    pub project_manager: Vec<String>,

    #[arg(long)]
    pub segment_code: Vec<String>,

    #[arg(long = "type")]
    pub work_type: Vec<String>,

    /// Date window
    #[arg(long, value_enum, default_value_t = DateMode::Year)]
    pub date_mode: DateMode,

    /// Day, week start or any day of the month (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Year for --date-mode year (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub start: Option<NaiveDate>,

    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Show equipment/conductor lengths in miles
    #[arg(long)]
    pub miles: bool,

    /// More log output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn date_filter(&self, today: NaiveDate) -> DateFilter {
        let date = self.date.unwrap_or(today);
        match self.date_mode {
            DateMode::Day => DateFilter::Day(date),
            DateMode::Week => DateFilter::Week(date),
            DateMode::Month => DateFilter::Month(date),
            DateMode::Year => DateFilter::Year(self.year.unwrap_or(today.year())),
            DateMode::Range => {
                let start = self.start.unwrap_or(date);
                DateFilter::Range {
                    start,
                    end: self.end.unwrap_or(start),
                }
            }
        }
    }

    pub fn filter_config(&self, today: NaiveDate) -> FilterConfig {
        FilterConfig {
            shire: Selection::from_values(self.shire.iter().cloned()),
            project: Selection::from_values(self.project.iter().cloned()),
            project_manager: Selection::from_values(self.project_manager.iter().cloned()),
            segment_code: Selection::from_values(self.segment_code.iter().cloned()),
            work_type: Selection::from_values(self.work_type.iter().cloned()),
            date: self.date_filter(today),
        }
    }
}
