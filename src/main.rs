// Entry point and interactive menu.
//
// Each menu action recomputes from the dataset loaded in option [1]:
// - [2] prints every dashboard panel and writes the per-category CSV
//   tables plus summary.json,
// - [3] drills into one bar of a category chart and exports that
//   category's workbook,
// - [4] flips the km/miles toggle for equipment and conductor lengths.
mod aggregate;
mod classify;
mod config;
mod dashboard;
mod error;
mod export;
mod filter;
mod loader;
mod logging;
mod output;
mod registry;
mod types;
mod util;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use config::Args;
use dashboard::{Dashboard, Skipped};
use filter::FilterConfig;
use registry::Category;
use std::io::{self, Write};
use tracing::{info, warn};
use types::{Completion, CompletionTable, Dataset};

/// State owned by one interactive session. The dataset is never modified
/// after loading; every view is derived from it again on demand.
struct Session {
    args: Args,
    config: FilterConfig,
    in_miles: bool,
    data: Option<Dataset>,
    completion: CompletionTable,
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

// Look for .env in the working directory, then next to the binary.
fn load_env() {
    if dotenvy::dotenv().is_err() {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

/// Handle option [1]: load the works dataset and, if configured, the
/// completion dataset.
fn handle_load(session: &mut Session) {
    match loader::load_dataset(&session.args.data) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} kept)",
                util::format_int(report.total_rows as i64),
                util::format_int(report.loaded_rows as i64)
            );
            if report.dropped_dates > 0 {
                println!(
                    "Note: {} rows dropped because datetouse could not be parsed.",
                    util::format_int(report.dropped_dates as i64)
                );
            }
            if report.parse_errors > 0 {
                println!(
                    "Note: {} unreadable rows skipped.",
                    util::format_int(report.parse_errors as i64)
                );
            }
            if report.derived_fields > 0 {
                println!(
                    "Info: filled {} blank shire/project/type fields from lookup tables.",
                    util::format_int(report.derived_fields as i64)
                );
            }
            session.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}", e);
        }
    }

    if let Some(path) = &session.args.completion {
        match loader::load_completion(path) {
            Ok(table) => {
                println!(
                    "Completion data: {} sections.",
                    util::format_int(table.rows.len() as i64)
                );
                session.completion = table;
            }
            Err(e) => {
                warn!(error = %e, "completion data unavailable");
                eprintln!("Could not load completion data: {}", e);
            }
        }
    }
    println!();
}

fn print_dashboard(d: &Dashboard<'_>) {
    println!("Total: {}", util::format_money(d.money.total));
    println!("Variation: {}", util::format_money(d.money.variation));
    println!("{}\n", d.filtered.description);

    match d.completion {
        Completion::Percent(p) => println!("Works Complete: {:.1}%\n", p),
        Completion::NoData => println!(
            "Works Complete: no matching sections found for the selected filters.\n"
        ),
    }

    for (facet, options) in &d.filtered.options {
        println!("{} options: {}", facet.label(), options.join(", "));
    }
    println!();

    if d.wards.is_empty() {
        println!("No matching regions found for the selected filters.\n");
    } else {
        println!("Active wards ({}): {}\n", d.wards.len(), d.wards.join("; "));
    }

    match &d.project_segments {
        Some(projects) if projects.is_empty() => {
            println!("No projects found for the selected filters.\n")
        }
        Some(projects) => {
            for (project, segments) in projects {
                println!("Project: {} ({} segments)", project, segments.len());
                if !segments.is_empty() {
                    println!("  {}", segments.join(", "));
                }
            }
            println!();
        }
        None => println!("Project or Segment Code columns not found in the data.\n"),
    }

    for view in &d.categories {
        output::preview_table(
            &format!("{} Overview", view.category),
            Some(view.unit),
            &output::aggregate_lines(&view.bars),
            50,
        );
    }
    for (category, reason) in &d.skipped {
        match reason {
            Skipped::NoItemColumn => println!("{}: no item column in the data; chart skipped.", category),
            Skipped::NoMatches => println!("{}: no matching items for the selected filters.", category),
        }
    }
    println!();
}

/// Handle option [2]: recompute and print every panel, then write the
/// category tables and summary.json.
fn handle_dashboard(session: &Session) {
    let Some(data) = &session.data else {
        println!("Error: No data loaded. Please load the files first (option 1).\n");
        return;
    };
    let d = dashboard::build(data, &session.completion, &session.config, session.in_miles);
    print_dashboard(&d);

    let out_dir = &session.args.out_dir;
    for view in &d.categories {
        let path = out_dir.join(format!("{}_Totals.csv", export::category_file_stem(view.category)));
        if let Err(e) = output::write_csv(&path, &output::aggregate_lines(&view.bars)) {
            eprintln!("Write error: {}", e);
        }
    }
    if let Err(e) = output::write_json(&out_dir.join("summary.json"), &dashboard::summary(&d)) {
        eprintln!("Write error: {}", e);
    }
    println!("Outputs saved to {}\n", out_dir.display());
}

/// Handle option [3]: pick a category bar, show its rows and export the
/// whole category as a workbook.
fn handle_drill_down(session: &Session) {
    let Some(data) = &session.data else {
        println!("Error: No data loaded. Please load the files first (option 1).\n");
        return;
    };
    let d = dashboard::build(data, &session.completion, &session.config, session.in_miles);

    for (i, category) in Category::ALL.iter().enumerate() {
        match d.category(*category) {
            Some(view) => println!("[{}] {} ({} bars)", i + 1, category, view.bars.len()),
            None => println!("[{}] {} (no chart)", i + 1, category),
        }
    }
    let Some(category) = read_choice()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| Category::ALL.get(i).copied())
    else {
        println!("Invalid choice.\n");
        return;
    };
    let Some(view) = d.category(category) else {
        println!("{}: nothing to drill into for the selected filters.\n", category);
        return;
    };

    for (i, bar) in view.bars.iter().enumerate() {
        println!("[{}] {} ({})", i + 1, bar.label, util::format_number(bar.total, 2));
    }
    let answer = read_line("Enter bar number or label: ");
    let label = match answer.parse::<usize>() {
        Ok(n) => n.checked_sub(1).and_then(|i| view.bars.get(i)).map(|b| b.label.as_str()),
        Err(_) => view.bars.iter().find(|b| b.label == answer).map(|b| b.label.as_str()),
    };
    let Some(label) = label else {
        if category.labels().contains(&answer.as_str()) {
            println!("{}: no rows under the selected filters.\n", answer);
        } else {
            println!("Invalid choice.\n");
        }
        return;
    };

    let rows = export::drill_down(&view.classified, label);
    println!();
    output::preview_table(&format!("Details for: {}", label), None, &rows, 25);

    match export::export_category(view.category, &view.bars, &view.classified, &session.args.out_dir) {
        Ok(path) => println!("Excel: {} Details saved to {}\n", view.category, path.display()),
        Err(e) => {
            warn!(category = %view.category, error = %e, "export failed");
            println!("Warning: could not export {} details: {}\n", view.category, e);
        }
    }
}

fn main() -> Result<()> {
    load_env();
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("cannot create output directory {}", args.out_dir.display()))?;

    let config = args.filter_config(Local::now().date_naive());
    info!(data = %args.data.display(), date = %config.date.describe(), "session started");
    let in_miles = args.miles;
    let mut session = Session {
        args,
        config,
        in_miles,
        data: None,
        completion: CompletionTable::default(),
    };

    loop {
        println!("Works Dashboard");
        println!("[1] Load the files");
        println!("[2] Show dashboard");
        println!("[3] Drill down & export");
        println!(
            "[4] Equipment / Conductor in miles: {}",
            if session.in_miles { "on" } else { "off" }
        );
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&mut session),
            "2" => {
                println!();
                handle_dashboard(&session);
            }
            "3" => {
                println!();
                handle_drill_down(&session);
            }
            "4" => {
                session.in_miles = !session.in_miles;
                println!();
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-4.\n"),
        }
    }
    Ok(())
}
