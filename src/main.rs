// Entry point and high-level CLI flow.
//
// A workbook named on the command line is loaded before the menu opens.
// The menu then works like the four dashboard controls: every change to
// chart type, item count, value column or label column re-renders the
// current view from the loaded rows. With `--export` the binary writes the
// spreadsheet, report and chart spec for the given file and exits.
mod chart;
mod config;
mod display;
mod error;
mod export;
mod loader;
mod normalize;
mod output;
mod pdf;
mod ranking;
mod session;
mod summary;
mod types;
mod util;
mod view;

use chart::PlottersBackend;
use clap::Parser;
use config::AppConfig;
use env_logger::Env;
use export::{CsvTableWriter, SpreadsheetWriter, XlsxTableWriter};
use log::info;
use pdf::GenPdfRenderer;
use session::Session;
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use types::{ChartType, TopN, ViewSelection};

#[derive(Parser, Debug)]
#[command(name = "payment-report", version, about = "Rank payment spreadsheet rows, chart them and export the list")]
struct Cli {
    /// Excel workbook (.xlsx or .xls) to load at startup
    file: Option<PathBuf>,

    /// JSON configuration layered over the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Items to keep: a count, or "all"
    #[arg(long, allow_hyphen_values = true)]
    top: Option<TopN>,

    /// Column to rank by
    #[arg(long)]
    value: Option<String>,

    /// Column naming each item
    #[arg(long)]
    label: Option<String>,

    /// bar, line, pie or doughnut
    #[arg(long)]
    chart: Option<ChartType>,

    /// Directory for exported files
    #[arg(long)]
    out: Option<PathBuf>,

    /// Export for FILE and exit instead of opening the menu
    #[arg(long, requires = "file")]
    export: bool,

    /// Write the item list as CSV as well
    #[arg(long)]
    csv: bool,
}

struct AppState {
    session: Session<PlottersBackend>,
    selection: ViewSelection,
    out_dir: PathBuf,
    fonts_dir: PathBuf,
    csv: bool,
}

/// Read a single line of input after printing `prompt`.
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

fn show_view(state: &AppState) {
    let session = &state.session;
    output::print_status(session.status());
    if let Some(name) = session.file_name() {
        println!("File: {} ({} rows)", name, session.dataset_len());
    }
    if session.dataset_len() > 0 {
        output::preview_summary(&session.summary_cards());
    }
    output::preview_details(session.heading(), session.details(), session.placeholder());
    if let Some(series) = session.chart().series() {
        if !series.labels.is_empty() {
            println!("({} chart ready, exports enabled)\n", series.chart_type);
        }
    }
}

fn rerender(state: &mut AppState) {
    let selection = state.selection.clone();
    state.session.render(&selection);
    show_view(state);
}

/// Handle option [1]: load a workbook and render the current selection.
fn handle_load(state: &mut AppState) {
    let path = read_line("Path to Excel file: ");
    if path.is_empty() {
        println!("No file selected. Please choose an Excel file.\n");
        return;
    }
    let selection = state.selection.clone();
    state.session.upload(&PathBuf::from(path), &selection);
    show_view(state);
}

fn handle_chart_type(state: &mut AppState) {
    println!("[1] Bar  [2] Line  [3] Pie  [4] Doughnut");
    let chart_type = match read_choice().as_str() {
        "1" => ChartType::Bar,
        "2" => ChartType::Line,
        "3" => ChartType::Pie,
        "4" => ChartType::Doughnut,
        other => match other.parse() {
            Ok(t) => t,
            Err(e) => {
                println!("{}\n", e);
                return;
            }
        },
    };
    state.selection.chart_type = chart_type;
    rerender(state);
}

fn handle_top_n(state: &mut AppState) {
    match read_line("Items to show (5, 10, 15, 20 or 'all'): ").parse::<TopN>() {
        Ok(top_n) => {
            state.selection.top_n = top_n;
            rerender(state);
        }
        Err(e) => println!("{}\n", e),
    }
}

/// Offer the configured value columns first, then any loaded column by name.
fn pick_column(state: &AppState, offered: &[String]) -> Option<String> {
    for (idx, name) in offered.iter().enumerate() {
        println!("[{}] {}", idx + 1, state.session.config().display.display_name(name));
    }
    let loaded = state.session.columns();
    if !loaded.is_empty() {
        println!("Loaded columns: {}", loaded.join(", "));
    }
    let answer = read_line("Choose a number or type a column name: ");
    if answer.is_empty() {
        return None;
    }
    match answer.parse::<usize>() {
        Ok(n) if n >= 1 && n <= offered.len() => Some(offered[n - 1].clone()),
        _ => Some(answer),
    }
}

fn handle_value_column(state: &mut AppState) {
    let offered: Vec<String> = state.session.config().display.columns().map(str::to_string).collect();
    if let Some(column) = pick_column(state, &offered) {
        state.selection.value_column = column;
        rerender(state);
    }
}

fn handle_label_column(state: &mut AppState) {
    let offered = vec![state.session.config().columns.grouping.clone()];
    if let Some(column) = pick_column(state, &offered) {
        state.selection.label_column = column;
        rerender(state);
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn handle_export_spreadsheet(state: &mut AppState) {
    let writers: Vec<Box<dyn SpreadsheetWriter>> = if state.csv {
        vec![Box::new(XlsxTableWriter), Box::new(CsvTableWriter)]
    } else {
        vec![Box::new(XlsxTableWriter)]
    };
    for writer in writers {
        if let Ok(path) = state.session.export_spreadsheet(writer.as_ref(), &state.out_dir, today()) {
            println!("(Items list exported to {})", path.display());
        }
        output::print_status(state.session.status());
    }
}

fn handle_export_pdf(state: &mut AppState) {
    let renderer = GenPdfRenderer::new(state.fonts_dir.clone());
    if let Ok(path) = state.session.export_pdf(&renderer, &state.out_dir, today()) {
        println!("(Report exported to {})", path.display());
    }
    output::print_status(state.session.status());

    if let Ok(path) = state.session.export_chart_spec(&state.out_dir, today()) {
        println!("(Chart spec exported to {})\n", path.display());
    }
}

fn run_batch(state: &mut AppState) {
    show_view(state);
    if !state.session.exports_enabled() {
        return;
    }
    handle_export_spreadsheet(state);
    handle_export_pdf(state);
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let mut selection = config.defaults.clone();
    if let Some(top_n) = cli.top {
        selection.top_n = top_n;
    }
    if let Some(value) = cli.value.clone() {
        selection.value_column = value;
    }
    if let Some(label) = cli.label.clone() {
        selection.label_column = label;
    }
    if let Some(chart_type) = cli.chart {
        selection.chart_type = chart_type;
    }
    let out_dir = cli.out.clone().unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&out_dir)?;
    info!("exports go to {}", out_dir.display());

    let backend = PlottersBackend::new(config.chart.width, config.chart.height);
    let fonts_dir = config.fonts_dir.clone();
    let mut state = AppState {
        session: Session::new(config, backend),
        selection,
        out_dir,
        fonts_dir,
        csv: cli.csv,
    };

    if let Some(path) = &cli.file {
        let selection = state.selection.clone();
        state.session.upload(path, &selection);
        if cli.export {
            run_batch(&mut state);
            return Ok(());
        }
    }

    show_view(&state);
    loop {
        println!("Select an action:");
        println!("[1] Load an Excel file");
        println!("[2] Chart type ({})", state.selection.chart_type);
        println!("[3] Items to show ({})", state.selection.top_n);
        println!("[4] Value column ({})", state.session.config().display.display_name(&state.selection.value_column));
        println!("[5] Label column ({})", state.selection.label_column);
        if state.session.exports_enabled() {
            println!("[6] Export items to Excel");
            println!("[7] Export chart report (PDF)");
        }
        println!("[8] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&mut state),
            "2" => handle_chart_type(&mut state),
            "3" => handle_top_n(&mut state),
            "4" => handle_value_column(&mut state),
            "5" => handle_label_column(&mut state),
            "6" => handle_export_spreadsheet(&mut state),
            "7" => handle_export_pdf(&mut state),
            "8" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from 1 to 8.\n"),
        }
    }
    Ok(())
}
