use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use print_layout::constants::mm_to_pt;
use print_layout::*;
use std::path::PathBuf;

mod logger;
mod pdf_source;

#[derive(Parser)]
#[command(name = "prt", about = "Print layout tools", version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out a document onto sheets and report the result
    Plan {
        /// Input PDF file. Without one, a synthetic document is used
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Page count of the synthetic document
        #[arg(long, default_value = "1", conflicts_with = "input")]
        pages: usize,

        /// Page size of the synthetic document, WIDTHxHEIGHT in points
        #[arg(long, default_value = "612x792", conflicts_with = "input")]
        page_size: String,

        /// Settings file to start from
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Write the effective settings to this file
        #[arg(long)]
        save_settings: Option<PathBuf>,

        #[command(flatten)]
        overrides: SettingsArgs,

        /// Print the sheet plan as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Check a page range expression
    Range {
        /// Expression such as "1-3, 5"
        expression: String,

        /// Number of pages in the document
        #[arg(long)]
        pages: usize,
    },
}

/// Settings flags. Each one overrides the settings file when given.
#[derive(Args)]
struct SettingsArgs {
    /// Number of copies
    #[arg(long)]
    copies: Option<u32>,

    /// Pages to print, e.g. "1-3, 5"
    #[arg(long)]
    range: Option<String>,

    /// Print only this page
    #[arg(long, conflicts_with = "range")]
    current_page: Option<usize>,

    /// Paper size
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    /// Custom paper size, WIDTHxHEIGHT in mm
    #[arg(long, conflicts_with = "paper")]
    paper_mm: Option<String>,

    /// Sheet orientation
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Pages per sheet (1, 2, 4, 6, 9 or 16)
    #[arg(long, value_parser = parse_pages_per_sheet)]
    pages_per_sheet: Option<PagesPerSheet>,

    /// Cell fill order
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Scale percentage; the default fits content to its cell
    #[arg(long)]
    scale: Option<f32>,

    /// Margin source
    #[arg(long, value_enum)]
    margin: Option<MarginArg>,

    /// Custom margin in mm
    #[arg(long, conflicts_with = "margin")]
    margin_mm: Option<f32>,

    /// Two-sided printing
    #[arg(long, value_enum)]
    duplex: Option<DuplexArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    A6,
    Letter,
    Legal,
    Tabloid,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Horizontal,
    HorizontalReverse,
    Vertical,
    VerticalReverse,
}

#[derive(Clone, Copy, ValueEnum)]
enum MarginArg {
    Document,
    None,
    Device,
}

#[derive(Clone, Copy, ValueEnum)]
enum DuplexArg {
    Off,
    LongEdge,
    ShortEdge,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::A6 => Self::A6,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
            PaperArg::Tabloid => Self::Tabloid,
        }
    }
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
        }
    }
}

impl From<OrderArg> for PageOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Horizontal => Self::Horizontal,
            OrderArg::HorizontalReverse => Self::HorizontalReverse,
            OrderArg::Vertical => Self::Vertical,
            OrderArg::VerticalReverse => Self::VerticalReverse,
        }
    }
}

impl From<MarginArg> for MarginPolicy {
    fn from(arg: MarginArg) -> Self {
        match arg {
            MarginArg::Document => Self::DocumentDefault,
            MarginArg::None => Self::None,
            MarginArg::Device => Self::DeviceMinimum,
        }
    }
}

impl From<DuplexArg> for Duplex {
    fn from(arg: DuplexArg) -> Self {
        match arg {
            DuplexArg::Off => Self::OneSided,
            DuplexArg::LongEdge => Self::LongEdge,
            DuplexArg::ShortEdge => Self::ShortEdge,
        }
    }
}

fn parse_pages_per_sheet(value: &str) -> Result<PagesPerSheet, String> {
    value
        .parse::<usize>()
        .ok()
        .and_then(PagesPerSheet::from_count)
        .ok_or_else(|| format!("'{}' is not one of 1, 2, 4, 6, 9, 16", value))
}

/// Parse "WIDTHxHEIGHT"
fn parse_dimensions(value: &str) -> Result<(f32, f32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("Expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: f32 = width.trim().parse().context("Invalid width")?;
    let height: f32 = height.trim().parse().context("Invalid height")?;
    Ok((width, height))
}

impl SettingsArgs {
    /// Collect the given flags as change records.
    ///
    /// `--margin-mm` is left out: it is clamped against the final sheet.
    fn changes(&self) -> Result<Vec<SettingsChange>> {
        let mut changes = Vec::new();

        if let Some(copies) = self.copies {
            changes.push(SettingsChange::Copies(copies));
        }
        if let Some(range) = &self.range {
            changes.push(SettingsChange::CustomRange(range.clone()));
            changes.push(SettingsChange::PageSelection(PageSelection::Custom));
        }
        if let Some(page) = self.current_page {
            changes.push(SettingsChange::CurrentPage(page));
            changes.push(SettingsChange::PageSelection(PageSelection::Current));
        }
        if let Some(paper) = self.paper {
            changes.push(SettingsChange::PaperSize(paper.into()));
        }
        if let Some(dimensions) = &self.paper_mm {
            let (width_mm, height_mm) = parse_dimensions(dimensions)?;
            changes.push(SettingsChange::PaperSize(PaperSize::Custom {
                width_mm,
                height_mm,
            }));
        }
        if let Some(orientation) = self.orientation {
            changes.push(SettingsChange::Orientation(orientation.into()));
        }
        if let Some(pps) = self.pages_per_sheet {
            changes.push(SettingsChange::PagesPerSheet(pps));
        }
        if let Some(order) = self.order {
            changes.push(SettingsChange::PageOrder(order.into()));
        }
        if let Some(percent) = self.scale {
            changes.push(SettingsChange::Scale(ScalePolicy::Custom(percent)));
        }
        if let Some(margin) = self.margin {
            changes.push(SettingsChange::Margin(margin.into()));
        }
        if let Some(duplex) = self.duplex {
            changes.push(SettingsChange::Duplex(duplex.into()));
        }

        Ok(changes)
    }
}

fn print_summary(plan: &SheetPlan, settings: &PrintSettings) {
    let stats = calculate_statistics(plan, settings);
    let (cols, rows) = (plan.grid.cols, plan.grid.rows);

    println!("Layout:");
    println!(
        "  Sheet: {:.1} x {:.1} pt, {} x {} cells, margin {:.1} pt",
        plan.sheet_size.width, plan.sheet_size.height, cols, rows, plan.margin
    );
    match plan.scale {
        ResolvedScale::Uniform(factor) => println!("  Scale: {:.1}%", factor * 100.0),
        ResolvedScale::PerCell => println!("  Scale: fit each page to its cell"),
    }
    for sheet in &plan.sheets {
        let pages: Vec<String> = sheet
            .placements
            .iter()
            .map(|p| p.page_number().to_string())
            .collect();
        println!("  Sheet {}: pages {}", sheet.index + 1, pages.join(", "));
    }

    println!("Job Statistics:");
    println!("  Selected pages: {}", stats.selected_pages);
    println!("  Sheets: {}", stats.sheets);
    println!("  Empty cells: {}", stats.empty_cells);
    println!("  Paper per copy: {}", stats.physical_sheets_per_copy);
    println!("  Paper total: {}", stats.physical_sheets);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::CliLogger::new(logger::level_for(cli.verbose, cli.quiet)).init()?;

    match cli.command {
        Commands::Plan {
            input,
            pages,
            page_size,
            settings,
            save_settings,
            overrides,
            json,
        } => {
            let mut print_settings = match &settings {
                Some(path) => PrintSettings::load(path)
                    .await
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => PrintSettings::default(),
            };

            let document = match &input {
                Some(path) => {
                    let pdf = pdf_source::load_pdf(path).await?;
                    pdf_source::layout_document(&pdf)
                }
                None => {
                    let (width, height) = parse_dimensions(&page_size)?;
                    Document::from_sizes(vec![Size::new(width, height); pages], 0.0)
                }
            };
            log::debug!("Document has {} page(s)", document.page_count());

            for change in overrides.changes()? {
                print_settings.apply(change);
            }
            if let Some(margin_mm) = overrides.margin_mm {
                let margin = clamp_custom_margin(mm_to_pt(margin_mm), print_settings.sheet_size());
                print_settings.apply(SettingsChange::Margin(MarginPolicy::Custom(margin)));
            }
            print_settings.validate()?;

            if let Some(path) = &save_settings {
                print_settings.save(path).await?;
                log::info!("Saved settings to {}", path.display());
            }

            let plan = layout_document(&print_settings, &document, None)?;
            if plan.is_empty() {
                bail!(LayoutError::NoPages);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_summary(&plan, &print_settings);
            }
        }

        Commands::Range { expression, pages } => {
            let selected = parse_page_range(&expression, pages)?;
            let pages: Vec<String> = selected.iter().map(usize::to_string).collect();
            println!("{} page(s): {}", selected.len(), pages.join(", "));
        }
    }

    Ok(())
}
