use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::{dates::DateRange, filter::FilterCriteria, workspace::ViewSelection};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize marketplace order exports and report sales dashboards",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// YAML settings file providing store_root, top_n and default_account
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding stored datasets (overrides the settings file)
    #[arg(long = "store", global = true)]
    pub store: Option<PathBuf>,
    /// Account whose datasets are read and written
    #[arg(long, global = true)]
    pub account: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload an order export into a marketplace dataset
    Ingest(IngestArgs),
    /// Propose a column mapping for an order export without storing it
    Suggest(SuggestArgs),
    /// Print KPIs and breakdowns for one marketplace or all of them
    Report(ReportArgs),
    /// List the brands available in a view
    Brands(ViewArgs),
    /// Browse the rows of a view page by page
    Rows(RowsArgs),
    /// List stored marketplaces with their row counts and years
    Domains,
    /// Delete stored rows by marketplace, year and month
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Order export to read (.csv, .tsv or .json; '-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("mapping_source").args(["mapping", "reply", "default_mapping"])))]
pub struct MappingArgs {
    /// Mapping file (YAML or JSON) of canonical role to column name
    #[arg(short, long)]
    pub mapping: Option<PathBuf>,
    /// Stored JSON reply of a language model proposing the mapping
    #[arg(long)]
    pub reply: Option<PathBuf>,
    /// Use the marketplace's built-in column mapping
    #[arg(long = "default-mapping")]
    pub default_mapping: bool,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Marketplace the export belongs to, e.g. Myntra or AJIO
    #[arg(short, long)]
    pub domain: String,
    #[command(flatten)]
    pub mapping: MappingArgs,
}

#[derive(Debug, Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Marketplace whose built-in mapping is used with --default-mapping
    #[arg(short, long)]
    pub domain: Option<String>,
    #[command(flatten)]
    pub mapping: MappingArgs,
    /// Write the accepted mapping to this YAML file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Marketplace to read, or 'all' for the consolidated view
    #[arg(short, long, default_value = "all", value_parser = parse_view)]
    pub view: ViewSelection,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// First day to include (YYYY-MM-DD); needs --end
    #[arg(long, requires = "end", value_parser = parse_day)]
    pub start: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD); needs --start
    #[arg(long, requires = "start", value_parser = parse_day)]
    pub end: Option<NaiveDate>,
    /// Only rows of this brand
    #[arg(long)]
    pub brand: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        let criteria = FilterCriteria::all().with_range(DateRange::for_days(self.start, self.end));
        match self.brand.as_deref().map(str::trim) {
            Some(brand) if !brand.is_empty() => criteria.with_brand(brand),
            _ => criteria,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub view: ViewArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Length of the top-N leaderboards
    #[arg(long)]
    pub top: Option<usize>,
    /// Emit the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RowsArgs {
    #[command(flatten)]
    pub view: ViewArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Column filters of the form `column=text` (case-insensitive substring)
    #[arg(long = "contains", action = clap::ArgAction::Append)]
    pub contains: Vec<String>,
    /// 1-based page to show
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page
    #[arg(long = "page-size", default_value_t = crate::browse::DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
    /// Emit the page as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("scope").args(["year", "everything"]).required(true)))]
pub struct DeleteArgs {
    /// Marketplace to delete from (all marketplaces when omitted)
    #[arg(short, long)]
    pub domain: Option<String>,
    /// Year whose rows are removed
    #[arg(long)]
    pub year: Option<i32>,
    /// Month (1-12) within --year whose rows are removed
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
    /// Remove every row instead of a year or month
    #[arg(long)]
    pub everything: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_day(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Expected a day as YYYY-MM-DD, got '{value}': {err}"))
}

pub fn parse_view(value: &str) -> Result<ViewSelection, String> {
    value.parse()
}
