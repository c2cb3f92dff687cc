//! Sales dashboards over marketplace order exports.
//!
//! Uploaded exports keep their own column names; a [`mapping::ColumnMapping`]
//! per dataset tells every aggregate which column plays which business role.
//! The library covers mapping suggestion, ingestion, persistence per account
//! and the dashboard aggregates; the `salesboard` binary drives it from the
//! command line.

pub mod adapters;
pub mod aggregate;
pub mod browse;
pub mod cli;
pub mod config;
pub mod consolidate;
pub mod data;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod filter;
pub mod ingest;
mod ingest_cmd;
pub mod io_utils;
pub mod kpi;
pub mod mapping;
pub mod report;
mod report_cmd;
pub mod revenue;
mod rows_cmd;
pub mod store;
mod store_cmd;
pub mod suggest;
pub mod table;
pub mod workspace;
pub mod yaml_file;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{
    cli::{Cli, Commands, GlobalArgs},
    config::Settings,
    dataset::AccountId,
    store::{FsStore, validate_key},
    workspace::AccountWorkspace,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("salesboard", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let global = &cli.global;
    match &cli.command {
        Commands::Ingest(args) => ingest_cmd::execute(global, args),
        Commands::Suggest(args) => ingest_cmd::execute_suggest(args),
        Commands::Report(args) => report_cmd::execute(global, args),
        Commands::Brands(args) => report_cmd::execute_brands(global, args),
        Commands::Rows(args) => rows_cmd::execute(global, args),
        Commands::Domains => store_cmd::execute_domains(global),
        Commands::Delete(args) => store_cmd::execute_delete(global, args),
    }
}

/// Settings, store and account resolved from the global flags.
pub(crate) struct Session {
    pub settings: Settings,
    store: FsStore,
    account: AccountId,
}

impl Session {
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let settings = Settings::load_optional(global.config.as_deref())?;
        let account = settings.account(global.account.as_deref());
        validate_key(&account).with_context(|| format!("Checking account '{account}'"))?;
        let store = FsStore::new(settings.store_root(global.store.as_deref()));
        debug!(
            "Using store {:?} for account '{account}'",
            store.root()
        );
        Ok(Self {
            settings,
            store,
            account: AccountId::new(account),
        })
    }

    pub fn workspace(&self) -> Result<AccountWorkspace<'_>> {
        AccountWorkspace::open(&self.store, self.account.clone())
            .with_context(|| format!("Loading datasets for account '{}'", self.account))
    }
}
