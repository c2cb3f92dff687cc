use std::fs;

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{
    Session,
    adapters::AdapterRegistry,
    cli::{GlobalArgs, IngestArgs, InputArgs, MappingArgs, SuggestArgs},
    error::IngestError,
    io_utils::{self, Upload},
    mapping::{CanonicalField, ColumnMapping},
    suggest::{self, FixedMapping, HeuristicSuggester, MappingSuggester, ReplySuggester},
    table, yaml_file,
};

pub fn read_input(args: &InputArgs) -> Result<Upload> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let upload = io_utils::read_upload(&args.input, args.delimiter, encoding)?;
    if upload.rows.is_empty() {
        return Err(IngestError::EmptyBatch.into());
    }
    info!(
        "Read {} row(s) with {} column(s) from {:?}",
        upload.rows.len(),
        upload.headers.len(),
        args.input
    );
    Ok(upload)
}

/// Mapping for `upload` from the first source given: mapping file, stored
/// model reply, marketplace default, else the keyword heuristic.
pub fn resolve_mapping(
    upload: &Upload,
    domain: Option<&str>,
    args: &MappingArgs,
) -> Result<ColumnMapping> {
    let suggester: Box<dyn MappingSuggester> = if let Some(path) = &args.mapping {
        let mapping: ColumnMapping = yaml_file::load_from_path(path)
            .with_context(|| format!("Loading mapping from {path:?}"))?;
        Box::new(FixedMapping(mapping))
    } else if let Some(path) = &args.reply {
        let reply =
            fs::read_to_string(path).with_context(|| format!("Reading model reply {path:?}"))?;
        Box::new(ReplySuggester::new(reply))
    } else if args.default_mapping {
        let domain =
            domain.ok_or_else(|| anyhow!("--default-mapping needs the marketplace (--domain)"))?;
        Box::new(FixedMapping(
            AdapterRegistry::default()
                .adapter_for(domain)
                .default_mapping(),
        ))
    } else {
        Box::new(HeuristicSuggester)
    };
    let mapping = suggest::suggest_mapping(suggester.as_ref(), &upload.headers, &upload.rows)?;
    info!("Using a mapping with {} role(s)", mapping.len());
    Ok(mapping)
}

pub fn execute(global: &GlobalArgs, args: &IngestArgs) -> Result<()> {
    let upload = read_input(&args.input)?;
    let mapping = resolve_mapping(&upload, Some(args.domain.as_str()), &args.mapping)?;
    let session = Session::open(global)?;
    let mut workspace = session.workspace()?;
    let outcome = workspace
        .ingest(&args.domain, upload.rows, mapping)
        .with_context(|| format!("Ingesting {:?} into '{}'", args.input.input, args.domain))?;
    println!(
        "{}: {} row(s) added, {} duplicate(s) skipped, {} row(s) stored",
        outcome.domain, outcome.added, outcome.duplicates, outcome.total
    );
    Ok(())
}

pub fn execute_suggest(args: &SuggestArgs) -> Result<()> {
    let upload = read_input(&args.input)?;
    let mapping = resolve_mapping(&upload, args.domain.as_deref(), &args.mapping)?;
    let headers = vec!["role".to_string(), "column".to_string()];
    let rows = CanonicalField::ALL
        .into_iter()
        .map(|field| {
            vec![
                field.to_string(),
                mapping.get(field).unwrap_or("-").to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
    if let Some(path) = &args.output {
        yaml_file::save_to_path(path, &mapping)
            .with_context(|| format!("Writing mapping to {path:?}"))?;
        info!("Mapping written to {path:?}");
    }
    Ok(())
}
