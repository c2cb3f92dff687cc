use anyhow::Result;
use itertools::Itertools;
use log::info;

use crate::{
    Session,
    aggregate::available_years,
    cli::{DeleteArgs, GlobalArgs},
    dataset::DeleteCriteria,
    table,
};

pub fn execute_domains(global: &GlobalArgs) -> Result<()> {
    let session = Session::open(global)?;
    let workspace = session.workspace()?;
    let rows = workspace
        .domains()
        .into_iter()
        .filter_map(|domain| {
            let dataset = workspace.datasets().get(domain)?;
            Some(vec![
                domain.to_string(),
                dataset.len().to_string(),
                available_years(dataset).iter().join(", "),
            ])
        })
        .collect::<Vec<_>>();
    if rows.is_empty() {
        println!("No data uploaded for account '{}'.", workspace.account());
        return Ok(());
    }
    let headers = vec!["domain".to_string(), "rows".to_string(), "years".to_string()];
    table::print_table(&headers, &rows);
    Ok(())
}

fn criteria(args: &DeleteArgs) -> DeleteCriteria {
    match (args.year, args.month) {
        (Some(year), Some(month)) => DeleteCriteria::month(year, month),
        (Some(year), None) => DeleteCriteria::year(year),
        _ => DeleteCriteria::everything(),
    }
}

pub fn execute_delete(global: &GlobalArgs, args: &DeleteArgs) -> Result<()> {
    let session = Session::open(global)?;
    let mut workspace = session.workspace()?;
    let criteria = criteria(args);
    info!(
        "Deleting {criteria:?} from {}",
        args.domain.as_deref().unwrap_or("all domains")
    );
    let removed = workspace.delete(args.domain.as_deref(), criteria)?;
    println!("Removed {removed} row(s).");
    Ok(())
}
