use anyhow::{Context, Result};
use log::info;

use crate::{
    Session,
    browse::{self, ColumnFilter},
    cli::{GlobalArgs, RowsArgs},
    filter::filter_rows,
    table,
};

pub fn execute(global: &GlobalArgs, args: &RowsArgs) -> Result<()> {
    let filters = args
        .contains
        .iter()
        .map(|raw| ColumnFilter::parse(raw))
        .collect::<Result<Vec<_>>>()?;
    let session = Session::open(global)?;
    let workspace = session.workspace()?;
    let view = &args.view.view;
    let dataset = workspace
        .view(view)
        .with_context(|| format!("Opening view '{view}'"))?;
    let rows = filter_rows(&dataset, &args.filter.criteria());
    let page = browse::paginate(&rows, &filters, args.page, args.page_size);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    let cells = page
        .rows
        .iter()
        .map(|row| {
            page.headers
                .iter()
                .map(|header| row.get(header).map(ToString::to_string).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    table::print_table(&page.headers, &cells);
    let last_row = page.first_row + page.rows.len().saturating_sub(1);
    println!(
        "Showing {} to {} of {} entries (page {} of {})",
        page.first_row,
        if page.rows.is_empty() { 0 } else { last_row },
        page.total_rows,
        page.page,
        page.total_pages.max(1)
    );
    info!("Displayed {} row(s) from '{view}'", page.rows.len());
    Ok(())
}
