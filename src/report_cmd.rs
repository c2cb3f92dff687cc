use anyhow::{Context, Result};
use log::info;

use crate::{
    Session,
    aggregate::{self, Bucket},
    cli::{GlobalArgs, ReportArgs, ViewArgs},
    data::format_number,
    kpi::format_currency,
    report::DashboardReport,
    table,
};

pub fn execute(global: &GlobalArgs, args: &ReportArgs) -> Result<()> {
    let session = Session::open(global)?;
    let workspace = session.workspace()?;
    let view = &args.view.view;
    let dataset = workspace
        .view(view)
        .with_context(|| format!("Opening view '{view}'"))?;
    let criteria = args.filter.criteria();
    let top_n = session.settings.top_n(args.top);
    let report = DashboardReport::build(&dataset, &criteria, top_n);
    info!(
        "Report for '{view}' covers {} of {} row(s)",
        report.filtered_count, report.row_count
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.row_count == 0 {
        println!("No data uploaded for '{view}'.");
        return Ok(());
    }
    if report.is_filtered_empty() {
        println!("No data in the selected range.");
        return Ok(());
    }
    render(&report);
    Ok(())
}

fn render(report: &DashboardReport) {
    section("KPIs");
    let kpi_rows = report
        .kpis
        .iter()
        .map(|kpi| vec![kpi.title.clone(), kpi.value.clone()])
        .collect::<Vec<_>>();
    table::print_table(&headers(&["metric", "value"]), &kpi_rows);

    let revenue = format_currency;
    let count = format_number;
    buckets("Top brands by revenue", "brand", &report.top_brands_by_revenue, revenue);
    buckets("Top cities by revenue", "city", &report.top_cities_by_revenue, revenue);
    buckets("Top items by revenue", "item", &report.top_items_by_revenue, revenue);
    buckets(
        "Top cancellation reasons",
        "reason",
        &report.top_cancellation_reasons,
        count,
    );
    buckets("Order status", "status", &report.order_status_distribution, count);
    buckets("Courier usage", "courier", &report.courier_usage, count);
    buckets("Top cities by orders", "city", &report.top_cities_by_orders, count);
    buckets("Top SKUs by orders", "sku", &report.top_skus_by_orders, count);
    buckets(
        "Top article types by orders",
        "article type",
        &report.top_article_types_by_orders,
        count,
    );
    buckets("Orders by state", "state", &report.orders_by_state, count);
    buckets("Brand distribution", "brand", &report.brand_distribution, count);

    if !report.daily_order_volume.is_empty() {
        section("Daily order volume");
        let rows = report
            .daily_order_volume
            .iter()
            .map(|day| vec![day.date.clone(), day.count.to_string()])
            .collect::<Vec<_>>();
        table::print_table(&headers(&["date", "orders"]), &rows);
    }
    if !report.discount_vs_revenue.is_empty() {
        section("Discount vs revenue");
        let rows = report
            .discount_vs_revenue
            .iter()
            .map(|bucket| {
                vec![
                    bucket.name.clone(),
                    format_currency(bucket.revenue),
                    format!("{:.1}%", bucket.avg_discount),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers(&["article type", "revenue", "avg discount"]), &rows);
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn section(title: &str) {
    println!();
    println!("== {title} ==");
}

fn buckets(title: &str, label: &str, values: &[Bucket], format: impl Fn(f64) -> String) {
    if values.is_empty() {
        return;
    }
    section(title);
    let rows = values
        .iter()
        .map(|bucket| vec![bucket.name.clone(), format(bucket.value)])
        .collect::<Vec<_>>();
    table::print_table(&headers(&[label, "value"]), &rows);
}

pub fn execute_brands(global: &GlobalArgs, args: &ViewArgs) -> Result<()> {
    let session = Session::open(global)?;
    let workspace = session.workspace()?;
    let dataset = workspace
        .view(&args.view)
        .with_context(|| format!("Opening view '{}'", args.view))?;
    let brands = aggregate::available_brands(&dataset);
    for brand in &brands {
        println!("{brand}");
    }
    info!("{} brand(s) available in '{}'", brands.len(), args.view);
    Ok(())
}
