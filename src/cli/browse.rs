use super::ui;
use crate::browse::chart::{self, ChartData};
use crate::browse::debounce::{Debouncer, SEARCH_DELAY};
use crate::browse::state::{PAGE_SIZE_OPTIONS, Transition};
use crate::browse::{Action, ApiClient, TableFilter, TableView};
use crate::core::{PageEnvelope, SortOrder};
use anyhow::Result;
use comfy_table::Cell;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const COLUMNS: [(&str, &str); 5] = [
    ("id", "ID"),
    ("symbol", "Symbol"),
    ("source", "Source"),
    ("type", "Type"),
    ("currency", "Currency"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Apply(Action),
    /// Debounced before it turns into [`Action::Search`].
    Search(String),
    Show(i64),
    Help,
    Quit,
}

/// Parses one line of browser input against the current view.
pub fn parse_command(line: &str, view: &TableView) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let page = view.filter.page;
    let last_page = u32::try_from(view.filter.total_pages(view.total_records).max(1))
        .unwrap_or(u32::MAX);

    let command = match word {
        "n" | "next" => Command::Apply(Action::ChangePage(page.saturating_add(1).min(last_page))),
        "p" | "prev" => Command::Apply(Action::ChangePage(page.saturating_sub(1).max(1))),
        "page" => {
            let target: u32 = rest.parse().ok()?;
            Command::Apply(Action::ChangePage(target.clamp(1, last_page)))
        }
        "size" => {
            let size: u32 = rest.parse().ok()?;
            if !PAGE_SIZE_OPTIONS.contains(&size) {
                return None;
            }
            Command::Apply(Action::ChangePageSize(size))
        }
        "sort" if COLUMNS.iter().any(|(id, _)| *id == rest) => {
            Command::Apply(Action::ToggleSort(rest.to_string()))
        }
        "/" | "search" => Command::Search(rest.to_string()),
        "cur" | "currency" => Command::Apply(Action::SelectCurrency(rest.to_string())),
        "show" => Command::Show(rest.parse().ok()?),
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

pub struct BrowseOptions {
    pub page_size: u32,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

type FetchResult = (u64, Result<PageEnvelope>);

fn dispatch(
    client: &ApiClient,
    view: &mut TableView,
    transition: Transition,
    results: &mpsc::UnboundedSender<FetchResult>,
) {
    let generation = view.begin(&transition);
    debug!(generation, fetch = ?transition.fetch, "Dispatching fetch");
    let client = client.clone();
    let results = results.clone();
    tokio::spawn(async move {
        let result = client.fetch_page(&transition.fetch).await;
        let _ = results.send((generation, result));
    });
}

/// Interactive table over the backend, driven by commands read from stdin.
pub async fn browse(client: ApiClient, options: BrowseOptions) -> Result<()> {
    let mut view = TableView::new(TableFilter {
        page_size: options.page_size,
        search_query: options.search,
        sort_by: options.sort_by,
        sort_order: options.sort_order,
        ..Default::default()
    });
    view.currencies = client.fetch_currencies().await.unwrap_or_else(|e| {
        warn!(error = %e, "Could not load currencies");
        Vec::new()
    });

    let (results_tx, mut results) = mpsc::unbounded_channel::<FetchResult>();
    let (mut debouncer, mut searches) = Debouncer::new(SEARCH_DELAY);
    let initial = Transition {
        filter: view.filter.clone(),
        fetch: view.filter.request(),
    };
    dispatch(&client, &mut view, initial, &results_tx);
    print_help(&view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line, &view) {
                    Some(Command::Quit) => break,
                    Some(Command::Help) => print_help(&view),
                    Some(Command::Show(id)) => render_metadata(&view, id),
                    Some(Command::Search(query)) => debouncer.call(query),
                    Some(Command::Apply(action)) => {
                        debouncer.cancel();
                        let transition = view.filter.apply(action);
                        dispatch(&client, &mut view, transition, &results_tx);
                    }
                    None => println!(
                        "{}",
                        ui::style_text("Unknown command, type `help`", ui::StyleType::Error)
                    ),
                }
            }
            Some(query) = searches.recv() => {
                let transition = view.filter.apply(Action::Search(query));
                dispatch(&client, &mut view, transition, &results_tx);
            }
            Some((generation, result)) = results.recv() => match result {
                Ok(envelope) => {
                    if view.receive(generation, envelope) {
                        render(&view);
                    }
                }
                Err(e) => println!(
                    "{}",
                    ui::style_text(&format!("Error while fetching data: {e:#}"), ui::StyleType::Error)
                ),
            },
        }
    }
    Ok(())
}

fn print_help(view: &TableView) {
    println!("{}", ui::style_text("Stocks Analysis", ui::StyleType::Title));
    println!(
        "{}",
        ui::style_text(
            "n/p: next/previous page, page <n>, size <10|50|100|200>, sort <column>, \
             / <text>: search, cur <currency>, show <id>: metadata, q: quit",
            ui::StyleType::Subtle
        )
    );
    if !view.currencies.is_empty() {
        println!("Currencies: {}", view.currencies.join(", "));
    }
}

fn render(view: &TableView) {
    ui::print_separator();
    render_chart(&ChartData::from_records(&view.rows));

    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("")];
    header.extend(COLUMNS.iter().map(|(id, label)| {
        let marker = match (&view.filter.sort_by, view.filter.sort_order) {
            (Some(sorted), SortOrder::Asc) if sorted == id => " ▲",
            (Some(sorted), SortOrder::Desc) if sorted == id => " ▼",
            _ => "",
        };
        ui::header_cell(&format!("{label}{marker}"))
    }));
    table.set_header(header);

    if view.rows.is_empty() {
        table.add_row(vec![Cell::new(""), Cell::new("No Data")]);
    }
    for row in &view.rows {
        let expandable = if row.metadata.is_empty() { "" } else { "+" };
        table.add_row(vec![
            Cell::new(expandable),
            ui::text_cell(row.id.map(|id| id.to_string()).as_deref()),
            ui::text_cell(row.symbol.as_deref()),
            ui::text_cell(row.source.as_deref()),
            ui::text_cell(row.kind.as_deref()),
            ui::text_cell(row.currency.as_deref()),
        ]);
    }
    println!("{table}");

    let filter = &view.filter;
    let mut footer = format!(
        "Page {} of {} ({} records, {} per page)",
        filter.page,
        filter.total_pages(view.total_records),
        view.total_records,
        filter.page_size
    );
    if let Some(query) = &filter.search_query {
        footer.push_str(&format!(", search \"{query}\""));
    }
    println!("{}", ui::style_text(&footer, ui::StyleType::Subtle));
}

fn render_chart(chart: &ChartData) {
    let Some((min, max)) = chart::bounds(&chart.datasets) else {
        return;
    };
    if chart.is_empty() {
        return;
    }
    println!(
        "{} {} .. {}",
        ui::style_text("Prices", ui::StyleType::Label),
        chart.labels.first().map_or("", String::as_str),
        chart.labels.last().map_or("", String::as_str),
    );
    for dataset in &chart.datasets {
        println!(
            "{:>14} {}",
            dataset.label,
            chart::sparkline(&dataset.values, min, max)
        );
    }
    println!(
        "{}",
        ui::style_text(&format!("range {min:.2} .. {max:.2}"), ui::StyleType::Subtle)
    );
}

fn render_metadata(view: &TableView, id: i64) {
    let Some(record) = view.find(id) else {
        println!("{}", ui::style_text("No such row on this page", ui::StyleType::Error));
        return;
    };
    if record.metadata.is_empty() {
        println!("{}", ui::style_text("No additional data", ui::StyleType::Subtle));
        return;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Key"), ui::header_cell("Value")]);
    for (key, value) in &record.metadata {
        table.add_row(vec![Cell::new(key), Cell::new(ui::metadata_text(value))]);
    }
    println!("{}", ui::style_text("Additional Data", ui::StyleType::Title));
    println!("{table}");
}
