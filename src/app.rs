use std::collections::BTreeSet;
use std::sync::Arc;

use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::config::AppConfig;
use crate::domain::entities::dataset::{DatasetId, DatasetMeta, PageSnapshot};
use crate::domain::entities::record::RecordId;
use crate::domain::selection::affordance::{CheckboxState, SelectionAffordance};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::state::app_state::{AppState, LayoutStore};
use crate::usecase::ports::repo::{BulkReport, DatasetCatalog, FetchError};
use crate::usecase::services::bulk_service::{BulkAction, BulkService};
use crate::usecase::services::dataset_view::{DatasetView, FetchTicket};
use crate::usecase::services::import_service::ImportService;
use crate::usecase::services::query_service::QueryService;
use crate::usecase::services::table_controller::UniverseOutcome;

const NONE_OPTION_VALUE: &str = "__none__";

fn checkbox_glyph(state: CheckboxState) -> &'static str {
    match state {
        CheckboxState::Checked => "☑",
        CheckboxState::Indeterminate => "⊟",
        CheckboxState::Unchecked => "☐",
    }
}

fn dataset_columns(datasets: &[DatasetMeta], id: DatasetId) -> Vec<String> {
    datasets
        .iter()
        .find(|dataset| dataset.id == id)
        .map(|dataset| dataset.columns.clone())
        .unwrap_or_default()
}

fn bulk_summary(action: BulkAction, report: &BulkReport) -> String {
    if report.is_clean() {
        return format!("{}: {} rows", action.label(), report.succeeded.len());
    }
    format!(
        "{}: {} rows, {} failed",
        action.label(),
        report.succeeded.len(),
        report.failed.len()
    )
}

async fn load_catalog(repo: Arc<SqliteRepo>) -> Result<Vec<DatasetMeta>, FetchError> {
    run_blocking(move || {
        repo.init()?;
        repo.list_datasets()
    })
    .await
    .map_err(FetchError::transient)?
}

fn spawn_page_fetch(query: QueryService, mut view: Signal<DatasetView>, ticket: FetchTicket) {
    spawn(async move {
        let result = query.fetch_page(&ticket).await;
        view.write().complete(ticket, result);
    });
}

#[component]
fn ColumnToggles(
    columns: Vec<String>,
    layout: Signal<LayoutStore>,
    on_toggle: EventHandler<String>,
) -> Element {
    let store = layout.read().clone();

    rsx! {
        div {
            style: "display: flex; flex-wrap: wrap; gap: 10px; padding: 6px 0;",
            {columns.iter().map(|column| {
                let visible = !store.is_hidden(column);
                let column = column.clone();
                let label = column.clone();
                rsx!(
                    label {
                        style: "display: inline-flex; align-items: center; gap: 4px; cursor: pointer;",
                        input {
                            r#type: "checkbox",
                            checked: visible,
                            onclick: move |_| on_toggle.call(column.clone()),
                        }
                        span { "{label}" }
                    }
                )
            })}
        }
    }
}

#[component]
fn SelectionBanner(
    affordance: SelectionAffordance,
    page_len: usize,
    universe_pending: bool,
    on_select_page: EventHandler<()>,
    on_select_dataset: EventHandler<()>,
    on_clear: EventHandler<()>,
) -> Element {
    let body = match affordance {
        SelectionAffordance::None => return rsx! {},
        SelectionAffordance::SelectPage => {
            if page_len == 0 {
                return rsx! {};
            }
            rsx! {
                button {
                    onclick: move |_| on_select_page.call(()),
                    "Select all {page_len} rows on this page"
                }
            }
        }
        SelectionAffordance::SelectDataset { total } => rsx! {
            span { "All rows on this page are selected." }
            button {
                disabled: universe_pending,
                onclick: move |_| on_select_dataset.call(()),
                if universe_pending {
                    "Selecting…"
                } else {
                    "Select all {total} rows in the dataset"
                }
            }
        },
        SelectionAffordance::ClearSelection { count } => rsx! {
            span { "{count} rows selected." }
            button {
                onclick: move |_| on_clear.call(()),
                "Clear selection ({count})"
            }
        },
    };

    rsx! {
        div {
            style: "display: flex; align-items: center; gap: 8px; padding: 6px 10px; background: #eef4ff; border: 1px solid #c7d7f5; border-radius: 6px; margin: 6px 0;",
            {body}
        }
    }
}

#[component]
pub fn App() -> Element {
    let config = use_context::<AppConfig>();
    let db_path = match config.database_path() {
        Ok(path) => path,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to resolve database path: {err}" }
                }
            };
        }
    };

    let AppState {
        mut datasets,
        mut selected_dataset_id,
        mut controller,
        mut view,
        mut layout,
        mut filter_input,
        mut busy,
        mut status,
    } = AppState::new(config.default_page_size);

    let repo = Arc::new(SqliteRepo::new(db_path.clone()));
    let query_service = QueryService::new(repo.clone(), repo.clone());
    let bulk_service = BulkService::new(repo.clone());
    let import_service = Arc::new(ImportService::new(db_path));

    let repo_for_init = repo.clone();
    use_effect(move || {
        let repo = repo_for_init.clone();
        spawn(async move {
            busy.set(true);
            match load_catalog(repo).await {
                Ok(available) => {
                    let first = available.first().map(|dataset| dataset.id);
                    datasets.set(available);
                    selected_dataset_id.set(first);
                    status.set("Datasets loaded".to_string());
                }
                Err(err) => {
                    datasets.set(Vec::new());
                    selected_dataset_id.set(None);
                    status.set(format!("Failed to open database: {err}"));
                }
            }
            busy.set(false);
        });
    });

    let repo_for_layout = repo.clone();
    use_effect(move || {
        let Some(dataset_id) = selected_dataset_id() else {
            return;
        };
        let repo = repo_for_layout.clone();
        spawn(async move {
            let hidden = run_blocking(move || repo.load_hidden_columns(dataset_id))
                .await
                .map_err(FetchError::transient)
                .and_then(|loaded| loaded);
            let hidden = match hidden {
                Ok(hidden) => hidden,
                Err(err) => {
                    status.set(format!("Failed to load column layout: {err}"));
                    BTreeSet::new()
                }
            };
            let all_columns = dataset_columns(&datasets.peek(), dataset_id);
            let store = LayoutStore::new(hidden);
            let projection = store.projection(&all_columns);
            layout.set(store);
            filter_input.set(String::new());

            let mut table = controller.write();
            table.set_resource(dataset_id.resource_path());
            table.set_projection(projection);
            table.start();
        });
    });

    let request_key = use_memo(move || controller.read().request_key());
    let query_for_pages = query_service.clone();
    use_effect(move || {
        let key = request_key();
        let ticket = view.write().subscribe(key);
        if let Some(ticket) = ticket {
            spawn_page_fetch(query_for_pages.clone(), view, ticket);
        }
    });

    let view_state = view.read().state();
    let page: Arc<PageSnapshot> = view_state.data.clone().unwrap_or_default();
    let page_ids = page.row_ids();
    let total_rows = page.total_row_count;
    let page_len = page.rows.len();

    let (header_state, affordance, selected_count, page_index, page_size, show_trash, pending) = {
        let table = controller.read();
        (
            table.header_checkbox(&page_ids),
            table.affordance(&page_ids, total_rows),
            table.selection().selected_count(),
            table.pagination().page_index().max(0),
            table.pagination().page_size(),
            table.show_trash(),
            table.is_universe_pending(),
        )
    };
    let page_count = controller.read().pagination().page_count(total_rows);
    let page_label = page_index + 1;
    let header_glyph = checkbox_glyph(header_state);

    let all_columns = selected_dataset_id()
        .map(|id| dataset_columns(&datasets(), id))
        .unwrap_or_default();
    let selected_value = selected_dataset_id()
        .map(|id| id.0.to_string())
        .unwrap_or_else(|| NONE_OPTION_VALUE.to_string());
    let toolbar_collapsed = layout.read().toolbar_collapsed();

    let repo_for_columns = repo.clone();
    let query_for_universe = query_service.clone();
    let query_for_retry = query_service.clone();
    let query_for_bulk = query_service.clone();
    let repo_for_import = repo.clone();
    let page_ids_for_header = page_ids.clone();
    let page_ids_for_banner = page_ids.clone();

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 12px; display: flex; flex-direction: column; gap: 8px;",

            div {
                style: "display: flex; align-items: center; gap: 10px; flex-wrap: wrap;",
                span { "Dataset" }
                select {
                    value: "{selected_value}",
                    disabled: busy(),
                    onchange: move |event| {
                        let next = event.value().parse::<i64>().ok().map(DatasetId);
                        selected_dataset_id.set(next);
                    },
                    option { value: NONE_OPTION_VALUE, "(none)" }
                    {datasets().into_iter().map(|dataset| {
                        let value = dataset.id.0.to_string();
                        let label = format!("{} ({} rows)", dataset.name, dataset.record_count);
                        rsx!( option { value: "{value}", "{label}" } )
                    })}
                }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        let Some(path) = FileDialog::new()
                            .add_filter("CSV", &["csv"])
                            .pick_file()
                        else {
                            return;
                        };
                        let import_service = import_service.clone();
                        let repo = repo_for_import.clone();
                        spawn(async move {
                            busy.set(true);
                            status.set(format!("Importing {}", path.display()));
                            match import_service.import_csv(path).await {
                                Ok(imported) => {
                                    match load_catalog(repo).await {
                                        Ok(available) => datasets.set(available),
                                        Err(err) => status.set(format!("Failed to reload datasets: {err}")),
                                    }
                                    selected_dataset_id.set(Some(DatasetId(imported.dataset_id)));
                                    status.set(format!("Imported {} rows", imported.row_count));
                                }
                                Err(err) => status.set(format!("Import failed: {err:#}")),
                            }
                            busy.set(false);
                        });
                    },
                    "Import CSV"
                }
                button {
                    onclick: move |_| layout.write().toggle_toolbar(),
                    if toolbar_collapsed { "Show filters" } else { "Hide filters" }
                }
                span { style: "color: #666;", "{status}" }
            }

            if !toolbar_collapsed {
                div {
                    style: "display: flex; align-items: center; gap: 10px; flex-wrap: wrap;",
                    input {
                        placeholder: "Filter rows",
                        value: "{filter_input}",
                        oninput: move |event| {
                            let text = event.value();
                            controller.write().set_filter(&text);
                            filter_input.set(text);
                        }
                    }
                    label {
                        style: "display: inline-flex; align-items: center; gap: 4px;",
                        input {
                            r#type: "checkbox",
                            checked: show_trash,
                            onclick: move |_| {
                                let next = !controller.peek().show_trash();
                                controller.write().set_show_trash(next);
                            }
                        }
                        span { "Show trash" }
                    }
                    span { "Rows per page" }
                    select {
                        value: "{page_size}",
                        onchange: move |event| {
                            if let Ok(size) = event.value().parse::<i64>() {
                                controller.write().set_page_size(size);
                            }
                        },
                        {config.page_size_options.iter().map(|size| {
                            let size = *size;
                            rsx!( option { value: "{size}", "{size}" } )
                        })}
                    }
                }
                ColumnToggles {
                    columns: all_columns.clone(),
                    layout: layout,
                    on_toggle: move |column: String| {
                        let Some(dataset_id) = selected_dataset_id() else {
                            return;
                        };
                        let all_columns = dataset_columns(&datasets.peek(), dataset_id);
                        let projection = {
                            let mut store = layout.write();
                            if !store.toggle_column(&column, &all_columns) {
                                status.set("At least one column must stay visible".to_string());
                                return;
                            }
                            store.projection(&all_columns)
                        };
                        controller.write().set_projection(projection);
                        let hidden = layout.peek().hidden_columns().clone();
                        let repo = repo_for_columns.clone();
                        spawn(async move {
                            let saved = run_blocking(move || repo.save_hidden_columns(dataset_id, &hidden))
                                .await
                                .map_err(FetchError::transient)
                                .and_then(|saved| saved);
                            if let Err(err) = saved {
                                status.set(format!("Failed to save column layout: {err}"));
                            }
                        });
                    },
                }
            }

            if let Some(err) = view_state.last_error.clone() {
                div {
                    style: "display: flex; align-items: center; gap: 8px; padding: 6px 10px; background: #fff1f0; border: 1px solid #f0b4ae; border-radius: 6px;",
                    span { "Could not load rows: {err}" }
                    button {
                        onclick: move |_| {
                            let ticket = view.write().retry();
                            if let Some(ticket) = ticket {
                                spawn_page_fetch(query_for_retry.clone(), view, ticket);
                            }
                        },
                        "Retry"
                    }
                }
            }

            SelectionBanner {
                affordance: affordance,
                page_len: page_len,
                universe_pending: pending,
                on_select_page: move |_| {
                    controller.write().select_all_on_page(&page_ids_for_banner);
                },
                on_select_dataset: move |_| {
                    let total = view.peek().total_row_count();
                    let Some(request) = controller.write().begin_select_all_in_dataset(total) else {
                        return;
                    };
                    let query = query_for_universe.clone();
                    spawn(async move {
                        let result = query.fetch_universe(&request).await;
                        let outcome = controller.write().finish_select_all_in_dataset(&request, result);
                        match outcome {
                            UniverseOutcome::Applied { .. } => {
                                let count = controller.peek().selection().selected_count();
                                status.set(format!("{count} rows selected"));
                            }
                            UniverseOutcome::Stale => {}
                            UniverseOutcome::Failed(err) => {
                                status.set(format!("Select all failed: {err}"));
                            }
                        }
                    });
                },
                on_clear: move |_| {
                    let cleared = controller.write().clear_all();
                    status.set(format!("Deselected {cleared} rows"));
                },
            }

            div {
                style: "display: flex; align-items: center; gap: 8px;",
                button {
                    disabled: busy() || selected_count == 0,
                    onclick: {
                        let bulk_service = bulk_service.clone();
                        let query = query_for_bulk.clone();
                        move |_| {
                            let action = if controller.peek().show_trash() {
                                BulkAction::Restore
                            } else {
                                BulkAction::MoveToTrash
                            };
                            let ids = controller.peek().selection().to_vec();
                            let confirm = MessageDialog::new()
                                .set_level(MessageLevel::Warning)
                                .set_title("Bulk action")
                                .set_description(format!("Apply \"{}\" to {} rows?", action.label(), ids.len()))
                                .set_buttons(MessageButtons::YesNo)
                                .show();
                            if confirm != MessageDialogResult::Yes {
                                return;
                            }
                            let bulk_service = bulk_service.clone();
                            let query = query.clone();
                            spawn(async move {
                                busy.set(true);
                                match bulk_service.apply_async(action, ids).await {
                                    Ok(report) => {
                                        controller.write().apply_bulk_report(&report);
                                        status.set(bulk_summary(action, &report));
                                        let ticket = view.write().invalidate_all();
                                        if let Some(ticket) = ticket {
                                            spawn_page_fetch(query, view, ticket);
                                        }
                                    }
                                    Err(err) => status.set(format!("Bulk action failed: {err}")),
                                }
                                busy.set(false);
                            });
                        }
                    },
                    if show_trash { "Restore selected" } else { "Move selected to trash" }
                }
                span { "{selected_count} selected" }
                if view_state.is_validating {
                    span { style: "color: #888;", "Loading…" }
                }
            }

            div {
                style: "overflow: auto; border: 1px solid #ddd; border-radius: 6px;",
                table {
                    style: "border-collapse: collapse; width: 100%;",
                    thead {
                        tr {
                            th {
                                style: "width: 32px; padding: 6px; border-bottom: 1px solid #ccc;",
                                button {
                                    style: "border: none; background: transparent; cursor: pointer; font-size: 16px;",
                                    disabled: page_len == 0,
                                    onclick: move |_| {
                                        controller.write().toggle_page(&page_ids_for_header);
                                    },
                                    "{header_glyph}"
                                }
                            }
                            {page.columns.iter().map(|column| rsx!(
                                th {
                                    style: "text-align: left; padding: 6px; border-bottom: 1px solid #ccc;",
                                    "{column}"
                                }
                            ))}
                        }
                    }
                    tbody {
                        {page.rows.iter().map(|row| {
                            let id: RecordId = row.id.clone();
                            let checked = controller.read().selection().is_selected(&id);
                            let expanded = layout.read().is_expanded(&id);
                            let background = if checked { "#f3f7ff" } else { "transparent" };
                            let page_for_click = page.clone();
                            let id_for_click = id.clone();
                            let id_for_expand = id.clone();
                            let span = page.columns.len() + 1;
                            let detail = page
                                .columns
                                .iter()
                                .zip(row.values.iter())
                                .map(|(column, value)| format!("{column}: {value}"))
                                .collect::<Vec<_>>()
                                .join("  ·  ");
                            rsx!(
                                tr {
                                    key: "{id}",
                                    style: "background: {background};",
                                    ondoubleclick: move |_| layout.write().toggle_expanded(&id_for_expand),
                                    td {
                                        style: "padding: 4px 6px; border-bottom: 1px solid #eee;",
                                        input {
                                            r#type: "checkbox",
                                            checked: checked,
                                            onclick: move |event| {
                                                let shift = event.modifiers().contains(Modifiers::SHIFT);
                                                controller.write().click_row(&page_for_click.rows, &id_for_click, shift);
                                            }
                                        }
                                    }
                                    {row.values.iter().map(|value| rsx!(
                                        td {
                                            style: "padding: 4px 6px; border-bottom: 1px solid #eee;",
                                            "{value}"
                                        }
                                    ))}
                                }
                                if expanded {
                                    tr {
                                        td {
                                            colspan: "{span}",
                                            style: "padding: 6px 12px; background: #fafafa; color: #444;",
                                            "{detail}"
                                        }
                                    }
                                }
                            )
                        })}
                    }
                }
                if page_len == 0 && !view_state.is_validating {
                    div { style: "padding: 12px; color: #888;", "No rows" }
                }
            }

            div {
                style: "display: flex; align-items: center; gap: 8px;",
                button {
                    disabled: page_index == 0,
                    onclick: move |_| controller.write().set_page(page_index - 1),
                    "Previous"
                }
                span { "Page {page_label} of {page_count} ({total_rows} rows)" }
                button {
                    disabled: page_label >= page_count,
                    onclick: move |_| controller.write().set_page(page_index + 1),
                    "Next"
                }
            }
        }
    }
}
