use crate::api_state::{AppState, ViewUnavailable};
use crate::models::view::{DashboardView, SortKey, SortSpec, ViewQuery};
use log::warn;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::State;
use rocket_dyn_templates::{context, Template};
use serde::Serialize;

const STATUS_OPTIONS: [&str; 3] = ["Successful", "Warning", "Failed"];

const RANGE_OPTIONS: [(&str, &str); 4] = [
    ("all", "All time"),
    ("1", "Last 24 hours"),
    ("7", "Last 7 days"),
    ("30", "Last 30 days"),
];

/// Filter values echoed back into the form and the header sort forms
#[derive(Debug, Default, Serialize)]
struct FilterForm {
    status: String,
    device: String,
    source: String,
    range: String,
}

impl From<&ViewQuery> for FilterForm {
    fn from(query: &ViewQuery) -> Self {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            status: value(&query.status),
            device: value(&query.device),
            source: value(&query.source),
            range: query.range.clone().unwrap_or_else(|| "all".to_string()),
        }
    }
}

/// One clickable column heading
#[derive(Debug, Serialize)]
struct SortHeader {
    label: &'static str,
    next_sort: &'static str,
    next_dir: &'static str,
    active_dir: Option<&'static str>,
}

fn sort_headers(current: Option<SortSpec>) -> Vec<SortHeader> {
    SortKey::ALL
        .into_iter()
        .map(|key| {
            let next = SortSpec::toggle(current, key);
            SortHeader {
                label: key.label(),
                next_sort: next.key.as_str(),
                next_dir: next.direction.as_str(),
                active_dir: current
                    .filter(|spec| spec.key == key)
                    .map(|spec| spec.direction.as_str()),
            }
        })
        .collect()
}

/// GET / - Redirect to dashboard
#[get("/")]
pub fn index() -> Redirect {
    Redirect::to("/dashboard")
}

/// GET /dashboard - Dashboard page
#[get("/dashboard?<query..>")]
pub fn dashboard(query: ViewQuery, state: &State<AppState>) -> (Status, Template) {
    let mut filters = FilterForm::from(&query);

    let parsed = query
        .criteria()
        .and_then(|criteria| query.sort_spec().map(|sort| (criteria, sort)));
    let (criteria, sort) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            return (
                Status::BadRequest,
                render(filters, None, sort_headers(None), Some(e.to_string()), false),
            )
        }
    };

    filters.range = criteria.range.as_query_value();
    let headers = sort_headers(sort);
    let page = match state.view(criteria, sort) {
        Ok(view) => render(filters, Some(view), headers, None, false),
        Err(ViewUnavailable::NotLoaded) => render(filters, None, headers, None, true),
        Err(ViewUnavailable::RefreshFailed(message)) => {
            render(filters, None, headers, Some(message), false)
        }
    };
    (Status::Ok, page)
}

/// POST /dashboard/refresh - Reload all sources, then show the dashboard
#[post("/dashboard/refresh")]
pub async fn refresh_dashboard(state: &State<AppState>) -> Redirect {
    // a failure is recorded in the state and shown by the page
    if let Err(e) = state.refresh().await {
        warn!("Dashboard refresh failed: {}", e);
    }
    Redirect::to("/dashboard")
}

fn render(
    filters: FilterForm,
    view: Option<DashboardView>,
    headers: Vec<SortHeader>,
    error: Option<String>,
    loading: bool,
) -> Template {
    Template::render(
        "dashboard",
        context! {
            title: "Backup Dashboard",
            active_tab: "dashboard",
            filters: filters,
            view: view,
            headers: headers,
            error: error,
            loading: loading,
            status_options: STATUS_OPTIONS,
            range_options: RANGE_OPTIONS,
        },
    )
}
