use crate::api_state::{AppState, ViewUnavailable};
use crate::models::api::{ErrorResponse, RefreshResponse};
use crate::models::backup_row::UnifiedBackupRow;
use crate::models::view::{DashboardView, ViewQuery};
use crate::service::gateway::Vendor;
use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

pub type ApiError = (Status, Json<ErrorResponse>);

fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

async fn vendor_backups(
    state: &State<AppState>,
    vendor: Vendor,
) -> Result<Json<Vec<UnifiedBackupRow>>, ApiError> {
    match state.vendor_client(vendor).fetch_backups().await {
        Ok(rows) => Ok(Json(rows)),
        Err(e) => {
            error!("Error fetching {} data: {}", vendor, e);
            Err(api_error(Status::InternalServerError, e.to_string()))
        }
    }
}

/// GET /api/datto/backups - Datto backups as unified rows
#[get("/datto/backups")]
pub async fn datto_backups(
    state: &State<AppState>,
) -> Result<Json<Vec<UnifiedBackupRow>>, ApiError> {
    vendor_backups(state, Vendor::Datto).await
}

/// GET /api/acronis/backups - Acronis backups as unified rows
#[get("/acronis/backups")]
pub async fn acronis_backups(
    state: &State<AppState>,
) -> Result<Json<Vec<UnifiedBackupRow>>, ApiError> {
    vendor_backups(state, Vendor::Acronis).await
}

/// POST /api/refresh - Reload all sources
#[post("/refresh")]
pub async fn refresh(state: &State<AppState>) -> Result<Json<RefreshResponse>, ApiError> {
    match state.refresh().await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Refresh failed: {}", e);
            Err(api_error(Status::InternalServerError, e.to_string()))
        }
    }
}

/// GET /api/view - Filtered and sorted rows of the current snapshot
#[get("/view?<query..>")]
pub fn get_view(query: ViewQuery, state: &State<AppState>) -> Result<Json<DashboardView>, ApiError> {
    let criteria = query
        .criteria()
        .map_err(|e| api_error(Status::BadRequest, e.to_string()))?;
    let sort = query
        .sort_spec()
        .map_err(|e| api_error(Status::BadRequest, e.to_string()))?;

    match state.view(criteria, sort) {
        Ok(view) => Ok(Json(view)),
        Err(ViewUnavailable::NotLoaded) => Err(api_error(
            Status::ServiceUnavailable,
            "Backup data has not been loaded yet",
        )),
        Err(ViewUnavailable::RefreshFailed(message)) => {
            Err(api_error(Status::InternalServerError, message))
        }
    }
}

/// GET /api/health - Health check endpoint
#[get("/health")]
pub fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use crate::build_rocket;
    use crate::models::config::Config;
    use rocket::http::Status;
    use rocket::local::asynchronous::Client;
    use serde_json::Value;
    use std::collections::HashMap;

    const FEED: &str = "\
Status,Computer Name,Backup Start Time,Files backed up now,Files failed to backup,Files considered for backup
Successful,PC1,05/01/2024 20:00:00,100,0,100
,PC2,05/01/2024 21:00:00,1,0,1
";

    const DATTO_ROWS: &str = r#"[{"Status": "Failed", "Computer Name": "NAS-1", "Source": "Datto",
        "Backup Start Time": "05/01/2024 22:00:00", "Files backed up now": 0,
        "Files failed to backup": 9, "Files considered for backup": 9}]"#;

    fn test_config(pairs: &[(&str, &str)]) -> Config {
        let mut vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.entry("REFRESH_ON_STARTUP".to_string())
            .or_insert_with(|| "false".to_string());
        Config::from_lookup(move |name| vars.get(name).cloned()).unwrap()
    }

    async fn client_for(config: Config) -> Client {
        Client::tracked(build_rocket(config))
            .await
            .expect("valid rocket instance")
    }

    async fn json_body(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
        let body = response.into_string().await.expect("response body");
        serde_json::from_str(&body).expect("JSON body")
    }

    #[rocket::async_test]
    async fn test_health_check() {
        let client = client_for(test_config(&[])).await;
        let response = client.get("/api/health").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
        assert_eq!(response.into_string().await.unwrap(), "OK");
    }

    #[rocket::async_test]
    async fn test_gateway_attaches_bearer_key_and_normalizes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/backups")
            .match_header("authorization", "Bearer datto-secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"status": "success", "deviceName": "NAS-1",
                     "startTime": "2024-05-01T22:00:00Z", "filesBackedUp": 3,
                     "filesFailed": 0, "filesConsidered": 3}]"#,
            )
            .create_async()
            .await;

        let url = server.url();
        let client = client_for(test_config(&[
            ("DATTO_BASE_URL", url.as_str()),
            ("DATTO_API_KEY", "datto-secret"),
        ]))
        .await;

        let response = client.get("/api/datto/backups").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = json_body(response).await;
        mock.assert_async().await;
        assert_eq!(body[0]["Status"], "Successful");
        assert_eq!(body[0]["Computer Name"], "NAS-1");
        assert_eq!(body[0]["Source"], "Datto");
        assert_eq!(body[0]["Backup Start Time"], "05/01/2024 22:00:00");
        assert_eq!(body[0]["Files considered for backup"], 3);
    }

    #[rocket::async_test]
    async fn test_gateway_vendor_failure_is_500_without_the_secret() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/backups")
            .with_status(502)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let url = server.url();
        let client = client_for(test_config(&[
            ("ACRONIS_BASE_URL", url.as_str()),
            ("ACRONIS_API_KEY", "acronis-secret"),
        ]))
        .await;

        let response = client.get("/api/acronis/backups").dispatch().await;
        assert_eq!(response.status(), Status::InternalServerError);

        let body = json_body(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("502"));
        assert!(!message.contains("acronis-secret"));
    }

    #[rocket::async_test]
    async fn test_gateway_without_key_reports_missing_credential() {
        let client = client_for(test_config(&[])).await;

        let response = client.get("/api/datto/backups").dispatch().await;
        assert_eq!(response.status(), Status::InternalServerError);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("DATTO_API_KEY"));
    }

    #[rocket::async_test]
    async fn test_view_before_refresh_is_unavailable() {
        let client = client_for(test_config(&[])).await;

        let response = client.get("/api/view").dispatch().await;
        assert_eq!(response.status(), Status::ServiceUnavailable);
        assert!(json_body(response).await["error"].is_string());
    }

    #[rocket::async_test]
    async fn test_view_rejects_malformed_parameters() {
        let client = client_for(test_config(&[])).await;

        let response = client.get("/api/view?range=fortnight").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("range"));
    }

    #[rocket::async_test]
    async fn test_view_rejects_zero_day_range() {
        let client = client_for(test_config(&[])).await;

        let response = client.get("/api/view?range=0").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("positive number of days"));
    }

    #[rocket::async_test]
    async fn test_refresh_then_view() {
        let mut server = mockito::Server::new_async().await;
        let _csv = server
            .mock("GET", "/feed.csv")
            .with_status(200)
            .with_body(FEED)
            .create_async()
            .await;
        let _datto = server
            .mock("GET", "/api/datto/backups")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(DATTO_ROWS)
            .create_async()
            .await;
        let _acronis = server
            .mock("GET", "/api/acronis/backups")
            .with_status(500)
            .with_body(r#"{"error": "Acronis responded with HTTP 503"}"#)
            .create_async()
            .await;

        let csv_url = format!("{}/feed.csv", server.url());
        let gateway_url = format!("{}/api", server.url());
        let client = client_for(test_config(&[
            ("CSV_URL", csv_url.as_str()),
            ("GATEWAY_BASE_URL", gateway_url.as_str()),
        ]))
        .await;

        let response = client.post("/api/refresh").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["generation"], 1);
        assert_eq!(body["row_count"], 2);
        assert_eq!(body["sources"][0]["rows"], 2);
        assert_eq!(body["sources"][1]["rows"], 1);
        assert!(body["sources"][2]["error"].is_string());

        let response = client
            .get("/api/view?sort=failed&dir=desc")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let view = json_body(response).await;
        assert_eq!(view["summary"]["total"], 2);
        assert_eq!(view["rows"][0]["Computer Name"], "NAS-1");
        assert_eq!(view["rows"][1]["Computer Name"], "PC1");

        let response = client.get("/api/view?source=IDrive").dispatch().await;
        let view = json_body(response).await;
        assert_eq!(view["rows"].as_array().unwrap().len(), 1);
        assert_eq!(view["criteria"]["source"], "IDrive");
    }

    #[rocket::async_test]
    async fn test_csv_failure_aborts_refresh_and_view() {
        let mut server = mockito::Server::new_async().await;
        let _csv = server
            .mock("GET", "/feed.csv")
            .with_status(500)
            .create_async()
            .await;
        let _vendors = server
            .mock("GET", mockito::Matcher::Regex(r"^/api/\w+/backups$".to_string()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let csv_url = format!("{}/feed.csv", server.url());
        let gateway_url = format!("{}/api", server.url());
        let client = client_for(test_config(&[
            ("CSV_URL", csv_url.as_str()),
            ("GATEWAY_BASE_URL", gateway_url.as_str()),
        ]))
        .await;

        let response = client.post("/api/refresh").dispatch().await;
        assert_eq!(response.status(), Status::InternalServerError);
        assert!(json_body(response).await["error"]
            .as_str()
            .unwrap()
            .contains("IDrive"));

        let response = client.get("/api/view").dispatch().await;
        assert_eq!(response.status(), Status::InternalServerError);
    }
}
