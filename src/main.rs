mod api_routes;
mod api_state;
mod models;
mod service;
mod utils;
mod web_routes;

use crate::models::config::{setup_config, Config};
use anyhow::{Context, Result};
use log::{debug, info, warn};

#[macro_use]
extern crate rocket;

use api_state::AppState;
use rocket::fairing::AdHoc;
use rocket::http::Header;
use rocket_dyn_templates::Template;

fn build_rocket(config: Config) -> rocket::Rocket<rocket::Build> {
    let figment = rocket::Config::figment().merge(("port", config.port));
    let refresh_on_startup = config.refresh_on_startup;

    // Initialize application state
    let app_state = AppState::new(config);

    let rocket = rocket::custom(figment)
        .manage(app_state)
        .attach(Template::fairing())
        .attach(AdHoc::on_response("CORS", |_, response| {
            Box::pin(async move {
                response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
            })
        }))
        .mount(
            "/",
            routes![
                web_routes::index,
                web_routes::dashboard,
                web_routes::refresh_dashboard,
            ],
        )
        .mount(
            "/api",
            routes![
                api_routes::datto_backups,
                api_routes::acronis_backups,
                api_routes::refresh,
                api_routes::get_view,
                api_routes::health_check,
            ],
        );

    if !refresh_on_startup {
        return rocket;
    }

    // The first refresh calls back into the gateway routes, so it must not
    // hold up liftoff.
    rocket.attach(AdHoc::on_liftoff("Initial refresh", |rocket| {
        Box::pin(async move {
            let Some(state) = rocket.state::<AppState>().cloned() else {
                warn!("Application state missing, skipping initial refresh");
                return;
            };
            rocket::tokio::spawn(async move {
                if let Err(e) = state.refresh().await {
                    warn!("Initial refresh failed: {}", e);
                }
            });
        })
    }))
}

#[rocket::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    info!("Backup dashboard starting...");
    let config = setup_config().context("Failed to load configuration")?;
    debug!("Loaded config: {:?}", &config);

    build_rocket(config)
        .launch()
        .await
        .context("Rocket server failed")?;
    Ok(())
}
