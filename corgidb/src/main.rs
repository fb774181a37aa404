use actix_web::{web, App, HttpServer};
use corgidb::cli::{self, Mode};
use corgidb::config::Settings;
use corgidb::db::mysql::{MySqlConnection, MySqlConnector};
use corgidb::job_controller::state::{self, JobsState};
use corgidb::secrets::{self, KeyringStore, TerminalPrompt};
use corgidb::services::{self, AppContext};
use env_logger::Env;
use log::{error, info};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let mode = cli::parse_mode(std::env::args_os()).unwrap_or_else(|e| e.exit());
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let settings = Settings::from_env();

    if mode == Mode::Login {
        return match secrets::connect(
            &settings.database,
            &KeyringStore,
            &TerminalPrompt,
            MySqlConnection::open,
        ) {
            Ok(_) => {
                info!("Connected to {}", settings.database.server);
                Ok(())
            }
            Err(e) => {
                error!("{}", e);
                Err(std::io::Error::other(e.to_string()))
            }
        };
    }

    let url = format!("http://{}:{}", settings.host, settings.port);

    let (jobs_state, rx) = JobsState::new(100);
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        state::start_job_updater(updater_state, rx).await;
    });

    let context = AppContext {
        connector: Arc::new(MySqlConnector {
            settings: settings.database.clone(),
        }),
        settings: settings.clone(),
    };

    info!(
        "Reconciling against {}@{}:{}/{}",
        settings.database.username,
        settings.database.server,
        settings.database.port,
        settings.database.database
    );
    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(context.clone()))
            .service(services::schema::configure_routes())
            .service(services::tables::configure_routes())
            .service(services::jobs::configure_routes())
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
