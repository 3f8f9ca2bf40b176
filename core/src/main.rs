mod cors;

use actix_web::{App, HttpServer, web};
use api_subs::ServiceState;
use common::env_config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        if let Err(e) = logger::setup(config.log_file.as_deref()) {
            eprintln!("Failed to set up logger: {}", e);
        }
    }

    // init Razorpay and Firestore clients once, a failure is served as 500s
    let state = web::Data::new(ServiceState::initialize(&config));

    log::info!(
        "Listening on {}:{}",
        config.server_host,
        config.server_port
    );

    let console_logging_enabled = config.console_logging_enabled;
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(actix_web::middleware::Condition::new(
                console_logging_enabled,
                logger::middleware(),
            )) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(api_subs::mount_subs())
            .service(api_subs::mount_netlify())
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
