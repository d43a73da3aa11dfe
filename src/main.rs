use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use prova_server::{app_state::AppState, config::Config, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let state = AppState::new(config.clone())
        .await
        .expect("failed to initialise application state");

    // background sweep over expired in-progress attempts
    let sweeper = state.attempt_service.clone();
    let sweep_interval = config.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = sweeper.sweep_expired().await {
                log::warn!("sweep failed: {}", err);
            }
        }
    });

    log::info!(
        "Starting HTTP server on {}:{}",
        config.web_server_host,
        config.web_server_port
    );

    let bind_addr = (config.web_server_host.clone(), config.web_server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(handlers::health_check)
            .service(handlers::health_check_ready)
            .service(handlers::create_assignment)
            .service(handlers::list_assignments)
            // register the by-name route ahead of the {id} matcher
            .service(handlers::get_assignment_by_name)
            .service(handlers::seed_attempt)
            .service(handlers::list_attempts)
            .service(handlers::start_or_resume)
            .service(handlers::get_assignment)
            .service(handlers::delete_assignment)
            .service(handlers::submit_answer)
            .service(handlers::finish_attempt)
            .service(handlers::leave_attempt)
            .service(handlers::get_score)
            .service(handlers::list_answers)
            .service(handlers::delete_attempt)
    })
    .bind(bind_addr)?
    .run()
    .await
}
