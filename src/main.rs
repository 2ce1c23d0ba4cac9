use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use taskgate::auth::{SessionManager, TokenCodec};
use taskgate::{db, routes, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match db::connect(&config.database_url, config.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to {}: {}", config.database_url, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::migrate(&pool).await {
        log::error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let codec = TokenCodec::from_config(&config);
    let sessions = match SessionManager::new(pool.clone(), codec, config.bcrypt_cost) {
        Ok(sessions) => sessions,
        Err(e) => {
            log::error!("Failed to initialise sessions: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting taskgate server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
