use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use s3_utils::S3Client;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use ticket_service::handlers;
use ticket_service::services::{
    NotificationDispatcher, NotificationQueue, NotificationWorker, S3ObjectStore, SmtpMailer,
};
use ticket_service::store::PgTicketStore;
use ticket_service::{db, logging, AppState, Config};

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    logging::init_tracing();

    let config = Config::from_env().map_err(|e| io_error("failed to load configuration", e))?;
    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!(env = %config.app.env, %bind_address, "starting ticket-service");

    let pool = db::init_pool(&config.database)
        .await
        .map_err(|e| io_error("failed to connect to database", e))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| io_error("failed to run migrations", e))?;

    let s3 = S3Client::with_config(config.s3.clone())
        .await
        .map_err(|e| io_error("failed to initialize S3 client", e))?;
    let mailer =
        SmtpMailer::new(&config.smtp).map_err(|e| io_error("failed to configure mailer", e))?;

    let store = Arc::new(PgTicketStore::new(pool));
    let (queue, jobs) = NotificationQueue::bounded(config.notifications.queue_capacity);
    let worker = NotificationWorker::new(
        NotificationDispatcher::new(store.clone(), Arc::new(mailer)),
        jobs,
    )
    .spawn();

    let state = AppState::from_config(
        &config,
        store,
        Arc::new(S3ObjectStore::new(s3.operations())),
        queue,
    );
    let keys = state.jwt.clone();

    HttpServer::new(move || {
        let keys = keys.clone();
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(actix_middleware::Logger::default())
            .configure(|cfg| handlers::configure_routes(cfg, keys))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    // Give queued notifications a moment to go out before exiting.
    match tokio::time::timeout(Duration::from_secs(5), worker).await {
        Ok(Err(e)) => tracing::warn!(error = %e, "notification worker ended abnormally"),
        Err(_) => tracing::warn!("notification worker still busy at shutdown"),
        Ok(Ok(())) => {}
    }
    tracing::info!("ticket-service stopped");
    Ok(())
}
