use crate::config::RelayConfig;
use crate::conversation::ConversationStore;
use crate::gateway::{CompletionBackend, CompletionGateway, CompletionOptions, HttpCompletionBackend};
use crate::io_struct::{
    ChatReqInput, ChatRespOutput, HealthOutput, MessageOutput, ModelsOutput, StatsOutput,
};
use crate::models::ModelRegistry;
use crate::persona::PersonaCatalog;
use crate::session::{ChatSession, RequestError};
use actix_web::{HttpRequest, HttpResponse, HttpServer, error, get, post, web};
use serde_json::json;
use std::sync::Arc;

pub struct AppState {
    pub session: ChatSession,
}

impl AppState {
    pub fn new(config: &RelayConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        let registry = ModelRegistry::new(
            config.candidate_models.clone(),
            config.guardian_model.clone(),
        );
        let guardian_options = (!config.disable_guardian)
            .then(|| CompletionOptions::new(config.max_tokens, Some(config.guardian_temperature)));
        let session = ChatSession::new(
            Arc::new(ConversationStore::new(config.max_history)),
            registry,
            PersonaCatalog::default(),
            CompletionGateway::new(backend),
            config.race_timeout(),
            guardian_options,
            CompletionOptions::new(config.max_tokens, Some(config.candidate_temperature)),
        );
        Self { session }
    }
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    log::warn!("Rejected chat payload: {}", err);
    let resp = HttpResponse::BadRequest().json(json!({ "error": "Invalid JSON body" }));
    error::InternalError::from_response(err, resp).into()
}

#[get("/health")]
pub async fn health(app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthOutput {
        status: "Relay up and running".to_string(),
        models: app_state.session.registry().total_count(),
    })
}

#[post("/chat")]
pub async fn chat(
    req: web::Json<ChatReqInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, RequestError> {
    let req = req.into_inner();
    let message = req.message.as_deref().unwrap_or_default();
    let outcome = app_state
        .session
        .handle_turn(message, req.requested_model(), req.language.as_deref())
        .await
        .inspect_err(|e| log::error!("Chat turn failed: {}", e))?;
    Ok(HttpResponse::Ok().json(ChatRespOutput::from(outcome)))
}

#[post("/clear")]
pub async fn clear(app_state: web::Data<AppState>) -> HttpResponse {
    app_state.session.clear();
    HttpResponse::Ok().json(MessageOutput {
        message: "Chat history cleared".to_string(),
    })
}

#[get("/models")]
pub async fn models(app_state: web::Data<AppState>) -> HttpResponse {
    let session = &app_state.session;
    HttpResponse::Ok().json(ModelsOutput {
        candidates: session.registry().candidate_ids(),
        guardian: session.registry().guardian().id.clone(),
        guardian_enabled: session.guardian_enabled(),
    })
}

#[get("/stats")]
pub async fn stats(app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StatsOutput::from(app_state.session.stats()))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(chat)
        .service(clear)
        .service(models)
        .service(stats);
}

/// Registers every route at the root and again under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .configure(routes)
        .service(web::scope("/api").configure(routes));
}

pub async fn startup(config: RelayConfig) -> anyhow::Result<()> {
    config.validate()?;
    let backend = HttpCompletionBackend::new(config.backend_config()?)?;
    let app_state = web::Data::new(AppState::new(&config, Arc::new(backend)));

    log::info!("Starting server at {}:{}", config.host, config.port);
    log::info!(
        "Candidates: {}; guardian: {}{}",
        config.candidate_models.join(", "),
        config.guardian_model,
        if config.disable_guardian { " (disabled)" } else { "" }
    );

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await?;

    Ok(())
}
