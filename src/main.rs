use chat_relay::config::{DEFAULT_BASE_URL, RelayConfig};
use chat_relay::logging::{self, LoggingConfig};
use chat_relay::server;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(
        long,
        default_value = "127.0.0.1",
        help = "Host address to bind the server to"
    )]
    host: String,

    #[arg(long, default_value_t = 5000, help = "Port number to listen on")]
    port: u16,

    #[arg(
        long,
        env = "OPENROUTER_API_KEY",
        hide_env_values = true,
        help = "API key for the completion backend"
    )]
    api_key: Option<String>,

    #[arg(
        long,
        env = "RELAY_BASE_URL",
        default_value = DEFAULT_BASE_URL,
        help = "Base URL of the OpenAI-compatible completion API"
    )]
    base_url: String,

    #[arg(long, env = "RELAY_REFERER", help = "Value sent upstream as HTTP-Referer")]
    referer: Option<String>,

    #[arg(long, env = "RELAY_TITLE", help = "Value sent upstream as X-Title")]
    title: Option<String>,

    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated list of candidate models to race"
    )]
    candidate_models: Vec<String>,

    #[arg(long, help = "Model used to review the winning reply")]
    guardian_model: Option<String>,

    #[arg(long, help = "Return race winners without guardian review")]
    disable_guardian: bool,

    #[arg(long, default_value_t = 10, help = "Overall race timeout in seconds")]
    race_timeout_secs: u64,

    #[arg(
        long,
        default_value_t = 60,
        help = "Transport timeout for a single upstream request in seconds"
    )]
    request_timeout_secs: u64,

    #[arg(long, default_value_t = 40, help = "Maximum number of history messages kept")]
    max_history: usize,

    #[arg(long, default_value_t = 1024, help = "Max tokens requested per completion")]
    max_tokens: u32,

    #[arg(long, default_value_t = 0.7, help = "Sampling temperature for candidates")]
    candidate_temperature: f32,

    #[arg(long, default_value_t = 0.3, help = "Sampling temperature for the guardian")]
    guardian_temperature: f32,

    #[arg(long, help = "Log level: trace, debug, info, warn or error")]
    log_level: Option<String>,
}

impl Args {
    fn into_relay_config(self) -> RelayConfig {
        let defaults = RelayConfig::default();
        RelayConfig {
            host: self.host,
            port: self.port,
            base_url: self.base_url,
            api_key: self.api_key,
            referer: self.referer,
            title: self.title,
            candidate_models: if self.candidate_models.is_empty() {
                defaults.candidate_models
            } else {
                self.candidate_models
            },
            guardian_model: self.guardian_model.unwrap_or(defaults.guardian_model),
            disable_guardian: self.disable_guardian,
            race_timeout_secs: self.race_timeout_secs,
            request_timeout_secs: self.request_timeout_secs,
            max_history: self.max_history,
            max_tokens: Some(self.max_tokens),
            candidate_temperature: self.candidate_temperature,
            guardian_temperature: self.guardian_temperature,
            log_level: self.log_level,
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_relay_config();
    logging::init_logging(LoggingConfig::from_level_name(config.log_level.as_deref()));

    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }
    server::startup(config).await
}
