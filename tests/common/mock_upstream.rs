use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

/// What the mock saw for one `/chat/completions` call.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub authorization: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub trace: Option<String>,
    pub body: Value,
}

type Seen = Arc<Mutex<Vec<SeenRequest>>>;

/// OpenAI-compatible upstream whose behaviour is picked by the model
/// prefix: `ok/`, `status/`, `envelope/`, `empty/`, `slow/`.
pub struct MockUpstream {
    pub url: String,
    seen: Seen,
    handle: ServerHandle,
}

impl MockUpstream {
    pub async fn start() -> std::io::Result<Self> {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let data = web::Data::new(seen.clone());
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/v1/chat/completions", web::post().to(chat_completions_handler))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))?;
        let port = server.addrs()[0].port();
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Ok(MockUpstream {
            url: format!("http://127.0.0.1:{}/v1", port),
            seen,
            handle,
        })
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn chat_completions_handler(
    req: HttpRequest,
    body: web::Json<Value>,
    seen: web::Data<Seen>,
) -> HttpResponse {
    let body = body.into_inner();
    let model = body["model"].as_str().unwrap_or_default().to_string();
    seen.lock().push(SeenRequest {
        authorization: header(&req, "authorization"),
        referer: header(&req, "http-referer"),
        title: header(&req, "x-title"),
        trace: header(&req, "x-trace"),
        body,
    });

    let ok = |model: &str| {
        HttpResponse::Ok().json(json!({
            "id": "gen-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": format!("  hello from {}  ", model)},
                "finish_reason": "stop"
            }]
        }))
    };

    match model.split('/').next().unwrap_or_default() {
        "ok" => ok(&model),
        "status" => HttpResponse::ServiceUnavailable().body("upstream overloaded"),
        "envelope" => HttpResponse::Ok().json(json!({
            "error": {"message": "quota exceeded", "code": 429}
        })),
        "empty" => HttpResponse::Ok().json(json!({ "choices": [] })),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            ok(&model)
        }
        _ => HttpResponse::NotFound().finish(),
    }
}
