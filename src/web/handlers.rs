//! # Handlers HTTP — Os Endpoints do Tutor
//!
//! Cada função pública neste módulo é um handler Axum, mapeado a uma
//! rota em [`super::create_router()`].
//!
//! | Handler | Método | Retorno |
//! |---------|--------|---------|
//! | `home`, `lessons`, `quizzes`, `wellness`, `motivation`, `chat_page`, `journal`, `progress` | GET | Página completa |
//! | `set_user` | POST | Redirect 303 para a home do usuário |
//! | `generate_quiz`, `submit_quiz` | POST | HTMX fragment |
//! | `mood_check_in`, `save_journal`, `chat` | POST | HTMX fragment |
//! | `motivation_pick` | GET | HTMX fragment |
//! | `audio` | GET | `audio/mpeg` ou 204 |
//! | `status` | GET | JSON |
//! | `resolve` | POST | JSON |
//!
//! ## Trabalho Bloqueante
//!
//! O chat (classificador com timeout) e a síntese de voz (HTTP
//! bloqueante) rodam em `spawn_blocking`. Leituras e escritas no SQLite
//! são curtas e ficam inline.
//!
//! ## Usuário
//!
//! Vem de `?user=` nas páginas e do campo `user` nos formulários. Vazio
//! ou ausente vira `guest`.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::Utc;
use maud::html;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::state::AppState;
use super::templates;
use crate::core::content::{clamp_quiz_len, sample_quiz};
use crate::core::{CategoryFilter, LevelFilter, Utterance, UtteranceResult};
use crate::persistence::StoreResult;

pub const DEFAULT_USER: &str = "guest";

/// Quantos registros as listas de histórico mostram.
pub const HISTORY_LIMIT: usize = 5;

fn markup_to_html(m: maud::Markup) -> Html<String> {
    Html(m.into_string())
}

fn user_name(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_USER)
        .to_string()
}

/// Histórico para exibição; falha de leitura vira lista vazia + log.
fn recent<T>(result: StoreResult<Vec<T>>, what: &'static str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, what, "Falha ao ler histórico");
        Vec::new()
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user: Option<String>,
}

impl UserQuery {
    fn name(&self) -> String {
        user_name(self.user.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct UserForm {
    #[serde(default)]
    pub user: String,
}

/// Formulário com texto livre (check-in de humor, diário).
#[derive(Debug, Deserialize)]
pub struct TextForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub user: String,
    pub message: String,
}

/// Opções do gerador de quiz. `num` chega como texto do `<input>`.
#[derive(Debug, Deserialize)]
pub struct QuizOptionsForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub num: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    #[serde(default)]
    pub text: String,
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub text: String,
}

/// Resposta do endpoint `/status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `true` quando o classificador zero-shot terminou de carregar.
    pub classifier_ready: bool,
}

// ─── Páginas ──────────────────────────────────────────────────────

pub async fn home(Query(q): Query<UserQuery>) -> Html<String> {
    markup_to_html(templates::home_page(&q.name()))
}

pub async fn lessons(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Html<String> {
    markup_to_html(templates::lessons_page(&q.name(), state.dispatcher.content()))
}

pub async fn quizzes(Query(q): Query<UserQuery>) -> Html<String> {
    markup_to_html(templates::quizzes_page(&q.name()))
}

pub async fn wellness(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Html<String> {
    let user = q.name();
    let moods = recent(state.store.recent_moods(&user, HISTORY_LIMIT), "moods");
    markup_to_html(templates::wellness_page(&user, &moods))
}

pub async fn motivation(Query(q): Query<UserQuery>) -> Html<String> {
    markup_to_html(templates::motivation_page(&q.name()))
}

pub async fn chat_page(Query(q): Query<UserQuery>) -> Html<String> {
    markup_to_html(templates::chat_page(&q.name()))
}

pub async fn journal(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Html<String> {
    let user = q.name();
    let entries = recent(state.store.recent_journal_entries(&user, HISTORY_LIMIT), "journal");
    markup_to_html(templates::journal_page(&user, &entries))
}

pub async fn progress(State(state): State<AppState>, Query(q): Query<UserQuery>) -> Html<String> {
    let user = q.name();
    let results = recent(state.store.recent_quiz_results(&user, HISTORY_LIMIT), "progress");
    markup_to_html(templates::progress_page(&user, &results))
}

/// POST `/user` — registra o usuário e volta para a home dele.
pub async fn set_user(State(state): State<AppState>, Form(form): Form<UserForm>) -> Redirect {
    let user = user_name(Some(&form.user));
    if let Err(e) = state.store.ensure_user(&user, Utc::now()) {
        tracing::error!(user = %user, error = %e, "Falha ao registrar usuário");
    }
    Redirect::to(&templates::href("/", &[("user", user.as_str())]))
}

// ─── Fragmentos HTMX ──────────────────────────────────────────────

/// POST `/quizzes/generate` — sorteia as perguntas ou avisa que o pool está vazio.
pub async fn generate_quiz(
    State(state): State<AppState>,
    Form(form): Form<QuizOptionsForm>,
) -> Html<String> {
    let user = user_name(Some(&form.user));
    let (level, category) = match (
        form.level.parse::<LevelFilter>(),
        form.category.parse::<CategoryFilter>(),
    ) {
        (Ok(l), Ok(c)) => (l, c),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Filtro de quiz inválido");
            return markup_to_html(templates::warning(&e.to_string()));
        }
    };
    let n = clamp_quiz_len(form.num.trim().parse().ok());

    let pool = state.dispatcher.content().quiz_pool(level, category);
    let mut rng = StdRng::from_entropy();
    let questions = sample_quiz(&pool, n, &mut rng);
    tracing::debug!(pool = pool.len(), requested = n, "Quiz gerado");

    markup_to_html(templates::quiz_form(&user, category.record_label(), &questions))
}

/// POST `/quizzes/submit` — corrige e grava o resultado.
///
/// O formulário traz `ids` (ids das perguntas, separados por vírgula) e
/// um campo `answer_{id}` por pergunta respondida.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Html<String> {
    let user = user_name(form.get("user").map(String::as_str));
    let category = form
        .get("category")
        .and_then(|c| c.parse::<CategoryFilter>().ok())
        .unwrap_or_default();

    let content = state.dispatcher.content();
    let items: Vec<_> = form
        .get("ids")
        .map(String::as_str)
        .unwrap_or_default()
        .split(',')
        .filter_map(|id| id.trim().parse::<usize>().ok())
        .filter_map(|id| content.quiz_item(id))
        .collect();
    if items.is_empty() {
        return markup_to_html(templates::warning(templates::NO_QUESTIONS_WARNING));
    }

    let answers: Vec<Option<&str>> = items
        .iter()
        .map(|q| form.get(&format!("answer_{}", q.id)).map(String::as_str))
        .collect();

    let (score, saved) = state.dispatcher.submit_quiz(
        &user,
        category.record_label(),
        &items,
        &answers,
        Utc::now(),
    );
    markup_to_html(templates::quiz_result(&score, saved))
}

/// POST `/wellness` — check-in de humor + histórico atualizado.
pub async fn mood_check_in(
    State(state): State<AppState>,
    Form(form): Form<TextForm>,
) -> Html<String> {
    let user = user_name(Some(&form.user));
    let mut rng = StdRng::from_entropy();
    let outcome = state
        .dispatcher
        .check_in(&user, &form.text, Utc::now(), &mut rng);
    let moods = recent(state.store.recent_moods(&user, HISTORY_LIMIT), "moods");
    markup_to_html(templates::mood_panel(outcome.as_ref(), &moods))
}

/// GET `/motivation/{kind}` — `quote`, `affirmation` ou `inspiration`.
pub async fn motivation_pick(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let content = state.dispatcher.content();
    let mut rng = StdRng::from_entropy();
    let picked = match kind.as_str() {
        "quote" => content.pick_motivation(&mut rng),
        "affirmation" => content.pick_affirmation(&mut rng),
        "inspiration" => content.pick_inspiration(&mut rng),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    Ok(markup_to_html(templates::motivation_line(picked.unwrap_or_default())))
}

/// POST `/journal` — grava a reflexão e devolve as entradas recentes.
pub async fn save_journal(
    State(state): State<AppState>,
    Form(form): Form<TextForm>,
) -> Html<String> {
    let user = user_name(Some(&form.user));
    let saved = state.dispatcher.write_journal(&user, &form.text, Utc::now());
    let entries = recent(state.store.recent_journal_entries(&user, HISTORY_LIMIT), "journal");
    markup_to_html(templates::journal_panel(Some(saved), &entries))
}

/// POST `/chat` — resolve o intent e devolve a troca de mensagens.
///
/// Mensagem em branco devolve fragmento vazio (nada é despachado).
pub async fn chat(State(state): State<AppState>, Form(form): Form<ChatForm>) -> Html<String> {
    let user = user_name(Some(&form.user));
    let dispatcher = state.dispatcher.clone();
    let message = form.message;

    let result = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::from_entropy();
        dispatcher.chat(&user, &message, Utc::now(), &mut rng)
    })
    .await;

    markup_to_html(match result {
        Ok(Some((resolved, reply))) => {
            tracing::info!(intent = %resolved.intent, source = ?resolved.source, "Mensagem respondida");
            templates::chat_exchange(&resolved, &reply)
        }
        Ok(None) => html! {},
        Err(e) => {
            tracing::error!(error = %e, "Task do chat falhou");
            templates::warning("Something went wrong, please try again.")
        }
    })
}

// ─── Áudio e JSON ─────────────────────────────────────────────────

/// GET `/audio?text=&lang=` — MP3 da frase, ou 204 se a voz estiver indisponível.
pub async fn audio(State(state): State<AppState>, Query(q): Query<AudioQuery>) -> Response {
    let text = q.text.trim().to_string();
    if text.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    let lang = q.lang.unwrap_or_else(|| "ko".to_string());
    let speech = state.speech.clone();

    match tokio::task::spawn_blocking(move || speech.synthesize(&text, &lang)).await {
        Ok(Some(bytes)) => ([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Task de síntese de voz falhou");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// GET `/status` — `{ "classifier_ready": bool }`.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        classifier_ready: state.classifier.is_ready(),
    })
}

/// POST `/api/resolve` — só a resolução de intent, sem efeitos colaterais.
///
/// Texto em branco → 422.
pub async fn resolve(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<UtteranceResult>, StatusCode> {
    let utterance = Utterance::parse(&req.text).ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    let dispatcher = state.dispatcher.clone();
    tokio::task::spawn_blocking(move || dispatcher.resolve(&utterance))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(error = %e, "Task de resolução falhou");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;
    use crate::core::ContentLibrary;
    use crate::dispatcher::Dispatcher;
    use crate::nlu::{KeywordMatcher, LazyClassifier, SentimentScorer, Unavailable};
    use crate::persistence::{HistoryStore, SqliteStore};
    use crate::speech::{Silent, SpeechSynth};
    use crate::web::create_router;

    struct Beep;

    impl SpeechSynth for Beep {
        fn synthesize(&self, _text: &str, _lang: &str) -> Option<Vec<u8>> {
            Some(b"ID3beep".to_vec())
        }
    }

    fn app_with(speech: Arc<dyn SpeechSynth>) -> (Router, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new(
            Arc::new(Unavailable),
            KeywordMatcher::default(),
            SentimentScorer::default(),
            Arc::new(ContentLibrary::builtin()),
            store.clone(),
        );
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            store: store.clone(),
            speech,
            classifier: Arc::new(LazyClassifier::new()),
        };
        (create_router(state), store)
    }

    fn app() -> (Router, Arc<SqliteStore>) {
        app_with(Arc::new(Silent))
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn every_page_renders() {
        let (app, _) = app();
        for path in ["/", "/lessons", "/quizzes", "/wellness", "/motivation", "/chat", "/journal", "/progress"] {
            let resp = app.clone().oneshot(get(path)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{path}");
            let html = body_text(resp).await;
            assert!(html.contains("value=\"guest\""), "{path}");
        }
    }

    #[tokio::test]
    async fn lessons_link_to_audio() {
        let (app, _) = app();
        let html = body_text(app.oneshot(get("/lessons?user=mina")).await.unwrap()).await;
        assert!(html.contains("안녕하세요"));
        assert!(html.contains("/audio?text="));
        assert!(html.contains("🔊"));
    }

    #[tokio::test]
    async fn chat_shows_detected_intent() {
        let (app, _) = app();
        let resp = app
            .oneshot(form("/chat", "user=mina&message=hello%2C+give+me+a+quiz"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("Intent detected:"));
        assert!(html.contains("greeting"));
        assert!(html.contains("Annyeonghaseyo"));
    }

    #[tokio::test]
    async fn blank_chat_returns_empty_fragment() {
        let (app, _) = app();
        let resp = app.oneshot(form("/chat", "user=mina&message=+++")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.is_empty());
    }

    #[tokio::test]
    async fn chat_journal_intent_persists_entry() {
        let (app, store) = app();
        app.oneshot(form("/chat", "user=mina&message=dear+diary+today+was+long"))
            .await
            .unwrap();
        let entries = store.recent_journal_entries("mina", 5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "dear diary today was long");
    }

    #[tokio::test]
    async fn empty_quiz_pool_shows_warning() {
        let (app, _) = app();
        let resp = app
            .oneshot(form(
                "/quizzes/generate",
                "user=mina&level=Beginner&category=culture&num=5",
            ))
            .await
            .unwrap();
        assert!(body_text(resp).await.contains(templates::NO_QUESTIONS_WARNING));
    }

    #[tokio::test]
    async fn generated_quiz_is_clamped_to_pool() {
        let (app, _) = app();
        let resp = app
            .oneshot(form(
                "/quizzes/generate",
                "user=mina&level=Intermediate&category=Any&num=10",
            ))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert_eq!(html.matches("<fieldset").count(), 4);
        assert!(html.contains("name=\"category\" value=\"mixed\""));
    }

    #[tokio::test]
    async fn invalid_filter_is_a_warning() {
        let (app, _) = app();
        let resp = app
            .oneshot(form("/quizzes/generate", "level=Expert&category=Any"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Expert"));
    }

    #[tokio::test]
    async fn submitted_quiz_is_graded_and_saved() {
        let (app, store) = app();
        let content = ContentLibrary::builtin();
        let a = &content.quiz_bank[0];
        let b = &content.quiz_bank[1];
        let ids = format!("{},{}", a.id, b.id);
        let (key_a, key_b) = (format!("answer_{}", a.id), format!("answer_{}", b.id));
        let query = templates::href(
            "",
            &[
                ("user", "mina"),
                ("category", "vocab"),
                ("ids", ids.as_str()),
                (key_a.as_str(), a.answer),
                (key_b.as_str(), "nope"),
            ],
        );
        let body = query.trim_start_matches('?');
        let html = body_text(app.oneshot(form("/quizzes/submit", body)).await.unwrap()).await;
        assert!(html.contains("Score: 1/2 — 50%"));
        assert!(html.contains("Quiz result saved!"));

        let results = store.recent_quiz_results("mina", 5).unwrap();
        assert_eq!(results[0].category, "vocab");
        assert_eq!(results[0].percent, 50);
    }

    #[tokio::test]
    async fn mood_check_in_renders_branch_and_history() {
        let (app, store) = app();
        let resp = app
            .oneshot(form("/wellness", "user=mina&text=so+tired+and+stressed"))
            .await
            .unwrap();
        let html = body_text(resp).await;
        assert!(html.contains("feeling this way"));
        assert!(html.contains("Score: -2"));
        assert_eq!(store.recent_moods("mina", 5).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_journal_saves_nothing() {
        let (app, store) = app();
        let html = body_text(app.oneshot(form("/journal", "user=mina&text=+")).await.unwrap()).await;
        assert!(html.contains("Nothing was saved."));
        assert!(store.recent_journal_entries("mina", 5).unwrap().is_empty());
    }

    #[tokio::test]
    async fn motivation_kinds() {
        let (app, _) = app();
        let ok = app.clone().oneshot(get("/motivation/affirmation")).await.unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let missing = app.oneshot(get("/motivation/horoscope")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn audio_is_mp3_or_no_content() {
        let (silent, _) = app();
        let resp = silent.oneshot(get("/audio?text=%EB%84%A4&lang=ko")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let (beeping, _) = app_with(Arc::new(Beep));
        let resp = beeping.oneshot(get("/audio?text=%EB%84%A4")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(body_text(resp).await, "ID3beep");
    }

    #[tokio::test]
    async fn status_reports_classifier_readiness() {
        let (app, _) = app();
        let json = body_text(app.oneshot(get("/status")).await.unwrap()).await;
        assert_eq!(json, r#"{"classifier_ready":false}"#);
    }

    #[tokio::test]
    async fn api_resolve_returns_json() {
        let (app, _) = app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/resolve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"I feel so anxious and tired"}"#))
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&body_text(app.clone().oneshot(req).await.unwrap()).await).unwrap();
        assert_eq!(json["intent"], "wellness");
        assert_eq!(json["source"], "keyword");
        assert_eq!(json["raw_text"], "I feel so anxious and tired");

        let blank = Request::builder()
            .method("POST")
            .uri("/api/resolve")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"  "}"#))
            .unwrap();
        let resp = app.oneshot(blank).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn set_user_registers_and_redirects() {
        let (app, _) = app();
        let resp = app.oneshot(form("/user", "user=mina")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/?user=mina");
    }

    #[test]
    fn blank_user_defaults_to_guest() {
        assert_eq!(user_name(None), "guest");
        assert_eq!(user_name(Some("   ")), "guest");
        assert_eq!(user_name(Some(" mina ")), "mina");
    }
}
