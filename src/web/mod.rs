//! # Módulo Web — A Interface do Tutor
//!
//! Camada web construída com **Axum** + **HTMX** + **Maud**.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Browser (HTMX)                                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Axum Router (este módulo)                                   │
//! │  ├── GET  /, /lessons, /quizzes, /wellness, /motivation,    │
//! │  │        /chat, /journal, /progress  → páginas (?user=)    │
//! │  ├── POST /user                  → registra + redirect      │
//! │  ├── POST /quizzes/generate      → HTMX fragment            │
//! │  ├── POST /quizzes/submit        → HTMX fragment            │
//! │  ├── POST /wellness              → HTMX fragment            │
//! │  ├── GET  /motivation/{kind}     → HTMX fragment            │
//! │  ├── POST /chat                  → HTMX fragment            │
//! │  ├── POST /journal               → HTMX fragment            │
//! │  ├── GET  /audio?text=&lang=     → audio/mpeg ou 204        │
//! │  ├── GET  /status                → JSON                     │
//! │  └── POST /api/resolve           → JSON (UtteranceResult)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Static Assets (tower_http::ServeDir → /assets/)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod state;
pub mod templates;

use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // ── Páginas HTML ──────────────────────────────────────
        .route("/", get(handlers::home))
        .route("/lessons", get(handlers::lessons))
        .route("/quizzes", get(handlers::quizzes))
        .route("/wellness", get(handlers::wellness).post(handlers::mood_check_in))
        .route("/motivation", get(handlers::motivation))
        .route("/chat", get(handlers::chat_page).post(handlers::chat))
        .route("/journal", get(handlers::journal).post(handlers::save_journal))
        .route("/progress", get(handlers::progress))
        .route("/user", post(handlers::set_user))
        // ── HTMX fragments ───────────────────────────────────
        .route("/quizzes/generate", post(handlers::generate_quiz))
        .route("/quizzes/submit", post(handlers::submit_quiz))
        .route("/motivation/{kind}", get(handlers::motivation_pick))
        // ── Áudio e API JSON ──────────────────────────────────
        .route("/audio", get(handlers::audio))
        .route("/status", get(handlers::status))
        .route("/api/resolve", post(handlers::resolve))
        // ── Arquivos estáticos ────────────────────────────────
        .nest_service("/assets", ServeDir::new("assets"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
