#![allow(dead_code)]
#![allow(rustdoc::broken_intra_doc_links, rustdoc::invalid_html_tags)]
//! # AmyeouBot — Tutor de Coreano + Bem-Estar
//!
//! **Ponto de entrada** do tutor. Inicializa os componentes e sobe o
//! servidor web em duas fases:
//!
//! 1. **Fase imediata**: config, SQLite, conteúdo e dispatcher; o servidor
//!    (axum) já aceita conexões e o chat funciona só com keywords
//! 2. **Fase background**: o modelo de embeddings é carregado via
//!    `tokio::task::spawn_blocking` e publicado no [`LazyClassifier`]
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Carrega AppConfig (defaults → amyeou.toml → AMYEOU_*)
//!   ├── Configura tracing/logging
//!   ├── Abre SqliteStore (data/amyeou.db)
//!   ├── ContentLibrary::builtin()
//!   ├── Classificador: TimeBoxed(LazyClassifier) ou Unavailable
//!   ├── Voz: CachedSpeech(TranslateTts) ou Silent
//!   ├── Monta AppState e Router
//!   ├── Inicia servidor TCP
//!   └── Spawn background:
//!       ├── Embedder::load(model_repo)
//!       ├── EmbeddingZeroShot::new(embedder)
//!       └── LazyClassifier::publish()
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! cargo run
//! RUST_LOG=debug cargo run
//! AMYEOU_CLASSIFIER__ENABLED=false AMYEOU_SERVER__PORT=8080 cargo run
//! ```

/// Módulo `config` — configuração em camadas via figment.
mod config;

/// Módulo `core` — intents, utterances e o conteúdo estático do tutor.
mod core;

/// Módulo `dispatcher` — resolução de intent e seleção de resposta.
mod dispatcher;

/// Módulo `nlu` — keywords, sentimento e o classificador zero-shot.
mod nlu;

/// Módulo `persistence` — histórico de quizzes, humor e diário em SQLite.
mod persistence;

/// Módulo `speech` — síntese de voz opcional para as lições.
mod speech;

/// Módulo `web` — servidor axum, handlers e templates maud.
mod web;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core::ContentLibrary;
use crate::dispatcher::Dispatcher;
use crate::nlu::embedder::Embedder;
use crate::nlu::zero_shot::EmbeddingZeroShot;
use crate::nlu::{
    KeywordMatcher, LazyClassifier, SentimentScorer, TimeBoxed, Unavailable, ZeroShotClassifier,
};
use crate::persistence::{HistoryStore, SqliteStore};
use crate::speech::{CachedSpeech, Silent, SpeechSynth, TranslateTts};
use crate::web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    // RUST_LOG tem prioridade sobre log.filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .init();

    tracing::info!("🦊 AmyeouBot — Starting...");

    let store: Arc<dyn HistoryStore> = Arc::new(
        SqliteStore::open(&config.storage.database_path).with_context(|| {
            format!(
                "Failed to open database at {}",
                config.storage.database_path.display()
            )
        })?,
    );
    tracing::info!(path = %config.storage.database_path.display(), "Banco de histórico aberto");

    let content = Arc::new(ContentLibrary::builtin());

    let lazy = Arc::new(LazyClassifier::new());
    let classifier: Arc<dyn ZeroShotClassifier> = if config.classifier.enabled {
        Arc::new(TimeBoxed::new(lazy.clone(), config.classifier.timeout()))
    } else {
        tracing::info!("Classificador desligado, chat usa só keywords");
        Arc::new(Unavailable)
    };

    let speech = build_speech(&config).await;

    let dispatcher = Arc::new(Dispatcher::new(
        classifier,
        KeywordMatcher::default(),
        SentimentScorer::default(),
        content,
        store.clone(),
    ));

    let state = AppState {
        dispatcher,
        store,
        speech,
        classifier: lazy.clone(),
    };
    let app = web::create_router(state);

    // O servidor fica acessível antes do modelo terminar de carregar
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("🚀 Server running at http://{}", addr);

    if config.classifier.enabled {
        let repo = config.classifier.model_repo.clone();
        tokio::task::spawn_blocking(move || load_classifier(&repo, &lazy));
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Carrega o modelo e publica o classificador. Falha = chat segue por keywords.
fn load_classifier(repo: &str, lazy: &LazyClassifier) {
    tracing::info!(repo, "Loading zero-shot classifier (first run downloads the model)...");

    let embedder = match Embedder::load(repo) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to load embedder: {:#}", e);
            return;
        }
    };

    let zero_shot = match EmbeddingZeroShot::new(embedder) {
        Ok(z) => z,
        Err(e) => {
            tracing::error!("Failed to embed intent hypotheses: {:#}", e);
            return;
        }
    };

    if lazy.publish(Arc::new(zero_shot)) {
        tracing::info!("✅ Classifier ready!");
    }
}

/// Voz com cache, ou [`Silent`] se desligada ou se o client HTTP falhar.
async fn build_speech(config: &AppConfig) -> Arc<dyn SpeechSynth> {
    if !config.speech.enabled {
        tracing::info!("Síntese de voz desligada");
        return Arc::new(Silent);
    }
    let timeout = config.speech.timeout();
    let capacity = config.speech.cache_capacity;
    match tokio::task::spawn_blocking(move || TranslateTts::new(timeout)).await {
        Ok(Ok(tts)) => Arc::new(CachedSpeech::new(Arc::new(tts), capacity)),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "TTS indisponível, lições sem áudio");
            Arc::new(Silent)
        }
        Err(e) => {
            tracing::warn!(error = %e, "TTS indisponível, lições sem áudio");
            Arc::new(Silent)
        }
    }
}
