//! # Estado da Aplicação Web
//!
//! ## Inicialização em Duas Fases
//!
//! ```text
//! Fase 1 (imediata):            Fase 2 (background):
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │ AppState             │      │ EmbeddingZeroShot    │
//! │  ├── dispatcher ✓    │      │  (candle + hf-hub)   │
//! │  ├── store ✓         │      └──────────┬───────────┘
//! │  ├── speech ✓        │                 │ publish()
//! │  └── classifier: ∅ ←─┼─────────────────┘
//! └──────────────────────┘
//!     ↓ servidor no ar, chat por keywords   ↓ classificador pronto
//! ```
//!
//! O dispatcher recebe o mesmo [`LazyClassifier`] (embrulhado em
//! `TimeBoxed`) na fase 1; quando o modelo é publicado, as chamadas
//! seguintes passam a usá-lo sem trocar nada no estado.

use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::nlu::LazyClassifier;
use crate::persistence::HistoryStore;
use crate::speech::SpeechSynth;

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Leitura de histórico para as páginas.
    pub store: Arc<dyn HistoryStore>,
    pub speech: Arc<dyn SpeechSynth>,
    /// Só para `/status`; a classificação passa pelo dispatcher.
    pub classifier: Arc<LazyClassifier>,
}
