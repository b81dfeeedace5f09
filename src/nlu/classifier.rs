//! # Classificador Zero-Shot — A Camada Opcional
//!
//! O [`ZeroShotClassifier`] é uma **capacidade**: pode existir ou não em
//! runtime. O dispatcher recebe um `Arc<dyn ZeroShotClassifier>` na
//! inicialização e nunca verifica flags de disponibilidade por conta própria.
//!
//! ## Contrato
//!
//! ```text
//! classify(texto, candidatos) → Some(intent)   // top-1 entre os candidatos
//!                             → None           // indisponível / falhou
//! ```
//!
//! Nenhuma implementação pode propagar erro ou panic para quem chama.
//!
//! ## Implementações
//!
//! | Tipo | Papel |
//! |------|-------|
//! | [`Unavailable`] | Sempre `None`; sistema 100% funcional só com keywords |
//! | [`LazyClassifier`] | `None` até o modelo terminar de carregar em background |
//! | [`TimeBoxed`] | Timeout por chamada, no máximo uma inferência em curso; panic vira `None` |
//! | [`EmbeddingZeroShot`](super::zero_shot::EmbeddingZeroShot) | Modelo real (candle) |

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use crate::core::Intent;

/// Classificador de texto contra um conjunto fechado de labels.
pub trait ZeroShotClassifier: Send + Sync {
    /// Label melhor ranqueado entre `candidates`, ou `None` se indisponível.
    fn classify(&self, text: &str, candidates: &[Intent]) -> Option<Intent>;

    /// Nome curto para logs.
    fn name(&self) -> &'static str;
}

/// Classificador permanentemente indisponível.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unavailable;

impl ZeroShotClassifier for Unavailable {
    fn classify(&self, _text: &str, _candidates: &[Intent]) -> Option<Intent> {
        None
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Classificador publicado depois da inicialização.
///
/// O servidor sobe imediatamente; o modelo carrega em `spawn_blocking` e é
/// publicado via [`LazyClassifier::publish()`]. Até lá, toda chamada
/// devolve `None` e o dispatcher usa keywords.
#[derive(Default)]
pub struct LazyClassifier {
    inner: OnceLock<Arc<dyn ZeroShotClassifier>>,
}

impl LazyClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publica o classificador carregado. Retorna `false` se já havia um.
    pub fn publish(&self, classifier: Arc<dyn ZeroShotClassifier>) -> bool {
        self.inner.set(classifier).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.get().is_some()
    }
}

impl ZeroShotClassifier for LazyClassifier {
    fn classify(&self, text: &str, candidates: &[Intent]) -> Option<Intent> {
        self.inner.get()?.classify(text, candidates)
    }

    fn name(&self) -> &'static str {
        self.inner.get().map_or("pending", |c| c.name())
    }
}

/// Executa o classificador interno em uma thread worker com prazo.
///
/// - Estourou o prazo → `None`; o worker termina sozinho e o resultado é descartado
/// - Panic no worker → canal fecha → `None`
/// - Worker anterior ainda rodando → `None` imediato, sem nova inferência
///
/// ```text
/// classify() ──busy?──sim──→ None (keywords)
///      │ não
///      └─ spawn worker ── inner.classify() ── libera busy ── send
///            recv_timeout(prazo) → Some / None
/// ```
pub struct TimeBoxed<C: ?Sized> {
    inner: Arc<C>,
    timeout: Duration,
    busy: Arc<AtomicBool>,
}

impl<C: ZeroShotClassifier + ?Sized + 'static> TimeBoxed<C> {
    pub fn new(inner: Arc<C>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Libera o flag `busy` ao sair do worker, inclusive em panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: ZeroShotClassifier + ?Sized + 'static> ZeroShotClassifier for TimeBoxed<C> {
    fn classify(&self, text: &str, candidates: &[Intent]) -> Option<Intent> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(
                classifier = self.inner.name(),
                "Inferência anterior ainda em curso, usando keywords"
            );
            return None;
        }
        let in_flight = InFlight(Arc::clone(&self.busy));

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        let candidates = candidates.to_vec();

        // Se o spawn falhar, a closure (e o InFlight) é descartada
        let spawned = thread::Builder::new()
            .name("zero-shot".into())
            .spawn(move || {
                let result = inner.classify(&text, &candidates);
                drop(in_flight);
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            tracing::warn!(error = %e, "Falha ao criar worker do classificador");
            return None;
        }

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    classifier = self.inner.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classificador excedeu o prazo, usando keywords"
                );
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!(classifier = self.inner.name(), "Worker do classificador abortou");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Sempre responde o mesmo intent, se ele estiver entre os candidatos.
    pub(crate) struct Fixed(pub Intent);

    impl ZeroShotClassifier for Fixed {
        fn classify(&self, _text: &str, candidates: &[Intent]) -> Option<Intent> {
            candidates.contains(&self.0).then_some(self.0)
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Sleepy(Duration);

    impl ZeroShotClassifier for Sleepy {
        fn classify(&self, _text: &str, _candidates: &[Intent]) -> Option<Intent> {
            thread::sleep(self.0);
            Some(Intent::Quiz)
        }

        fn name(&self) -> &'static str {
            "sleepy"
        }
    }

    /// Conta inferências iniciadas e o pico de inferências simultâneas.
    #[derive(Default)]
    struct Tracked {
        started: AtomicUsize,
        live: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ZeroShotClassifier for Tracked {
        fn classify(&self, _text: &str, _candidates: &[Intent]) -> Option<Intent> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(400));
            self.live.fetch_sub(1, Ordering::SeqCst);
            Some(Intent::Quiz)
        }

        fn name(&self) -> &'static str {
            "tracked"
        }
    }

    struct Exploding;

    impl ZeroShotClassifier for Exploding {
        fn classify(&self, _text: &str, _candidates: &[Intent]) -> Option<Intent> {
            panic!("model blew up");
        }

        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[test]
    fn unavailable_is_always_none() {
        assert_eq!(Unavailable.classify("hello", &Intent::ALL), None);
    }

    #[test]
    fn fixed_respects_candidates() {
        let c = Fixed(Intent::Inspiration);
        assert_eq!(c.classify("x", &Intent::ALL), Some(Intent::Inspiration));
        assert_eq!(c.classify("x", &[Intent::Quiz]), None);
    }

    #[test]
    fn lazy_is_unavailable_until_published() {
        let lazy = LazyClassifier::new();
        assert!(!lazy.is_ready());
        assert_eq!(lazy.classify("hi", &Intent::ALL), None);
        assert_eq!(lazy.name(), "pending");

        assert!(lazy.publish(Arc::new(Fixed(Intent::Unknown))));
        assert!(lazy.is_ready());
        assert_eq!(lazy.classify("hi", &Intent::ALL), Some(Intent::Unknown));
        assert!(!lazy.publish(Arc::new(Unavailable)));
    }

    #[test]
    fn time_boxed_passes_fast_results_through() {
        let boxed = TimeBoxed::new(Arc::new(Fixed(Intent::Journal)), Duration::from_secs(5));
        assert_eq!(boxed.classify("dear diary", &Intent::ALL), Some(Intent::Journal));
    }

    #[test]
    fn time_boxed_gives_up_after_timeout() {
        let boxed = TimeBoxed::new(
            Arc::new(Sleepy(Duration::from_millis(500))),
            Duration::from_millis(20),
        );
        assert_eq!(boxed.classify("slow", &Intent::ALL), None);
    }

    #[test]
    fn time_boxed_swallows_panics() {
        let boxed = TimeBoxed::new(Arc::new(Exploding), Duration::from_secs(5));
        assert_eq!(boxed.classify("boom", &Intent::ALL), None);
    }

    #[test]
    fn time_boxed_works_over_trait_objects() {
        let inner: Arc<dyn ZeroShotClassifier> = Arc::new(Fixed(Intent::Greeting));
        let boxed = TimeBoxed::new(inner, Duration::from_secs(5));
        assert_eq!(boxed.classify("hey", &Intent::ALL), Some(Intent::Greeting));
    }

    #[test]
    fn time_boxed_keeps_one_inference_in_flight() {
        let tracked = Arc::new(Tracked::default());
        let boxed = TimeBoxed::new(tracked.clone(), Duration::from_millis(20));

        for _ in 0..10 {
            assert_eq!(boxed.classify("slow", &Intent::ALL), None);
        }
        assert_eq!(tracked.started.load(Ordering::SeqCst), 1);
        assert_eq!(tracked.peak.load(Ordering::SeqCst), 1);

        // worker terminou: a próxima chamada volta a inferir
        thread::sleep(Duration::from_millis(700));
        assert_eq!(tracked.live.load(Ordering::SeqCst), 0);
        assert_eq!(boxed.classify("slow", &Intent::ALL), None);
        assert_eq!(tracked.started.load(Ordering::SeqCst), 2);
        assert_eq!(tracked.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn time_boxed_recovers_after_a_panic() {
        let boxed = TimeBoxed::new(Arc::new(Exploding), Duration::from_secs(5));
        assert_eq!(boxed.classify("boom", &Intent::ALL), None);
        // o canal pode fechar antes do InFlight ser descartado no unwind
        thread::sleep(Duration::from_millis(100));
        assert!(!boxed.busy.load(Ordering::Acquire));
    }
}
