//! # Persistência — Histórico de Quizzes, Humor e Diário
//!
//! O [`HistoryStore`] é o gateway de persistência: o restante do sistema
//! só produz valores para gravar e lê listas recentes para exibição.
//!
//! ## Tabelas (SQLite)
//!
//! | Tabela | Colunas |
//! |--------|---------|
//! | `users` | `username` (único), `created_at` |
//! | `progress` | `username`, `quiz_category`, `score`, `created_at` |
//! | `mood_entries` | `username`, `mood_text`, `mood_score`, `created_at` |
//! | `journal` | `username`, `entry_text`, `created_at` |
//!
//! Leituras vêm **da mais recente para a mais antiga** (`ORDER BY id DESC`)
//! e limitadas. Timestamps são gravados em RFC 3339 UTC.
//!
//! ## Concorrência
//!
//! `rusqlite::Connection` não é `Sync`; o [`SqliteStore`] guarda a conexão
//! em um `parking_lot::Mutex`. Com um único usuário local a contenção é nula.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::Serialize;

/// Falhas do gateway de persistência.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("falha no SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("falha ao criar diretório do banco: {0}")]
    Io(#[from] std::io::Error),

    #[error("timestamp inválido no banco: {0}")]
    Timestamp(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Resultado de quiz gravado.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizResultRecord {
    pub category: String,
    pub percent: u32,
    pub created_at: DateTime<Utc>,
}

/// Entrada de humor gravada.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoodRecord {
    pub text: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

/// Entrada de diário gravada.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JournalRecord {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Gateway de histórico por usuário. Escritas são append-only.
pub trait HistoryStore: Send + Sync {
    /// Registra o usuário se ainda não existir.
    fn ensure_user(&self, user: &str, now: DateTime<Utc>) -> StoreResult<()>;

    fn record_quiz_result(
        &self,
        user: &str,
        category: &str,
        percent: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    fn record_mood(&self, user: &str, text: &str, score: i32, now: DateTime<Utc>)
        -> StoreResult<()>;

    fn record_journal_entry(&self, user: &str, text: &str, now: DateTime<Utc>) -> StoreResult<()>;

    fn recent_quiz_results(&self, user: &str, limit: usize) -> StoreResult<Vec<QuizResultRecord>>;

    fn recent_moods(&self, user: &str, limit: usize) -> StoreResult<Vec<MoodRecord>>;

    fn recent_journal_entries(&self, user: &str, limit: usize) -> StoreResult<Vec<JournalRecord>>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE,
    created_at TEXT
);
CREATE TABLE IF NOT EXISTS progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT,
    quiz_category TEXT,
    score INTEGER,
    created_at TEXT
);
CREATE TABLE IF NOT EXISTS mood_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT,
    mood_text TEXT,
    mood_score INTEGER,
    created_at TEXT
);
CREATE TABLE IF NOT EXISTS journal (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT,
    entry_text TEXT,
    created_at TEXT
);
";

/// Implementação SQLite do [`HistoryStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Abre (ou cria) o banco em `path`, criando o diretório pai se preciso.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Banco em memória, usado nos testes.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn parse_timestamp(raw: String) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::Timestamp(raw))
}

impl HistoryStore for SqliteStore {
    fn ensure_user(&self, user: &str, now: DateTime<Utc>) -> StoreResult<()> {
        let inserted = self.conn.lock().execute(
            "INSERT OR IGNORE INTO users (username, created_at) VALUES (?1, ?2)",
            params![user, now.to_rfc3339()],
        )?;
        if inserted > 0 {
            tracing::info!(user, "Novo usuário registrado");
        }
        Ok(())
    }

    fn record_quiz_result(
        &self,
        user: &str,
        category: &str,
        percent: u32,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT INTO progress (username, quiz_category, score, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user, category, percent, now.to_rfc3339()],
        )?;
        Ok(())
    }

    fn record_mood(
        &self,
        user: &str,
        text: &str,
        score: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT INTO mood_entries (username, mood_text, mood_score, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user, text, score, now.to_rfc3339()],
        )?;
        Ok(())
    }

    fn record_journal_entry(&self, user: &str, text: &str, now: DateTime<Utc>) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT INTO journal (username, entry_text, created_at) VALUES (?1, ?2, ?3)",
            params![user, text, now.to_rfc3339()],
        )?;
        Ok(())
    }

    fn recent_quiz_results(&self, user: &str, limit: usize) -> StoreResult<Vec<QuizResultRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT quiz_category, score, created_at FROM progress
             WHERE username = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let records: StoreResult<Vec<_>> = rows
            .map(|row| -> StoreResult<QuizResultRecord> {
                let (category, percent, created_at) = row?;
                Ok(QuizResultRecord {
                    category,
                    percent,
                    created_at: parse_timestamp(created_at)?,
                })
            })
            .collect();
        records
    }

    fn recent_moods(&self, user: &str, limit: usize) -> StoreResult<Vec<MoodRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT mood_text, mood_score, created_at FROM mood_entries
             WHERE username = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let records: StoreResult<Vec<_>> = rows
            .map(|row| -> StoreResult<MoodRecord> {
                let (text, score, created_at) = row?;
                Ok(MoodRecord {
                    text,
                    score,
                    created_at: parse_timestamp(created_at)?,
                })
            })
            .collect();
        records
    }

    fn recent_journal_entries(&self, user: &str, limit: usize) -> StoreResult<Vec<JournalRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT entry_text, created_at FROM journal
             WHERE username = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let records: StoreResult<Vec<_>> = rows
            .map(|row| -> StoreResult<JournalRecord> {
                let (text, created_at) = row?;
                Ok(JournalRecord {
                    text,
                    created_at: parse_timestamp(created_at)?,
                })
            })
            .collect();
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(minutes: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::minutes(minutes)
    }

    #[test]
    fn moods_are_listed_most_recent_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.record_mood("mina", "tired", -1, t(0)).unwrap();
        store.record_mood("mina", "happy", 1, t(1)).unwrap();
        store.record_mood("mina", "fine", 1, t(2)).unwrap();

        let moods = store.recent_moods("mina", 10).unwrap();
        let texts: Vec<_> = moods.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["fine", "happy", "tired"]);
        assert_eq!(moods[2].score, -1);
        assert_eq!(moods[0].created_at, t(2));
    }

    #[test]
    fn limit_is_applied() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..8 {
            store
                .record_journal_entry("mina", &format!("entry {i}"), t(i))
                .unwrap();
        }
        let entries = store.recent_journal_entries("mina", 5).unwrap();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].text, "entry 7");
        assert_eq!(entries[4].text, "entry 3");
    }

    #[test]
    fn histories_are_per_user() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.record_quiz_result("mina", "vocab", 80, t(0)).unwrap();
        store.record_quiz_result("joon", "mixed", 33, t(1)).unwrap();

        let mina = store.recent_quiz_results("mina", 5).unwrap();
        assert_eq!(mina.len(), 1);
        assert_eq!(mina[0].category, "vocab");
        assert_eq!(mina[0].percent, 80);
        assert!(store.recent_quiz_results("nobody", 5).unwrap().is_empty());
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_user("guest", t(0)).unwrap();
        store.ensure_user("guest", t(1)).unwrap();
        let count: i64 = store
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("amyeou.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.record_journal_entry("mina", "오늘은 좋았어요", t(0)).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let entries = store.recent_journal_entries("mina", 5).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "오늘은 좋았어요");
    }
}
