//! # Templates Maud — Páginas e Fragmentos
//!
//! Cada página do tutor é um [`layout()`] com a nav lateral (usuário +
//! páginas) e um corpo próprio. As interações (chat, check-in, diário,
//! quiz, motivação) usam **HTMX**: o formulário posta e o servidor
//! devolve só o fragmento que muda.
//!
//! ```text
//! ┌──────────── sidebar ─────────────┬─────────── main ────────────┐
//! │ 🦊 AmyeouBot                     │ <h1> da página               │
//! │ [nome______] [Set User]          │                              │
//! │ Home · Lessons · Quizzes · ...   │ corpo / #painel htmx         │
//! └──────────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! O nome do usuário viaja em `?user=` nos links e em campos `hidden`
//! nos formulários; não há sessão no servidor.

use maud::{html, Markup, PreEscaped, DOCTYPE};
use reqwest::Url;

use crate::core::content::{QUIZ_LEN_DEFAULT, QUIZ_LEN_MAX, QUIZ_LEN_MIN};
use crate::core::{Category, ContentLibrary, Level, QuizItem, UtteranceResult};
use crate::dispatcher::{MoodOutcome, QuizScore, Reply};
use crate::persistence::{JournalRecord, MoodRecord, QuizResultRecord};

pub const NO_QUESTIONS_WARNING: &str = "No questions available for this selection.";

/// Páginas da navegação, na ordem do menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Home,
    Lessons,
    Quizzes,
    Wellness,
    Motivation,
    Chat,
    Journal,
    Progress,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Home,
        Page::Lessons,
        Page::Quizzes,
        Page::Wellness,
        Page::Motivation,
        Page::Chat,
        Page::Journal,
        Page::Progress,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Lessons => "/lessons",
            Page::Quizzes => "/quizzes",
            Page::Wellness => "/wellness",
            Page::Motivation => "/motivation",
            Page::Chat => "/chat",
            Page::Journal => "/journal",
            Page::Progress => "/progress",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Lessons => "Lessons",
            Page::Quizzes => "Quizzes",
            Page::Wellness => "Wellness",
            Page::Motivation => "Motivation",
            Page::Chat => "Chat",
            Page::Journal => "Journal",
            Page::Progress => "Progress",
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Page::Home => "🦊 AmyeouBot — Korean Learning + Wellness",
            Page::Lessons => "🇰🇷 Lessons",
            Page::Quizzes => "📝 Korean Quizzes",
            Page::Wellness => "💙 Wellness & Mental Health",
            Page::Motivation => "✨ Motivation & Inspiration",
            Page::Chat => "💬 Chat with AmyeouBot",
            Page::Journal => "📓 Journal / Reflection",
            Page::Progress => "📊 Progress & History",
        }
    }
}

/// Caminho relativo com query string codificada.
pub fn href(path: &str, params: &[(&str, &str)]) -> String {
    match Url::parse_with_params("http://localhost/", params) {
        Ok(url) => match url.query() {
            Some(q) if !q.is_empty() => format!("{path}?{q}"),
            _ => path.to_string(),
        },
        Err(_) => path.to_string(),
    }
}

fn user_href(page: Page, user: &str) -> String {
    href(page.path(), &[("user", user)])
}

fn timestamp(t: &chrono::DateTime<chrono::Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn user_field(user: &str) -> Markup {
    html! { input type="hidden" name="user" value=(user); }
}

/// Esqueleto comum a todas as páginas.
pub fn layout(page: Page, user: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "AmyeouBot — " (page.title()) }
                link rel="stylesheet" href="/assets/style.css";
                script src="https://unpkg.com/htmx.org@2.0.4" {}
            }
            body {
                div class="app-shell" {
                    aside class="sidebar" {
                        div class="brand" { "🦊 AmyeouBot" }
                        form class="user-form" method="post" action="/user" {
                            label for="user-name" { "Enter your name (or nickname):" }
                            input #user-name type="text" name="user" value=(user) autocomplete="off";
                            button type="submit" { "Set User" }
                        }
                        nav class="nav-links" {
                            @for p in Page::ALL {
                                a href=(user_href(p, user))
                                    class=(if p == page { "nav-link active" } else { "nav-link" }) {
                                    (p.title())
                                }
                            }
                        }
                        div class="nav-status" {
                            span class="nav-status-dot loading" id="status-dot" {}
                            span id="status-text" { "keyword mode" }
                        }
                    }
                    main class="content" {
                        h1 { (page.heading()) }
                        (body)
                    }
                }
                (PreEscaped(r#"<script>
(function() {
  function poll() {
    fetch('/status')
      .then(function(r) { return r.json(); })
      .then(function(data) {
        if (data.classifier_ready) {
          document.getElementById('status-dot').classList.remove('loading');
          document.getElementById('status-text').textContent = 'classifier ready';
        } else {
          setTimeout(poll, 5000);
        }
      })
      .catch(function() { setTimeout(poll, 10000); });
  }
  poll();
})();
</script>"#))
            }
        }
    }
}

pub fn home_page(user: &str) -> Markup {
    layout(
        Page::Home,
        user,
        html! {
            p { "안녕하세요! AmyeouBot helps you learn Korean and supports your wellbeing." }
            h2 { "Welcome!" }
            p { "Explore lessons, quizzes, wellness, and chat in the sidebar." }
        },
    )
}

pub fn lessons_page(user: &str, content: &ContentLibrary) -> Markup {
    layout(
        Page::Lessons,
        user,
        html! {
            @for lesson in &content.lessons {
                section class="lesson" {
                    h2 { (lesson.level.label()) " — " (lesson.title) }
                    ul class="phrases" {
                        @for p in &lesson.phrases {
                            li {
                                strong { (p.ko) } " — " (p.roman) " — " (p.en)
                                " "
                                a class="audio-link" href=(href("/audio", &[("text", p.ko), ("lang", "ko")]))
                                    target="_blank" title="Listen" { "🔊" }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn quizzes_page(user: &str) -> Markup {
    layout(
        Page::Quizzes,
        user,
        html! {
            form class="quiz-options" hx-post="/quizzes/generate" hx-target="#quiz-panel" hx-swap="innerHTML" {
                (user_field(user))
                label { "Level "
                    select name="level" {
                        @for level in Level::ALL {
                            option value=(level.label()) { (level.label()) }
                        }
                        option value="All" { "All" }
                    }
                }
                label { "Category "
                    select name="category" {
                        option value="Any" { "Any" }
                        @for category in Category::ALL {
                            option value=(category.label()) { (category.label()) }
                        }
                    }
                }
                label { "Number of questions "
                    input type="number" name="num" min=(QUIZ_LEN_MIN) max=(QUIZ_LEN_MAX)
                        value=(QUIZ_LEN_DEFAULT);
                }
                button type="submit" { "Generate Quiz" }
            }
            div #quiz-panel {}
        },
    )
}

/// Formulário do quiz gerado, ou o aviso de pool vazio.
pub fn quiz_form(user: &str, category_label: &str, questions: &[&QuizItem]) -> Markup {
    if questions.is_empty() {
        return warning(NO_QUESTIONS_WARNING);
    }
    let ids = questions
        .iter()
        .map(|q| q.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    html! {
        form class="quiz-form" hx-post="/quizzes/submit" hx-target="#quiz-panel" hx-swap="innerHTML" {
            (user_field(user))
            input type="hidden" name="category" value=(category_label);
            input type="hidden" name="ids" value=(ids);
            @for (i, q) in questions.iter().enumerate() {
                fieldset class="question" {
                    legend { "Q" (i + 1) ". " (q.question) }
                    @for option in &q.options {
                        label class="option" {
                            input type="radio" name=(format!("answer_{}", q.id)) value=(option);
                            (option)
                        }
                    }
                }
            }
            button type="submit" { "Submit Quiz" }
        }
    }
}

pub fn quiz_result(score: &QuizScore, saved: bool) -> Markup {
    html! {
        div class="quiz-result" {
            p { "Score: " (score.correct) "/" (score.total) " — " (score.percent) "%" }
            @if saved {
                div class="notice success" { "Quiz result saved!" }
            } @else {
                div class="notice error" { "Sorry, the quiz result could not be saved." }
            }
        }
    }
}

pub fn wellness_page(user: &str, moods: &[MoodRecord]) -> Markup {
    layout(
        Page::Wellness,
        user,
        html! {
            form hx-post="/wellness" hx-target="#wellness-panel" hx-swap="innerHTML" {
                (user_field(user))
                label for="mood" { "How are you feeling right now?" }
                textarea #mood name="text" rows="3" {}
                button type="submit" { "Submit Mood" }
            }
            div #wellness-panel { (mood_panel(None, moods)) }
        },
    )
}

/// Resposta do check-in (se houver) + histórico recente.
pub fn mood_panel(outcome: Option<&MoodOutcome>, moods: &[MoodRecord]) -> Markup {
    html! {
        @if let Some(o) = outcome {
            div class=(format!("notice {}", mood_class(o.score))) { (o.message) }
            @if let Some(coping) = o.coping {
                p class="coping" { (coping) }
            }
            @if !o.saved {
                div class="notice error" { "Sorry, your mood entry could not be saved." }
            }
        }
        h2 { "Mood history" }
        ul class="history" {
            @for m in moods {
                li { "[" (timestamp(&m.created_at)) "] Score: " (m.score) " — " (m.text) }
            }
        }
    }
}

fn mood_class(score: i32) -> &'static str {
    match score {
        s if s < 0 => "error",
        0 => "info",
        _ => "success",
    }
}

pub fn motivation_page(user: &str) -> Markup {
    layout(
        Page::Motivation,
        user,
        html! {
            div class="button-row" {
                button hx-get="/motivation/quote" hx-target="#motivation-line" { "Get Motivation" }
                button hx-get="/motivation/affirmation" hx-target="#motivation-line" { "Get Affirmation" }
                button hx-get="/motivation/inspiration" hx-target="#motivation-line" { "Inspiration Prompt" }
            }
            div #motivation-line class="quote" {}
        },
    )
}

pub fn motivation_line(text: &str) -> Markup {
    html! { p { (text) } }
}

pub fn chat_page(user: &str) -> Markup {
    layout(
        Page::Chat,
        user,
        html! {
            div #chat-messages class="chat-messages" {}
            form #chat-form hx-post="/chat" hx-target="#chat-messages" hx-swap="beforeend" {
                (user_field(user))
                input type="text" name="message" placeholder="You:" autocomplete="off" autofocus;
                button type="submit" { "Send" }
            }
            (PreEscaped(r#"<script>
document.body.addEventListener('htmx:afterRequest', function(e) {
  if (e.detail.elt && e.detail.elt.id === 'chat-form') e.detail.elt.reset();
  var msgs = document.getElementById('chat-messages');
  if (msgs) msgs.scrollTop = msgs.scrollHeight;
});
</script>"#))
        },
    )
}

/// Mensagem do usuário + intent detectado + linhas da resposta.
pub fn chat_exchange(resolved: &UtteranceResult, reply: &Reply) -> Markup {
    html! {
        div class="message user-message" {
            div class="message-role" { "You" }
            div class="message-content" { (resolved.raw_text) }
        }
        div class="message bot-message" {
            div class="message-role" { "AmyeouBot" }
            div class="message-intent" {
                strong { "Intent detected:" } " " (resolved.intent.label())
            }
            @for line in &reply.lines {
                div class="message-content" { (line) }
            }
        }
    }
}

pub fn journal_page(user: &str, entries: &[JournalRecord]) -> Markup {
    layout(
        Page::Journal,
        user,
        html! {
            form hx-post="/journal" hx-target="#journal-panel" hx-swap="innerHTML" {
                (user_field(user))
                label for="entry" { "Write a short reflection (private):" }
                textarea #entry name="text" rows="4" {}
                button type="submit" { "Save Entry" }
            }
            div #journal-panel { (journal_panel(None, entries)) }
        },
    )
}

/// `saved`: `None` sem tentativa de gravação, `Some(ok)` depois de uma.
pub fn journal_panel(saved: Option<bool>, entries: &[JournalRecord]) -> Markup {
    html! {
        @match saved {
            Some(true) => div class="notice success" { "Reflection saved." },
            Some(false) => div class="notice error" { "Nothing was saved." },
            None => {},
        }
        h2 { "Recent entries" }
        ul class="history" {
            @for e in entries {
                li { "[" (timestamp(&e.created_at)) "] " (e.text) }
            }
        }
    }
}

pub fn progress_page(user: &str, results: &[QuizResultRecord]) -> Markup {
    layout(
        Page::Progress,
        user,
        html! {
            h2 { "Quiz results" }
            ul class="history" {
                @for r in results {
                    li { "[" (timestamp(&r.created_at)) "] " (r.category) " — " (r.percent) "%" }
                }
            }
        },
    )
}

pub fn warning(text: &str) -> Markup {
    html! { div class="notice warning" { (text) } }
}
