// src/telegram/keyboard.rs

//! Reply markup and message text for the bot. Pure functions, no network.

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    MenuButton, WebAppInfo,
};
use url::Url;

use crate::models::user::{LeaderboardEntry, Profile};

pub const PLAY_BUTTON_TEXT: &str = "Play";

/// Inline button that opens the Mini App.
pub fn play_inline_keyboard(webapp_url: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        PLAY_BUTTON_TEXT,
        WebAppInfo {
            url: webapp_url.clone(),
        },
    )]])
}

/// Reply-keyboard button that opens the Mini App.
///
/// Only Mini Apps launched from a reply keyboard may call `sendData`, so this is the
/// one `/play` offers: it lets the app post share cards back into the chat.
pub fn play_reply_keyboard(webapp_url: &Url) -> KeyboardMarkup {
    KeyboardMarkup::new([[KeyboardButton::new(PLAY_BUTTON_TEXT).request(ButtonRequest::WebApp(
        WebAppInfo {
            url: webapp_url.clone(),
        },
    ))]])
}

/// The chat menu button, set once at startup.
pub fn menu_button(webapp_url: &Url) -> MenuButton {
    MenuButton::WebApp {
        text: PLAY_BUTTON_TEXT.to_string(),
        web_app: WebAppInfo {
            url: webapp_url.clone(),
        },
    }
}

pub fn greeting(first_name: &str) -> String {
    format!(
        "Hi, {first_name}! Ready for a quiz?\n\
         Tap \"{PLAY_BUTTON_TEXT}\" to open it, /score to see your progress and /top for the leaderboard.\n\
         Open it through /play to post your result card into this chat."
    )
}

pub fn format_score(profile: &Profile) -> String {
    if profile.total_questions == 0 {
        return "There are no questions yet. Check back later!".to_string();
    }

    let status = if profile.finished {
        "You've answered every question.".to_string()
    } else {
        format!(
            "{} of {} questions answered.",
            profile.answered_count, profile.total_questions
        )
    };

    format!(
        "Score: {}\nCorrect: {}/{}\n{status}",
        profile.score, profile.correct_count, profile.answered_count
    )
}

pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "Nobody has scored yet. Be the first!".to_string();
    }

    let mut text = String::from("Top players:\n");
    for entry in entries {
        text.push_str(&format!("{}. {} - {}\n", entry.rank, entry.display_name, entry.score));
    }
    text.truncate(text.trim_end().len());
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn url() -> Url {
        Url::parse("https://quiz.example.com/").unwrap()
    }

    fn profile(answered: i64, correct: i64, total: i64, finished: bool) -> Profile {
        Profile {
            user_id: 1,
            username: None,
            first_name: "Ann".to_string(),
            score: correct * 10,
            answered_count: answered,
            correct_count: correct,
            total_questions: total,
            current_question_id: if finished { None } else { Some(answered + 1) },
            finished,
            is_admin: false,
        }
    }

    #[test]
    fn test_greeting_points_to_play_for_sharing() {
        let text = greeting("Ann");
        assert!(text.starts_with("Hi, Ann!"));
        assert!(text.contains("/play"));
    }

    #[test]
    fn test_inline_keyboard_opens_webapp() {
        let markup = play_inline_keyboard(&url());
        let button = &markup.inline_keyboard[0][0];
        assert_eq!(button.text, PLAY_BUTTON_TEXT);
        match &button.kind {
            InlineKeyboardButtonKind::WebApp(info) => assert_eq!(info.url, url()),
            other => panic!("unexpected button kind: {other:?}"),
        }
    }

    #[test]
    fn test_reply_keyboard_opens_webapp() {
        let markup = play_reply_keyboard(&url());
        let button = &markup.keyboard[0][0];
        assert_eq!(button.text, PLAY_BUTTON_TEXT);
        assert!(matches!(&button.request, Some(ButtonRequest::WebApp(info)) if info.url == url()));
    }

    #[test]
    fn test_format_score_in_progress() {
        let text = format_score(&profile(2, 1, 5, false));
        assert_eq!(text, "Score: 10\nCorrect: 1/2\n2 of 5 questions answered.");
    }

    #[test]
    fn test_format_score_finished() {
        let text = format_score(&profile(5, 5, 5, true));
        assert!(text.ends_with("You've answered every question."));
    }

    #[test]
    fn test_format_score_without_questions() {
        assert!(format_score(&profile(0, 0, 0, false)).contains("no questions"));
    }

    #[test]
    fn test_format_leaderboard() {
        let entries = vec![
            LeaderboardEntry {
                rank: 1,
                user_id: 1,
                display_name: "ann".to_string(),
                score: 30,
            },
            LeaderboardEntry {
                rank: 2,
                user_id: 2,
                display_name: "bob".to_string(),
                score: 20,
            },
        ];
        assert_eq!(format_leaderboard(&entries), "Top players:\n1. ann - 30\n2. bob - 20");
        assert!(format_leaderboard(&[]).starts_with("Nobody"));
    }
}
