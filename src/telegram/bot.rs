// src/telegram/bot.rs

use serde::Deserialize;
use teloxide::{
    dispatching::UpdateHandler,
    prelude::*,
    types::{InputFile, User},
    utils::command::BotCommands,
};
use tracing::Instrument;
use url::Url;

use crate::{
    db,
    models::user::{Profile, TelegramIdentity},
    state::AppState,
    telegram::keyboard,
};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

const APOLOGY: &str = "Sorry, something went wrong. Please try again later.";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "start the quiz")]
    Start,
    #[command(description = "open the quiz")]
    Play,
    #[command(description = "show your score")]
    Score,
    #[command(description = "show the leaderboard")]
    Top,
    #[command(description = "show this message")]
    Help,
}

/// Payloads the Mini App sends with `Telegram.WebApp.sendData`.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WebAppPayload {
    Share { share_image_url: Url },
}

impl From<&User> for TelegramIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            language_code: user.language_code.clone(),
        }
    }
}

pub fn schema() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.web_app_data().is_some())
                .endpoint(handle_web_app_data),
        )
}

/// Registers the command list and menu button, then long-polls until Ctrl-C.
pub async fn run(bot: Bot, state: AppState) {
    tracing::info!("Starting telegram bot...");

    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("Failed to register bot commands: {}", err);
    }

    let menu = keyboard::menu_button(&state.config.webapp_url);
    if let Err(err) = bot.set_chat_menu_button().menu_button(menu).await {
        tracing::warn!("Failed to set chat menu button: {}", err);
    }

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("Telegram bot stopped.");
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, state: AppState) -> HandlerResult {
    let span = tracing::info_span!(
        "bot_command",
        chat_id = msg.chat.id.0,
        user_id = msg.from.as_ref().map(|u| u.id.0),
        command = ?cmd,
    );

    async {
        tracing::debug!("Processing command");
        if let Err(err) = run_command(&bot, &msg, cmd, &state).await {
            tracing::warn!("Command handler failed: {}", err);
            if let Err(err) = bot.send_message(msg.chat.id, APOLOGY).await {
                tracing::warn!("Failed to send the apology: {}", err);
            }
        }
        Ok::<(), HandlerError>(())
    }
    .instrument(span)
    .await
}

async fn run_command(bot: &Bot, msg: &Message, cmd: Command, state: &AppState) -> HandlerResult {
    let webapp_url = &state.config.webapp_url;

    match cmd {
        Command::Start => {
            let (first_name, identity) = match msg.from.as_ref() {
                Some(user) => (user.first_name.as_str(), Some(TelegramIdentity::from(user))),
                None => ("there", None),
            };
            if let Some(identity) = identity {
                db::users::upsert(&state.pool, &identity).await?;
            }
            bot.send_message(msg.chat.id, keyboard::greeting(first_name))
                .reply_markup(keyboard::play_inline_keyboard(webapp_url))
                .await?;
        }
        Command::Play => {
            bot.send_message(msg.chat.id, "Tap the button below to play.")
                .reply_markup(keyboard::play_reply_keyboard(webapp_url))
                .await?;
        }
        Command::Score => {
            let text = match msg.from.as_ref() {
                Some(user) => {
                    let user_id = user.id.0 as i64;
                    match db::users::profile(&state.pool, user_id).await? {
                        Some(row) => keyboard::format_score(&Profile::from_row(
                            row,
                            state.config.is_admin(user_id),
                        )),
                        None => "You haven't played yet. Send /start to begin!".to_string(),
                    }
                }
                None => "I can't tell who you are here.".to_string(),
            };
            bot.send_message(msg.chat.id, text).await?;
        }
        Command::Top => {
            let entries =
                db::users::leaderboard(&state.pool, crate::config::LEADERBOARD_DEFAULT_LIMIT)
                    .await?;
            bot.send_message(msg.chat.id, keyboard::format_leaderboard(&entries))
                .await?;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

async fn handle_web_app_data(bot: Bot, msg: Message, state: AppState) -> HandlerResult {
    let Some(data) = msg.web_app_data() else {
        return Ok(());
    };

    match parse_web_app_payload(&data.data, &state.config.webapp_url) {
        Some(WebAppPayload::Share { share_image_url }) => {
            tracing::info!(chat_id = msg.chat.id.0, "Posting share card");
            if let Err(err) = bot
                .send_photo(msg.chat.id, InputFile::url(share_image_url))
                .await
            {
                tracing::warn!("Failed to post the share card: {}", err);
                bot.send_message(msg.chat.id, APOLOGY).await?;
            }
        }
        None => {
            tracing::warn!(chat_id = msg.chat.id.0, payload = %data.data, "Ignoring unknown web app data");
        }
    }
    Ok(())
}

/// Parses a `sendData` payload. Share URLs must point into our own Mini App.
pub fn parse_web_app_payload(raw: &str, webapp_url: &Url) -> Option<WebAppPayload> {
    let payload: WebAppPayload = serde_json::from_str(raw).ok()?;
    match &payload {
        WebAppPayload::Share { share_image_url }
            if share_image_url.as_str().starts_with(webapp_url.as_str()) =>
        {
            Some(payload)
        }
        WebAppPayload::Share { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://quiz.example.com/app/").unwrap()
    }

    #[test]
    fn test_bot_constructs_from_config() {
        let config = crate::config::Config::from_lookup(|key| match key {
            "BOT_TOKEN" => Some("123456:abc".to_string()),
            "WEBAPP_URL" => Some("https://quiz.example.com/app".to_string()),
            "DATABASE_URL" => Some("postgres://localhost/quiz".to_string()),
            _ => None,
        })
        .unwrap();

        let bot = Bot::new(&config.bot_token);
        assert_eq!(bot.token(), "123456:abc");
        assert_eq!(keyboard::play_inline_keyboard(&config.webapp_url).inline_keyboard.len(), 1);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "quiz_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/top", "quiz_bot").unwrap(), Command::Top);
        assert!(Command::parse("/nope", "quiz_bot").is_err());
    }

    #[test]
    fn test_help_lists_commands() {
        let help = Command::descriptions().to_string();
        for cmd in ["/start", "/play", "/score", "/top", "/help"] {
            assert!(help.contains(cmd), "{cmd} missing from help");
        }
    }

    #[test]
    fn test_parse_share_payload() {
        let raw = r#"{"action":"share","share_image_url":"https://quiz.example.com/app/share/abc.png"}"#;
        assert!(matches!(
            parse_web_app_payload(raw, &base()),
            Some(WebAppPayload::Share { .. })
        ));
    }

    #[test]
    fn test_rejects_foreign_share_url() {
        let raw = r#"{"action":"share","share_image_url":"https://evil.example.com/x.png"}"#;
        assert_eq!(parse_web_app_payload(raw, &base()), None);
    }

    #[test]
    fn test_rejects_unknown_action() {
        assert_eq!(parse_web_app_payload(r#"{"action":"dance"}"#, &base()), None);
        assert_eq!(parse_web_app_payload("not json", &base()), None);
    }
}
