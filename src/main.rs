mod community;
mod config;
mod quiz;
mod render;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use community::store::JsonGroupStore;
use community::{analysis, GroupKey};
use config::Config;
use quiz::catalog::Catalogs;
use quiz::session::{Command, QuizSession, Transition};
use quiz::type_code::TypeCode;
use quiz::QuizError;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Session {
        session: QuizSession,
        viewing: Option<TypeCode>,
    },
    BrowseTypes {
        session: QuizSession,
        viewing: Option<TypeCode>,
    },
    ReceiveGroupDetails {
        session: QuizSession,
        viewing: Option<TypeCode>,
        action: GroupAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GroupAction {
    Save,
    List,
    Analyze,
    Remove,
}

type GroupStorage = Arc<JsonGroupStore>;
type UserInfoStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    let config = Config::from_env();
    log::info!("Starting faith type bot...");

    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.dialogue_db);
    let storage: UserInfoStorage = SqliteStorage::open(&config.dialogue_db, Json)
        .await
        .expect("Failed to open the dialogue database")
        .erase();

    let groups: GroupStorage = Arc::new(
        JsonGroupStore::open(&config.groups_path)
            .await
            .expect("Failed to open the group store"),
    );
    log::info!("Group store ready at {}", config.groups_path.display());

    // Catalogs load in the background; until they land, starting a test answers "not ready"
    let catalogs = Arc::new(Catalogs::new());
    {
        let catalogs = catalogs.clone();
        let (questions_path, types_path) = (config.questions_path.clone(), config.types_path.clone());
        tokio::spawn(async move {
            match catalogs.load(&questions_path, &types_path).await {
                Ok(()) => log::info!(
                    "Catalogs loaded: {} questions",
                    catalogs.questions().map(|q| q.len()).unwrap_or(0)
                ),
                Err(err) => log::error!("Failed to load catalogs: {err}"),
            }
        });
    }

    let session_catalogs = catalogs.clone();
    let browse_catalogs = catalogs.clone();
    let group_catalogs = catalogs.clone();
    let group_store = groups.clone();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(
                dptree::case![State::Session { session, viewing }].endpoint(
                    move |bot: Bot,
                          dialogue: QuizDialogue,
                          (session, viewing): (QuizSession, Option<TypeCode>),
                          msg: Message| {
                        handle_session(
                            session_catalogs.clone(),
                            bot,
                            dialogue,
                            (session, viewing),
                            msg,
                        )
                    },
                ),
            )
            .branch(
                dptree::case![State::BrowseTypes { session, viewing }].endpoint(
                    move |bot: Bot,
                          dialogue: QuizDialogue,
                          (session, viewing): (QuizSession, Option<TypeCode>),
                          msg: Message| {
                        receive_type_choice(
                            browse_catalogs.clone(),
                            bot,
                            dialogue,
                            (session, viewing),
                            msg,
                        )
                    },
                ),
            )
            .branch(
                dptree::case![State::ReceiveGroupDetails {
                    session,
                    viewing,
                    action
                }]
                .endpoint(
                    move |bot: Bot,
                          dialogue: QuizDialogue,
                          (session, viewing, action): (QuizSession, Option<TypeCode>, GroupAction),
                          msg: Message| {
                        receive_group_details(
                            group_catalogs.clone(),
                            group_store.clone(),
                            bot,
                            dialogue,
                            (session, viewing, action),
                            msg,
                        )
                    },
                ),
            ),
    )
    .dependencies(dptree::deps![storage])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "Hello! This is the faith type test. Rate each statement from 1 (not at all like me) to 5 (exactly like me), and at the end you will see your faith type, who walks closest with you, and how your group looks together.";

const START_TEST: &str = "Start the test";
const RESTART: &str = "Start over";
const BACK: &str = "◀ Back";
const SKIP: &str = "Skip ▶";
const BROWSE_TYPES: &str = "Other types";
const TODAYS_VERSE: &str = "Today's verse";
const SAVE_TO_GROUP: &str = "Save to my group";
const GROUP_MEMBERS: &str = "Group members";
const GROUP_REPORT: &str = "Group analysis";
const REMOVE_MEMBER: &str = "Remove a member";

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn menu_keyboard(has_result: bool) -> KeyboardMarkup {
    let first_row = if has_result {
        vec![KeyboardButton::new(RESTART)]
    } else {
        vec![KeyboardButton::new(START_TEST)]
    };
    KeyboardMarkup::new(vec![
        first_row,
        vec![
            KeyboardButton::new(BROWSE_TYPES),
            KeyboardButton::new(TODAYS_VERSE),
        ],
        vec![
            KeyboardButton::new(SAVE_TO_GROUP),
            KeyboardButton::new(GROUP_MEMBERS),
        ],
        vec![
            KeyboardButton::new(GROUP_REPORT),
            KeyboardButton::new(REMOVE_MEMBER),
        ],
    ])
}

fn rating_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        (1..=5)
            .map(|n| KeyboardButton::new(n.to_string()))
            .collect::<Vec<_>>(),
        vec![KeyboardButton::new(BACK), KeyboardButton::new(SKIP)],
    ])
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(menu_keyboard(false))
        .await?;

    dialogue
        .update(State::Session {
            session: QuizSession::new(),
            viewing: None,
        })
        .await?;
    Ok(())
}

/// Sends whatever the session now shows.
async fn show_transition(
    catalogs: &Catalogs,
    bot: &Bot,
    chat_id: ChatId,
    transition: &Transition,
) -> HandlerResult {
    match transition {
        Transition::NotReady => {
            bot.send_message(chat_id, "The questions are still loading, please try again in a moment.")
                .reply_markup(menu_keyboard(false))
                .await?;
        }
        Transition::Intro => {
            bot.send_message(chat_id, "Whenever you are ready, start the test.")
                .reply_markup(menu_keyboard(false))
                .await?;
        }
        Transition::Question {
            index,
            total,
            question,
        } => {
            bot.send_message(chat_id, render::question(*index, *total, question))
                .reply_markup(rating_keyboard())
                .await?;
        }
        Transition::Completed(snapshot) => {
            let text = render::result(snapshot, catalogs.questions(), catalogs.types());
            bot.send_message(chat_id, text)
                .reply_markup(menu_keyboard(true))
                .await?;
        }
    }
    Ok(())
}

async fn handle_session(
    catalogs: Arc<Catalogs>,
    bot: Bot,
    dialogue: QuizDialogue,
    (mut session, viewing): (QuizSession, Option<TypeCode>),
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please use the buttons below").await?;
        return Ok(());
    };

    let command = match text {
        "/start" => {
            // Keep the stored session so a finished result is still there
            bot.send_message(msg.chat.id, GREETING_TEXT).await?;
            return show_transition(&catalogs, &bot, msg.chat.id, &session.view()).await;
        }
        START_TEST => Command::Start,
        RESTART => Command::Restart,
        BACK => Command::Back,
        SKIP => Command::Skip,
        BROWSE_TYPES => return offer_types(&catalogs, &bot, &dialogue, session, viewing, msg.chat.id).await,
        TODAYS_VERSE => {
            let own = session.result().map(|r| r.card.type_code);
            let profile = viewing
                .or(own)
                .and_then(|code| catalogs.types().and_then(|t| t.get(&code)));
            match profile {
                Some(profile) => bot.send_message(msg.chat.id, render::verse(profile)).await?,
                None => {
                    bot.send_message(msg.chat.id, "Finish the test or pick a type first")
                        .await?
                }
            };
            return Ok(());
        }
        SAVE_TO_GROUP | GROUP_MEMBERS | GROUP_REPORT | REMOVE_MEMBER => {
            let (action, prompt) = match text {
                SAVE_TO_GROUP => (
                    GroupAction::Save,
                    "Send three lines:\ngroup name\npassphrase\nthe name to show in the group",
                ),
                GROUP_MEMBERS => (GroupAction::List, "Send two lines:\ngroup name\npassphrase"),
                GROUP_REPORT => (GroupAction::Analyze, "Send two lines:\ngroup name\npassphrase"),
                _ => (
                    GroupAction::Remove,
                    "Send three lines:\ngroup name\npassphrase\nmember id (see \"Group members\")",
                ),
            };
            bot.send_message(msg.chat.id, prompt)
                .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(BACK)]]))
                .await?;
            dialogue
                .update(State::ReceiveGroupDetails {
                    session,
                    viewing,
                    action,
                })
                .await?;
            return Ok(());
        }
        other => match (session.current_question(), other.trim().parse::<u8>()) {
            (Some(question), Ok(rating)) => Command::Answer {
                question_id: question.id,
                rating,
            },
            _ => {
                bot.send_message(msg.chat.id, "Please choose one of the options")
                    .await?;
                return show_transition(&catalogs, &bot, msg.chat.id, &session.view()).await;
            }
        },
    };

    let transition = session.handle(
        command,
        catalogs.questions(),
        &mut rand::thread_rng(),
        now_ms(),
    );
    let transition = match transition {
        Ok(transition) => transition,
        Err(err) => {
            log::warn!("Rejected {command:?} in chat {}: {err}", msg.chat.id);
            let reply = match err {
                QuizError::InvalidRating(_) => "Please pick a number from 1 to 5".to_string(),
                other => other.to_string(),
            };
            bot.send_message(msg.chat.id, reply).await?;
            return Ok(());
        }
    };
    log::debug!("Chat {}: {command:?} -> {transition:?}", msg.chat.id);

    let viewing = next_viewing(command, &transition, viewing);

    show_transition(&catalogs, &bot, msg.chat.id, &transition).await?;
    dialogue.update(State::Session { session, viewing }).await?;
    Ok(())
}

/// The type shown for "Today's verse" and group saving after a command.
/// Finishing the quiz switches to the user's own type; a fresh start or restart forgets it.
fn next_viewing(command: Command, transition: &Transition, viewing: Option<TypeCode>) -> Option<TypeCode> {
    match (command, transition) {
        (_, Transition::Completed(snapshot)) => Some(snapshot.card.type_code),
        (Command::Start | Command::Restart, _) => None,
        _ => viewing,
    }
}

async fn offer_types(
    catalogs: &Catalogs,
    bot: &Bot,
    dialogue: &QuizDialogue,
    session: QuizSession,
    viewing: Option<TypeCode>,
    chat_id: ChatId,
) -> HandlerResult {
    let Some(types) = catalogs.types() else {
        bot.send_message(chat_id, "The type list is still loading, please try again in a moment.")
            .await?;
        return Ok(());
    };

    let mut rows = types
        .sorted_codes()
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .map(|code| KeyboardButton::new(code.to_string()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    rows.push(vec![KeyboardButton::new(BACK)]);

    bot.send_message(chat_id, "Which type would you like to see?")
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    dialogue
        .update(State::BrowseTypes { session, viewing })
        .await?;
    Ok(())
}

async fn receive_type_choice(
    catalogs: Arc<Catalogs>,
    bot: Bot,
    dialogue: QuizDialogue,
    (session, viewing): (QuizSession, Option<TypeCode>),
    msg: Message,
) -> HandlerResult {
    let has_result = session.result().is_some();
    let choice = msg.text().unwrap_or_default();

    if choice == BACK {
        if session.current_question().is_some() {
            show_transition(&catalogs, &bot, msg.chat.id, &session.view()).await?;
        } else {
            bot.send_message(msg.chat.id, "Back to the menu")
                .reply_markup(menu_keyboard(has_result))
                .await?;
        }
        dialogue.update(State::Session { session, viewing }).await?;
        return Ok(());
    }

    let profile = choice
        .parse::<TypeCode>()
        .ok()
        .and_then(|code| catalogs.types().and_then(|t| t.get(&code)));
    let Some(profile) = profile else {
        bot.send_message(msg.chat.id, "Please pick one of the types below")
            .await?;
        return Ok(());
    };

    if session.current_question().is_some() {
        // Mid-quiz: show the profile, then put the current question back on screen
        bot.send_message(msg.chat.id, render::profile(profile)).await?;
        show_transition(&catalogs, &bot, msg.chat.id, &session.view()).await?;
    } else {
        bot.send_message(msg.chat.id, render::profile(profile))
            .reply_markup(menu_keyboard(has_result))
            .await?;
    }
    dialogue
        .update(State::Session {
            session,
            viewing: Some(profile.code),
        })
        .await?;
    Ok(())
}

async fn receive_group_details(
    catalogs: Arc<Catalogs>,
    groups: GroupStorage,
    bot: Bot,
    dialogue: QuizDialogue,
    (session, viewing, action): (QuizSession, Option<TypeCode>, GroupAction),
    msg: Message,
) -> HandlerResult {
    let has_result = session.result().is_some();
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please answer with text").await?;
        return Ok(());
    };

    if text == BACK {
        bot.send_message(msg.chat.id, "Back to the menu")
            .reply_markup(menu_keyboard(has_result))
            .await?;
        dialogue.update(State::Session { session, viewing }).await?;
        return Ok(());
    }

    // Group name and passphrase are used exactly as typed
    let mut lines = text.lines();
    let key = GroupKey::new(
        lines.next().unwrap_or_default(),
        lines.next().unwrap_or_default(),
    );
    let third = lines.next().unwrap_or_default();

    let reply = match action {
        GroupAction::Save => {
            let type_code = viewing.or(session.result().map(|r| r.card.type_code));
            community::save_result(
                groups.as_ref(),
                &key,
                third,
                type_code,
                catalogs.types(),
                now_ms(),
            )
            .await
            .map(|member| format!("Saved {} ({}) to {}.", member.name, member.type_code, key.name))
        }
        GroupAction::List => community::load_members(groups.as_ref(), &key)
            .await
            .map(|group| render::group(&group, catalogs.types())),
        GroupAction::Analyze => community::load_members(groups.as_ref(), &key)
            .await
            .map(|group| match analysis::analyze(&group.members) {
                Some(report) => render::report(&report, catalogs.types()),
                None => "Nobody has saved a result in this group yet.".to_string(),
            }),
        GroupAction::Remove => community::remove_member(groups.as_ref(), &key, third.trim())
            .await
            .map(|()| "Removed.".to_string()),
    };

    let reply = reply.unwrap_or_else(|err| {
        log::warn!("Group {action:?} failed in chat {}: {err}", msg.chat.id);
        err.to_string()
    });

    bot.send_message(msg.chat.id, reply)
        .reply_markup(menu_keyboard(has_result))
        .await?;
    dialogue.update(State::Session { session, viewing }).await?;
    Ok(())
}
