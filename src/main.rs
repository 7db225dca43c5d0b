pub mod structs;
pub mod api;
pub mod io;
pub mod config;
pub mod error;
pub mod time;
pub mod locator;
pub mod delivery;

use api::*;
use delivery::*;
use error::TransitError;
use io::StopStore;
use structs::*;

use async_trait::async_trait;
use dptree::{case, deps};
use std::{error::Error, sync::Arc};
use teloxide::{
    dispatching::{dialogue, dialogue::InMemStorage},
    dptree::endpoint,
    filter_command,
    payloads::SendMessageSetters,
    prelude::*,
    types::{
        ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    },
    utils::command::BotCommands,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type MyDialogue = Dialogue<State, InMemStorage<State>>;

/// Read-only shared state: the stop reference data and the provider
/// routing config. Nothing in it mutates after startup, so no lock.
pub struct AppContext {
    pub store: StopStore,
    pub router: ProviderRouter,
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "Display help menu showing the commands list")]
    Help,
    #[command(description = "Find the next buses near you.")]
    Start,
    #[command(description = "Stop looking for buses.")]
    Cancel,
}

#[derive(Clone, Default)]
enum State {
    #[default]
    Start,
    ReceiveLocation,
    ReceiveStop {
        choices: Vec<MergedStopChoice>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting 'Next buses near me' BOT ...");

    let bot = Bot::from_env();

    let store = StopStore::load(config::stops_data_path())?;
    if store.is_empty() {
        log::warn!("Stop store is empty, every location query will come up short");
    }
    let router = ProviderRouter::new(config::grt_base_url(), config::nextbus_base_url());
    let ctx = Arc::new(AppContext { store, router });

    let command_handler = filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![State::ReceiveLocation].endpoint(receive_location))
        .branch(endpoint(invalid_state));

    let callback_query_handler = Update::filter_callback_query().branch(
        case![State::ReceiveStop { choices }].endpoint(receive_stop),
    );

    let dial = dialogue::enter::<Update, InMemStorage<State>, State, _>()
        .branch(message_handler)
        .branch(callback_query_handler);

    Dispatcher::builder(bot, dial)
        .dependencies(deps![InMemStorage::<State>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Type /help to see the usage.",
    )
    .await?;
    Ok(())
}

//////////////////////////////////////////////////////////
// State handlers
//////////////////////////////////////////////////////////
async fn cancel(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "🚫 Ok, not looking for buses anymore!")
        .await?;
    dialogue.exit().await?;
    Ok(())
}

async fn start(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "🚌 Let's find your next bus!\n\nWhere are you?",
    )
    .reply_markup(make_location_keyboard())
    .await?;
    dialogue.update(State::ReceiveLocation).await?;
    Ok(())
}

async fn receive_location(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let location = match msg.location() {
        Some(location) => location,
        None => {
            bot.send_message(msg.chat.id, "❌ Please share your location with me.")
                .reply_markup(make_location_keyboard())
                .await?;
            return Ok(());
        }
    };

    let choices = locator::locate(
        &ctx.store,
        location.latitude,
        location.longitude,
        config::SEARCH_RADIUS_METERS,
    );

    match choices.len() {
        0 => {
            let err = TransitError::NoStopsNearby {
                radius_m: config::SEARCH_RADIUS_METERS as u32,
            };
            bot.send_message(msg.chat.id, err.user_message())
                .reply_markup(make_location_keyboard())
                .await?;
        }
        // A single merged choice needs no menu.
        1 => {
            let choice = choices.into_iter().next().unwrap();
            bot.send_message(msg.chat.id, format!("🚏 Closest stop: {}", choice.name))
                .await?;
            spawn_delivery(bot, msg.chat.id, ctx, choice);
        }
        _ => {
            let choice_names = choices
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<&str>>();
            let kb = make_inline_keyboard(choice_names, 2);
            bot.send_message(msg.chat.id, "Which stop?")
                .reply_markup(kb)
                .await?;
            dialogue.update(State::ReceiveStop { choices }).await?;
        }
    }
    Ok(())
}

async fn receive_stop(
    bot: Bot,
    dialogue: MyDialogue,
    choices: Vec<MergedStopChoice>,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    if let Some(picked) = &q.data {
        let msg = match q.message.as_ref() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let chat_id = msg.chat.id;

        // Remove buttons from the menu message.
        bot.edit_message_reply_markup(chat_id, msg.id)
            .reply_markup(InlineKeyboardMarkup::default())
            .await?;

        let choice = match find_choice(&choices, picked) {
            Some(choice) => choice.clone(),
            None => {
                bot.send_message(chat_id, "❌ I don't know that stop, please pick one again.")
                    .await?;
                return Ok(());
            }
        };

        spawn_delivery(bot, chat_id, ctx, choice);
        dialogue.update(State::ReceiveLocation).await?;
    }
    Ok(())
}

/// Callback data carries the choice's exact name, so only an exact match
/// selects it. A prefix match could pick a sibling whose name extends the
/// tapped one (e.g. "King St" vs "King St & Weber").
fn find_choice<'a>(choices: &'a [MergedStopChoice], picked: &str) -> Option<&'a MergedStopChoice> {
    choices.iter().find(|c| c.name == picked)
}

//////////////////////////////////////////////////////////
// Arrival delivery
//////////////////////////////////////////////////////////

/// Every delivery sequence runs in its own task with its own timer; a
/// new location share while one is in flight just starts another.
fn spawn_delivery(bot: Bot, chat_id: ChatId, ctx: Arc<AppContext>, choice: MergedStopChoice) {
    tokio::spawn(async move {
        send_arrivals(bot, chat_id, ctx, choice).await;
    });
}

async fn send_arrivals(bot: Bot, chat_id: ChatId, ctx: Arc<AppContext>, choice: MergedStopChoice) {
    log::debug!(
        "Fetching arrivals for '{}' (stops {:?})",
        choice.name,
        choice.stop_ids()
    );
    let sink = TelegramSink { bot, chat_id };

    let outcome = match aggregate_arrivals(&ctx.router, &choice.stops).await {
        Ok(mut lines) => {
            lines.insert(0, format!("🚍 Next buses at {}:", choice.name));
            PacedDelivery::new(lines).run(&sink).await
        }
        Err(e) => {
            log::warn!("Aggregation for '{}' failed: {}", choice.name, e);
            sink.send_final(&e.user_message()).await
        }
    };
    if let Err(e) = outcome {
        log::warn!("Delivery to chat {} failed: {}", chat_id, e);
    }
}

struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
}

#[async_trait]
impl DeliverySink for TelegramSink {
    async fn send_line(&self, text: &str) -> HandlerResult {
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn send_final(&self, text: &str) -> HandlerResult {
        self.bot
            .send_message(
                self.chat_id,
                format!("{}\n\nSend a new location for updated times 📍", text),
            )
            .reply_markup(make_location_keyboard())
            .await?;
        Ok(())
    }
}

//////////////////////////////////////////////////////////
// Keyboards
//////////////////////////////////////////////////////////
/// Creates an inline keyboard made of callback buttons, `chunks` per row.
fn make_inline_keyboard(list: Vec<&str>, chunks: usize) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = vec![];

    for values in list.chunks(chunks) {
        let row = values
            .iter()
            .map(|&name| InlineKeyboardButton::callback(name.to_owned(), name.to_owned()))
            .collect();

        keyboard.push(row);
    }

    InlineKeyboardMarkup::new(keyboard)
}

/// One-button reply keyboard that asks Telegram for a location share.
fn make_location_keyboard() -> KeyboardMarkup {
    let button = KeyboardButton::new("📍 Share my location").request(ButtonRequest::Location);
    KeyboardMarkup::new(vec![vec![button]])
        .resize_keyboard(true)
        .one_time_keyboard(true)
}
