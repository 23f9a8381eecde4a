use std::sync::Arc;

use chrono::NaiveDate;
use payroll_bot::{
    BotOptions, Conversation, EventSender, InboundEvent, PayrollBot, PendingInput, RecordingSender,
};
use payroll_core::{DateRange, InMemoryStore, NewShift, ShiftStore};

const ANN: i64 = 7;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn setup() -> (PayrollBot, Arc<InMemoryStore>, Arc<RecordingSender>) {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingSender::new());
    let bot = PayrollBot::with_options(
        store.clone(),
        store.clone(),
        sender.clone(),
        BotOptions::default().with_fixed_date(today()),
    );
    (bot, store, sender)
}

async fn press(bot: &PayrollBot, id: &str, token: &str) {
    bot.handle_event(InboundEvent::callback(ANN, EventSender::new(ANN, "Ann"), id, token))
        .await
        .unwrap();
}

async fn say(bot: &PayrollBot, text: &str) {
    bot.handle_event(InboundEvent::text(ANN, EventSender::new(ANN, "Ann"), text))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_tokens_are_ignored() {
    let (bot, store, sender) = setup();
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    store.add_shift(NewShift::new(ANN, date, 40.0).unwrap()).await.unwrap();
    say(&bot, "💸 Payout").await;

    let before: Conversation = bot.conversation(ANN).await;
    let shifts_before = store.get_shifts(ANN, DateRange::all_time()).await.unwrap();
    sender.clear().await;

    for token in ["bogus", "bogus|1", "", "|", "\u{c}", "\u{c}nothing|here", "cal_unknown|1"] {
        press(&bot, "cb", token).await;
    }

    assert!(sender.replies().await.is_empty());
    assert_eq!(bot.conversation(ANN).await, before);
    assert_eq!(
        store.get_shifts(ANN, DateRange::all_time()).await.unwrap(),
        shifts_before
    );
}

#[tokio::test]
async fn test_every_press_is_acknowledged() {
    let (bot, _store, sender) = setup();
    press(&bot, "cb-1", "bogus").await;
    press(&bot, "cb-2", "addshift_today").await;
    press(&bot, "cb-3", "cal_next|7-2024").await;
    press(&bot, "cb-4", "month_next|2024").await;

    assert_eq!(sender.acknowledged().await, vec!["cb-1", "cb-2", "cb-3", "cb-4"]);
}

#[tokio::test]
async fn test_framing_prefix_is_stripped() {
    let (bot, _store, _sender) = setup();
    press(&bot, "cb", "\u{c}addshift_today").await;
    assert_eq!(
        bot.conversation(ANN).await.pending,
        PendingInput::AwaitingShiftAmount(today())
    );
}

#[tokio::test]
async fn test_malformed_day_reports_and_keeps_state() {
    let (bot, _store, sender) = setup();
    press(&bot, "cb", "addshift_other").await;
    let before = bot.conversation(ANN).await;

    press(&bot, "cb", "cal_day|31-2-2024").await;
    let reply = sender.last().await.unwrap().reply;
    assert_eq!(reply.text, "That date is not valid.");
    assert_eq!(bot.conversation(ANN).await, before);

    // The picker is still armed for the shift date.
    press(&bot, "cb", "cal_day|29-2-2024").await;
    assert_eq!(
        bot.conversation(ANN).await.pending,
        PendingInput::AwaitingShiftAmount(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );
}

#[tokio::test]
async fn test_month_picker_flow() {
    let (bot, store, sender) = setup();
    for (m, d, amount) in [(2, 1, 10.0), (2, 29, 5.5), (3, 1, 100.0)] {
        let date = NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        store.add_shift(NewShift::new(ANN, date, amount).unwrap()).await.unwrap();
    }

    press(&bot, "cb", "salary_other_month").await;
    let reply = sender.last().await.unwrap().reply;
    assert_eq!(reply.text, "Pick a month: 2024");
    assert!(reply.has_token("pick_month|2024-02"));

    press(&bot, "cb", "month_prev|2024").await;
    let reply = sender.last().await.unwrap().reply;
    assert_eq!(reply.text, "Pick a month: 2023");

    press(&bot, "cb", "pick_month|2024-02").await;
    let reply = sender.last().await.unwrap().reply;
    assert_eq!(reply.text, "Salary for 02.2024: 15.50");
}

#[tokio::test]
async fn test_malformed_month_payload_is_ignored() {
    let (bot, _store, sender) = setup();
    for token in [
        "pick_month|2024",
        "pick_month|2024-13",
        "month_next|soon",
        "month_prev",
        "month_next|2147483646",
        "month_prev|-2147483647",
    ] {
        press(&bot, "cb", token).await;
    }
    assert!(sender.replies().await.is_empty());
}

#[tokio::test]
async fn test_registered_flows() {
    let (bot, _store, _sender) = setup();
    let mut keys = bot.router().keys();
    keys.sort();
    assert_eq!(keys, vec!["month_next", "month_prev", "pick_month", "salary_other_month"]);
}
