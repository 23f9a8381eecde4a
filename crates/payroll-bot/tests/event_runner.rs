use std::sync::Arc;

use chrono::NaiveDate;
use payroll_bot::{
    BotOptions, EventRunner, EventSender, InboundEvent, PayrollBot, PendingInput, RecordingSender,
};
use payroll_core::{DateRange, InMemoryStore, ShiftStore};
use worker_pool::WorkerPool;

fn script(id: i64, amounts: &[u32]) -> Vec<InboundEvent> {
    let user = EventSender::new(id, format!("user-{}", id));
    let mut events = vec![InboundEvent::command(id, user.clone(), "/start")];
    for (n, amount) in amounts.iter().enumerate() {
        events.push(InboundEvent::text(id, user.clone(), "📅 Add shift"));
        events.push(InboundEvent::callback(id, user.clone(), format!("{}-{}", id, n), "addshift_today"));
        events.push(InboundEvent::text(id, user.clone(), amount.to_string()));
    }
    events
}

/// Interleave scripts the way concurrent users would.
fn interleave(scripts: Vec<Vec<InboundEvent>>) -> Vec<InboundEvent> {
    let longest = scripts.iter().map(Vec::len).max().unwrap_or(0);
    let mut iters: Vec<_> = scripts.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::new();
    for _ in 0..longest {
        for it in iters.iter_mut() {
            out.extend(it.next());
        }
    }
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_runner_keeps_per_conversation_order() {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingSender::new());
    let bot = Arc::new(PayrollBot::with_options(
        store.clone(),
        store.clone(),
        sender.clone(),
        BotOptions::default().with_fixed_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()),
    ));
    let pool = Arc::new(WorkerPool::new(4, 2));
    let runner = EventRunner::new(bot.clone(), pool.clone());

    let scripts = (1..=6).map(|id| script(id, &[10, 20, 30])).collect();
    let events = interleave(scripts);
    let total = events.len();

    let handled = runner.run(futures::stream::iter(events)).await.unwrap();
    assert_eq!(handled, total);
    assert!(pool.is_closed());

    for id in 1..=6 {
        let mut amounts: Vec<f64> = store
            .get_shifts(id, DateRange::all_time())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.amount)
            .collect();
        amounts.sort_by(f64::total_cmp);
        assert_eq!(amounts, vec![10.0, 20.0, 30.0], "conversation {id}");
        assert_eq!(bot.conversation(id).await.pending, PendingInput::Idle);
    }
    assert_eq!(sender.replies().await.len(), total);
}

#[tokio::test]
async fn test_runner_stops_on_shutdown() {
    let store = Arc::new(InMemoryStore::new());
    let bot = Arc::new(PayrollBot::new(
        store.clone(),
        store,
        Arc::new(RecordingSender::new()),
    ));
    let pool = Arc::new(WorkerPool::new(1, 1));
    let runner = EventRunner::new(bot, pool.clone());

    let handled = runner
        .run_with_shutdown(futures::stream::pending::<InboundEvent>(), async {})
        .await
        .unwrap();
    assert_eq!(handled, 0);
    assert!(pool.is_closed());
}
