//! The bot: conversation state, routing and stores wired together.

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use payroll_core::{
    parse_amount, DateRange, Employee, EmployeeId, EmployeeStore, NewShift, PayoutEngine,
    ShiftStore, ValidationError, AMOUNT_EPSILON,
};
use tracing::{debug, error, info, warn};

use crate::calendar::{self, CalendarAction, DatePurpose, RangeStep};
use crate::commands::{MenuCommand, SlashCommand, CANCEL_KEYWORDS};
use crate::error::BotError;
use crate::event::{EventKind, InboundEvent};
use crate::flows;
use crate::locks::{KeyedMutex, DEFAULT_MAX_KEYS};
use crate::reply::{Button, Keyboard, Reply};
use crate::router::{BuiltinAction, CallbackContext, CallbackRouter, Route};
use crate::sender::MessageSender;
use crate::state::{Conversation, TextIntent};

/// Source of "today".
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Today in the local time zone.
pub fn system_clock() -> Clock {
    Arc::new(|| Local::now().date_naive())
}

const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

/// Tunables for [`PayrollBot`].
#[derive(Clone)]
pub struct BotOptions {
    /// Conversations tracked before idle ones are forgotten.
    pub max_conversations: usize,
    pub clock: Clock,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            max_conversations: DEFAULT_MAX_KEYS,
            clock: system_clock(),
        }
    }
}

impl BotOptions {
    pub fn with_max_conversations(mut self, max_conversations: usize) -> Self {
        self.max_conversations = max_conversations;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Pin "today" to a fixed date.
    pub fn with_fixed_date(self, date: NaiveDate) -> Self {
        self.with_clock(Arc::new(move || date))
    }
}

/// Handles inbound events for any number of conversations.
///
/// Events of one conversation are serialized; different conversations
/// proceed independently. Payouts are additionally serialized per employee.
pub struct PayrollBot {
    employees: Arc<dyn EmployeeStore>,
    shifts: Arc<dyn ShiftStore>,
    payouts: Arc<PayoutEngine>,
    sender: Arc<dyn MessageSender>,
    router: CallbackRouter,
    conversations: KeyedMutex<i64, Conversation>,
    payout_locks: KeyedMutex<EmployeeId, ()>,
    clock: Clock,
}

impl PayrollBot {
    /// Create a bot with default options.
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        shifts: Arc<dyn ShiftStore>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self::with_options(employees, shifts, sender, BotOptions::default())
    }

    pub fn with_options(
        employees: Arc<dyn EmployeeStore>,
        shifts: Arc<dyn ShiftStore>,
        sender: Arc<dyn MessageSender>,
        options: BotOptions,
    ) -> Self {
        let payouts = Arc::new(PayoutEngine::new(shifts.clone()));

        let mut router = CallbackRouter::new();
        flows::salary::register(&mut router, payouts.clone());

        Self {
            employees,
            shifts,
            payouts,
            sender,
            router,
            conversations: KeyedMutex::new(options.max_conversations),
            payout_locks: KeyedMutex::new(options.max_conversations),
            clock: options.clock,
        }
    }

    pub fn payouts(&self) -> &Arc<PayoutEngine> {
        &self.payouts
    }

    pub fn router(&self) -> &CallbackRouter {
        &self.router
    }

    /// Snapshot of a conversation's state.
    pub async fn conversation(&self, conversation_id: i64) -> Conversation {
        self.conversations.lock(&conversation_id).await.clone()
    }

    /// Handle one inbound event and deliver the reply, if any.
    ///
    /// Store failures and rejected input are reported to the user and do not
    /// fail the call; only transport failures are returned.
    pub async fn handle_event(&self, event: InboundEvent) -> Result<(), BotError> {
        self.ensure_employee(&event).await;

        let conversation_id = event.conversation_id;
        let mut conversation = self.conversations.lock(&conversation_id).await;
        let ctx = CallbackContext {
            conversation_id,
            employee_id: event.sender.id,
            today: (self.clock)(),
        };

        let outcome = match &event.kind {
            EventKind::Command(command) => self.on_command(&ctx, &mut conversation, command).await,
            EventKind::Text(text) => self.on_text(&ctx, &mut conversation, text).await,
            EventKind::Callback { id, token } => {
                self.on_callback(&ctx, &mut conversation, id, token).await
            }
        };

        let reply = match outcome {
            Ok(Some(reply)) => reply,
            Ok(None) => return Ok(()),
            Err(BotError::Store(e)) => {
                error!("Store failure in conversation {}: {}", conversation_id, e);
                Reply::text(GENERIC_FAILURE)
            }
            Err(BotError::Validation(e)) => Reply::text(validation_message(&e)),
            Err(e) => return Err(e),
        };
        self.sender.deliver(conversation_id, &reply).await
    }

    /// Create the employee on first contact and refresh name and channel after.
    async fn ensure_employee(&self, event: &InboundEvent) {
        let employee = Employee::new(
            event.sender.id,
            event.sender.name.clone(),
            event.conversation_id,
        );
        if let Err(e) = self.employees.upsert_employee(&employee).await {
            warn!("Failed to upsert employee {}: {}", employee.id, e);
        }
    }

    async fn on_command(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        command: &str,
    ) -> Result<Option<Reply>, BotError> {
        let Some(command) = SlashCommand::parse(command) else {
            debug!("Unknown command {:?}", command);
            return Ok(Some(unrecognized()));
        };

        match command {
            SlashCommand::Start => Ok(Some(
                Reply::text("Welcome! Use the menu to record shifts and request payouts.")
                    .with_menu(),
            )),
            SlashCommand::Employees => self.list_employees().await.map(Some),
            SlashCommand::Reset => Ok(Some(
                Reply::text("This deletes all of your shifts and your employee record. Continue?")
                    .with_keyboard(Keyboard::new().row(vec![
                        Button::new("Yes, delete everything", BuiltinAction::ResetConfirm.key()),
                        Button::new("Cancel", BuiltinAction::Cancel.key()),
                    ])),
            )),
            SlashCommand::Help => Ok(Some(help())),
            SlashCommand::Cancel => {
                conversation.reset();
                info!("Conversation {} cancelled", ctx.conversation_id);
                Ok(Some(cancelled()))
            }
        }
    }

    async fn on_text(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<Option<Reply>, BotError> {
        match conversation.interpret(text) {
            TextIntent::Cancel => {
                conversation.reset();
                info!("Conversation {} cancelled", ctx.conversation_id);
                Ok(Some(cancelled()))
            }
            TextIntent::Menu(command) => self.on_menu(ctx, conversation, command).await,
            TextIntent::ShiftAmount(date) => {
                self.submit_shift_amount(ctx, conversation, date, text).await
            }
            TextIntent::PayoutAmount => self.submit_payout_amount(ctx, conversation, text).await,
            TextIntent::Unrecognized => Ok(Some(unrecognized())),
        }
    }

    async fn on_menu(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        command: MenuCommand,
    ) -> Result<Option<Reply>, BotError> {
        debug!("Menu {} in conversation {}", command.id(), ctx.conversation_id);
        match command {
            MenuCommand::AddShift => {
                conversation.reset();
                Ok(Some(Reply::text("Is this shift for today?").with_keyboard(
                    Keyboard::new()
                        .row(vec![
                            Button::new("Today", BuiltinAction::AddShiftToday.key()),
                            Button::new("Other day", BuiltinAction::AddShiftOtherDay.key()),
                        ])
                        .row(vec![cancel_button()]),
                )))
            }
            MenuCommand::ViewSalary => {
                conversation.reset();
                self.salary_summary(ctx).await.map(Some)
            }
            MenuCommand::Payout => {
                conversation.await_payout_amount();
                info!("Conversation {} awaiting payout amount", ctx.conversation_id);
                Ok(Some(
                    Reply::text(
                        "How much should be paid out? Enter an amount, press \"Pay everything\" or type \"cancel\".",
                    )
                    .with_keyboard(
                        Keyboard::new()
                            .row(vec![Button::new("Pay everything", BuiltinAction::PayAll.key())])
                            .row(vec![cancel_button()]),
                    ),
                ))
            }
        }
    }

    async fn salary_summary(&self, ctx: &CallbackContext) -> Result<Reply, BotError> {
        let month = DateRange::month_of(ctx.today).unwrap_or_else(|| DateRange::day(ctx.today));
        let month_total = self.payouts.total_earned(ctx.employee_id, month).await?;
        let unpaid = self.payouts.total_unpaid(ctx.employee_id).await?;

        Ok(Reply::text(format!(
            "Salary this month: {:.2}\nUnpaid in total: {:.2}",
            month_total, unpaid
        ))
        .with_keyboard(Keyboard::new().row(vec![
            Button::new("Other month", flows::salary::OTHER_MONTH_KEY),
            Button::new("Date range", BuiltinAction::SalaryRange.key()),
        ])))
    }

    async fn submit_shift_amount(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        date: NaiveDate,
        text: &str,
    ) -> Result<Option<Reply>, BotError> {
        let amount = match parse_amount(text) {
            Ok(amount) => amount,
            Err(e) => return Ok(Some(reprompt(&e))),
        };

        let id = self
            .shifts
            .add_shift(NewShift::new(ctx.employee_id, date, amount)?)
            .await?;
        conversation.reset();
        info!(
            "Shift {} added for employee {} on {}: {:.2}",
            id, ctx.employee_id, date, amount
        );

        Ok(Some(
            Reply::text(format!("Shift added: {}, {:.2}", format_date(date), amount)).with_menu(),
        ))
    }

    async fn submit_payout_amount(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<Option<Reply>, BotError> {
        let amount = match parse_amount(text) {
            Ok(amount) => amount,
            Err(e) => return Ok(Some(reprompt(&e))),
        };

        let _payout = self.payout_locks.lock(&ctx.employee_id).await;
        let unpaid = self.payouts.total_unpaid(ctx.employee_id).await?;
        if amount > unpaid + AMOUNT_EPSILON {
            info!(
                "Rejected payout of {:.2} for employee {} (unpaid {:.2})",
                amount, ctx.employee_id, unpaid
            );
            return Ok(Some(
                Reply::text(format!(
                    "You can't pay out more than is owed. Unpaid: {:.2}",
                    unpaid
                ))
                .with_keyboard(cancel_keyboard()),
            ));
        }

        self.payouts.apply_payment(ctx.employee_id, amount).await?;
        conversation.reset();

        Ok(Some(
            Reply::text(format!("Payout of {:.2} completed!", amount)).with_menu(),
        ))
    }

    async fn on_callback(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        callback_id: &str,
        token: &str,
    ) -> Result<Option<Reply>, BotError> {
        if let Err(e) = self.sender.acknowledge(callback_id).await {
            warn!("Failed to acknowledge callback {}: {}", callback_id, e);
        }

        match self.router.route(token) {
            Route::Calendar { key, payload } => {
                self.on_calendar(ctx, conversation, &key, &payload).await
            }
            Route::Handler { handler, payload } => handler.handle(ctx, &payload).await,
            Route::Builtin(action) => self.on_builtin(ctx, conversation, action).await,
            Route::Ignored => {
                debug!("Ignoring unknown callback {:?}", token);
                Ok(None)
            }
        }
    }

    async fn on_calendar(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        key: &str,
        payload: &str,
    ) -> Result<Option<Reply>, BotError> {
        match CalendarAction::parse(key, payload)? {
            Some(CalendarAction::Show { year, month }) => {
                Ok(Some(calendar::render_reply(year, month)))
            }
            Some(CalendarAction::Day(date)) => self.on_date_picked(ctx, conversation, date).await,
            None => {
                debug!("Ignoring calendar key {:?}", key);
                Ok(None)
            }
        }
    }

    async fn on_date_picked(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        date: NaiveDate,
    ) -> Result<Option<Reply>, BotError> {
        match conversation.picker.take() {
            Some(DatePurpose::ShiftDate) => {
                conversation.await_shift_amount(date);
                info!(
                    "Conversation {} awaiting shift amount for {}",
                    ctx.conversation_id, date
                );
                Ok(Some(amount_prompt(date).amended()))
            }
            Some(DatePurpose::Range(RangeStep::CollectingStart)) => {
                conversation.await_date(DatePurpose::Range(RangeStep::CollectingEnd { start: date }));
                let (title, keyboard) = calendar::render(date.year(), date.month());
                Ok(Some(
                    Reply::text(format!(
                        "Start: {}\nNow pick the end date.\n{}",
                        format_date(date),
                        title
                    ))
                    .with_keyboard(keyboard)
                    .amended(),
                ))
            }
            Some(DatePurpose::Range(RangeStep::CollectingEnd { start })) => {
                let range = DateRange::ordered(start, date);
                let total = self.payouts.total_earned(ctx.employee_id, range).await?;
                Ok(Some(
                    Reply::text(format!(
                        "Earned from {} to {}: {:.2}",
                        format_date(range.from),
                        format_date(range.to),
                        total
                    ))
                    .amended(),
                ))
            }
            None => Ok(Some(
                Reply::text("That date can't be used right now. Choose a command from the menu.")
                    .with_menu(),
            )),
        }
    }

    async fn on_builtin(
        &self,
        ctx: &CallbackContext,
        conversation: &mut Conversation,
        action: BuiltinAction,
    ) -> Result<Option<Reply>, BotError> {
        debug!("Builtin {:?} in conversation {}", action, ctx.conversation_id);
        match action {
            BuiltinAction::AddShiftToday => {
                conversation.await_shift_amount(ctx.today);
                info!(
                    "Conversation {} awaiting shift amount for {}",
                    ctx.conversation_id, ctx.today
                );
                Ok(Some(amount_prompt(ctx.today).amended()))
            }
            BuiltinAction::AddShiftOtherDay => {
                conversation.await_date(DatePurpose::ShiftDate);
                Ok(Some(calendar::render_reply(ctx.today.year(), ctx.today.month())))
            }
            BuiltinAction::Cancel => {
                conversation.reset();
                info!("Conversation {} cancelled", ctx.conversation_id);
                Ok(Some(Reply::text("Cancelled.").amended()))
            }
            BuiltinAction::PayAll => {
                let _payout = self.payout_locks.lock(&ctx.employee_id).await;
                self.payouts
                    .mark_all_paid(ctx.employee_id, DateRange::all_time())
                    .await?;
                conversation.reset();
                Ok(Some(Reply::text("Everything is paid out!").amended()))
            }
            BuiltinAction::SalaryRange => {
                conversation.await_date(DatePurpose::Range(RangeStep::CollectingStart));
                let (title, keyboard) = calendar::render(ctx.today.year(), ctx.today.month());
                Ok(Some(
                    Reply::text(format!("Pick the start date of the range.\n{}", title))
                        .with_keyboard(keyboard)
                        .amended(),
                ))
            }
            BuiltinAction::ResetConfirm => {
                let _payout = self.payout_locks.lock(&ctx.employee_id).await;
                let deleted = self.shifts.delete_shifts(ctx.employee_id).await?;
                match self.employees.delete_employee(ctx.employee_id).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e.into()),
                }
                conversation.reset();
                info!(
                    "Reset employee {} ({} shifts deleted)",
                    ctx.employee_id, deleted
                );
                Ok(Some(
                    Reply::text("All of your data has been deleted. Send /start to begin again.")
                        .amended(),
                ))
            }
        }
    }

    async fn list_employees(&self) -> Result<Reply, BotError> {
        let employees = self.employees.get_all_employees().await?;
        if employees.is_empty() {
            return Ok(Reply::text("No employees found."));
        }

        let mut text = String::from("Employees:");
        for employee in employees {
            text.push_str(&format!(
                "\nID: {}, {} ({})",
                employee.id, employee.name, employee.role
            ));
        }
        Ok(Reply::text(text))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn cancel_button() -> Button {
    Button::new("Cancel", BuiltinAction::Cancel.key())
}

fn cancel_keyboard() -> Keyboard {
    Keyboard::new().row(vec![cancel_button()])
}

fn amount_prompt(date: NaiveDate) -> Reply {
    Reply::text(format!("Enter the amount for the shift on {}:", format_date(date)))
        .with_keyboard(cancel_keyboard())
}

fn reprompt(error: &ValidationError) -> Reply {
    Reply::text(validation_message(error)).with_keyboard(cancel_keyboard())
}

fn cancelled() -> Reply {
    Reply::text("Cancelled. Choose a command from the menu.").with_menu()
}

fn unrecognized() -> Reply {
    Reply::text("Unrecognized command. Choose a command from the menu.").with_menu()
}

fn help() -> Reply {
    let mut text = String::from("Commands:\n/start - show the menu\n/employees - list employees\n/reset - delete all of your data\n/help - this message\n\nMenu:");
    for command in MenuCommand::ALL {
        text.push_str(&format!("\n{}", command.label()));
    }
    text.push_str(&format!(
        "\n\nTo abort an entry, type one of: {}",
        CANCEL_KEYWORDS.join(", ")
    ));
    Reply::text(text).with_menu()
}

/// User-facing text for rejected input.
pub fn validation_message(error: &ValidationError) -> String {
    match error {
        ValidationError::NotANumber(_) => "Invalid amount. Try again.".to_string(),
        ValidationError::NotFinite => "The amount must be a finite number. Try again.".to_string(),
        ValidationError::BelowMinimum { min } => {
            format!("The amount must be at least {}. Enter the amount again.", min)
        }
        ValidationError::MalformedToken(_) => "That date is not valid.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            validation_message(&ValidationError::BelowMinimum { min: 1.0 }),
            "The amount must be at least 1. Enter the amount again."
        );
        assert_eq!(
            validation_message(&ValidationError::NotANumber("abc".into())),
            "Invalid amount. Try again."
        );
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_date(date), "09.03.2024");
    }

    #[test]
    fn test_help_lists_menu_and_cancel_keywords() {
        let reply = help();
        assert!(reply.text.contains("📅 Add shift"));
        assert!(reply.text.contains("отмена"));
        assert!(reply.menu);
    }

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 2).unwrap();
        let options = BotOptions::default().with_fixed_date(date);
        assert_eq!((options.clock)(), date);
    }
}
