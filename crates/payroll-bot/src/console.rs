//! Line-based console transport.
//!
//! Input lines starting with `/` are commands, lines starting with `>` press
//! the button whose token follows, anything else is free text. Replies are
//! printed with their buttons as `[label] > token`.

use async_trait::async_trait;
use futures::Stream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;
use tracing::debug;

use crate::commands::MenuCommand;
use crate::error::BotError;
use crate::event::{EventSender, InboundEvent};
use crate::reply::Reply;
use crate::sender::MessageSender;

/// Turn one input line into an event. Blank lines yield nothing.
pub fn parse_line(
    line: &str,
    conversation_id: i64,
    sender: &EventSender,
    sequence: u64,
) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(token) = line.strip_prefix('>') {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        return Some(InboundEvent::callback(
            conversation_id,
            sender.clone(),
            format!("console-{}", sequence),
            token,
        ));
    }
    if line.starts_with('/') {
        return Some(InboundEvent::command(conversation_id, sender.clone(), line));
    }
    Some(InboundEvent::text(conversation_id, sender.clone(), line))
}

/// Events read line by line from `reader` until end of input.
pub fn console_events<R>(
    reader: R,
    conversation_id: i64,
    sender: EventSender,
) -> impl Stream<Item = InboundEvent>
where
    R: AsyncBufRead + Unpin,
{
    futures::stream::unfold((reader.lines(), 0u64), move |(mut lines, sequence)| {
        let sender = sender.clone();
        async move {
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_line(&line, conversation_id, &sender, sequence) {
                            return Some((event, (lines, sequence + 1)));
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        debug!("Console input closed: {}", e);
                        return None;
                    }
                }
            }
        }
    })
}

/// Text form of a reply.
pub fn render(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    if let Some(keyboard) = &reply.keyboard {
        for row in &keyboard.rows {
            let buttons: Vec<String> = row
                .iter()
                .map(|b| format!("[{}] > {}", b.label, b.token))
                .collect();
            out.push('\n');
            out.push_str(&buttons.join("   "));
        }
    }
    if reply.menu {
        let labels: Vec<&str> = MenuCommand::ALL.iter().map(|c| c.label()).collect();
        out.push_str("\nMenu: ");
        out.push_str(&labels.join(" | "));
    }
    out
}

/// Prints replies to standard output.
pub struct ConsoleSender {
    out: Mutex<Stdout>,
}

impl Default for ConsoleSender {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSender {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }

    async fn write(&self, text: &str) -> Result<(), BotError> {
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes())
            .await
            .map_err(|e| BotError::send(e.to_string()))?;
        out.flush().await.map_err(|e| BotError::send(e.to_string()))
    }
}

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn send(&self, _conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        self.write(&format!("\n{}\n", render(reply))).await
    }

    async fn edit(&self, _conversation_id: i64, reply: &Reply) -> Result<(), BotError> {
        self.write(&format!("\n(updated)\n{}\n", render(reply))).await
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), BotError> {
        debug!("Acknowledged {}", callback_id);
        Ok(())
    }
}
