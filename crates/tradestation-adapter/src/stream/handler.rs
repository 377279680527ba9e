/*
[INPUT]:  Parsed stream messages
[OUTPUT]: Caller callbacks; default handler logs bars at info, the rest at debug
[POS]:    Stream layer - message dispatch capability
[UPDATE]: When adding handler adapters or changing default logging
*/

use serde_json::Value;
use tracing::{debug, info};

/// Receives every message a stream delivers.
///
/// Invoked on the stream's own task; a handler that blocks delays both the
/// next read and the stop check.
pub trait MessageHandler: Send {
    fn on_message(&mut self, message: Value);
}

impl<F> MessageHandler for F
where
    F: FnMut(Value) + Send,
{
    fn on_message(&mut self, message: Value) {
        self(message)
    }
}

/// Handler used when the caller supplies none
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessageHandler;

impl MessageHandler for DefaultMessageHandler {
    fn on_message(&mut self, message: Value) {
        match format_bar_line(&message) {
            Some(line) => info!("{line}"),
            None => debug!(message = %message, "stream message"),
        }
    }
}

/// `<ts> | O:<o> H:<h> L:<l> C:<c>` for bar-shaped messages
pub fn format_bar_line(message: &Value) -> Option<String> {
    let ts = field_text(message, "TimeStamp")?;
    let open = field_text(message, "Open")?;
    let high = field_text(message, "High")?;
    let low = field_text(message, "Low")?;
    let close = field_text(message, "Close")?;
    Some(format!("{ts} | O:{open} H:{high} L:{low} C:{close}"))
}

fn field_text(message: &Value, key: &str) -> Option<String> {
    match message.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
