//! Input line commands.

use rakugaki_shared::message::{Message, Method};

use crate::error::ClientError;

/// One line typed at the prompt.
#[derive(Debug)]
pub enum Command {
    /// `draw <json>`: send a stroke and keep it locally
    Draw(Message),
    /// `clear`: wipe the canvas for everyone
    Clear,
    /// `history`: show the local stroke count
    History,
    /// `quit`: leave the room
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ClientError> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match head {
            "draw" => {
                let payload = rest.trim();
                if payload.is_empty() {
                    return Err(ClientError::InvalidCommand(
                        "draw needs a JSON payload".to_string(),
                    ));
                }
                Ok(Command::Draw(Message::with_raw_data(Method::Draw, payload)?))
            }
            "clear" => Ok(Command::Clear),
            "history" => Ok(Command::History),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(ClientError::InvalidCommand(line.to_string())),
        }
    }
}
