//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing a notice
pub fn redisplay_prompt(room: i64) {
    print!("room {}> ", room);
    std::io::stdout().flush().ok();
}

/// Print a notice above the prompt
pub fn notice(room: i64, text: &str) {
    print!("\r{}\n", text);
    redisplay_prompt(room);
}
