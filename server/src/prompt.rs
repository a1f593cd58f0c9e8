use shared::{Message, Role};

/// Flattens `history` and the new `message` into a single completion prompt
/// ending with an open `Bot:` cue.
pub fn build_prompt(history: &[Message], message: &str) -> String {
    let lines = history
        .iter()
        .map(|m| format!("{}: {}", speaker(m.role), m.text))
        .collect::<Vec<_>>()
        .join("\n");

    if history.is_empty() {
        format!("User: {}\nBot:", message)
    } else {
        format!("{}\nUser: {}\nBot:", lines, message)
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Bot => "Bot",
    }
}
