/// Requests from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Acquire media and join the queue
    Start,
    /// Leave the current session or queue
    End,
    ToggleMute,
    ToggleCamera,
    SendChat(String),
    SetAutoRequeue(bool),
    /// End everything and stop the event loop
    Shutdown,
}
