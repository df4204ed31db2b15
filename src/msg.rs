/// Everything the console oracle can receive while waiting for an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// One line typed by the user, without its line ending.
    Line(String),
    /// Stdin reached end of file or failed.
    InputClosed,
    /// SIGINT / SIGTERM arrived.
    Interrupted,
}
