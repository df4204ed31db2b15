/// What the next trial does to the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Candidates are active; the trial parks the left half.
    #[default]
    Narrowing,
    /// Candidates are parked; the trial restores the right half.
    Restoring,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Narrowing => "NARROWING",
            Mode::Restoring => "RESTORING",
        }
    }
}
