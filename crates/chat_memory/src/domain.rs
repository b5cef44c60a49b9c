use std::fmt;

/// One user prompt and the reply generated for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    pub input: String,
    pub output: String,
}

impl Exchange {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Exchange {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Transcript line format, shared by every store so the prompt context reads
/// the same regardless of backend.
impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "User: {}", self.input)?;
        writeln!(f, "Bot: {}", self.output)
    }
}
