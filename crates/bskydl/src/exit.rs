use std::process::ExitCode;

/// Outcome of a command: an exit status plus an optional closing message.
#[derive(Debug)]
pub struct Exit {
    failed: bool,
    message: Option<String>,
}

impl Exit {
    pub fn success() -> Self {
        Self {
            failed: false,
            message: None,
        }
    }

    pub fn error() -> Self {
        Self {
            failed: true,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Print the message (stderr on failure) and produce the exit code.
    pub fn report(self) -> ExitCode {
        if let Some(message) = &self.message {
            if self.failed {
                eprintln!("{message}");
            } else {
                println!("{message}");
            }
        }
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}
