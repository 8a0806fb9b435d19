//! Encode/decode request lifecycle: input validation, phases, and error text.

use crate::backend::BackendError;

pub const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to encode";
pub const EMPTY_TOKENS_MESSAGE: &str = "Please enter token IDs to decode";
pub const INVALID_TOKENS_MESSAGE: &str = "Please enter valid comma-separated integers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPhase {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

impl Operation {
    pub fn idle_label(self) -> &'static str {
        match self {
            Operation::Encode => "Encode",
            Operation::Decode => "Decode",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Operation::Encode => "Encoding...",
            Operation::Decode => "Decoding...",
        }
    }

    fn failure_prefix(self) -> &'static str {
        match self {
            Operation::Encode => "Encoding failed",
            Operation::Decode => "Decoding failed",
        }
    }
}

/// Phase tracking for one operation. At most one request is in flight.
#[derive(Debug, Clone, Copy)]
pub struct OperationState {
    operation: Operation,
    phase: RequestPhase,
}

impl OperationState {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            phase: RequestPhase::Idle,
        }
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn is_in_flight(&self) -> bool {
        self.phase == RequestPhase::InFlight
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_in_flight()
    }

    pub fn label(&self) -> &'static str {
        if self.is_in_flight() {
            self.operation.busy_label()
        } else {
            self.operation.idle_label()
        }
    }

    /// Enter `InFlight`. Returns false (and changes nothing) if already there.
    pub fn begin(&mut self) -> bool {
        if self.is_in_flight() {
            return false;
        }
        self.phase = RequestPhase::InFlight;
        true
    }

    pub fn finish(&mut self, succeeded: bool) {
        self.phase = if succeeded {
            RequestPhase::Succeeded
        } else {
            RequestPhase::Failed
        };
    }
}

/// Accept any text with non-whitespace content. The raw text is what gets sent.
pub fn validate_encode_input(text: &str) -> Result<&str, BackendError> {
    if text.trim().is_empty() {
        return Err(BackendError::Validation(EMPTY_TEXT_MESSAGE.to_string()));
    }
    Ok(text)
}

/// Parse `"15496, 11, 995"` into ids. Any bad piece rejects the whole list.
pub fn parse_token_list(input: &str) -> Result<Vec<i64>, BackendError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(BackendError::Validation(EMPTY_TOKENS_MESSAGE.to_string()));
    }

    input
        .split(',')
        .map(|piece| piece.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| BackendError::Validation(INVALID_TOKENS_MESSAGE.to_string()))
}

pub fn format_token_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text shown in the error popup for a failed operation.
pub fn user_message(operation: Operation, error: &BackendError, base_url: &str) -> String {
    match error {
        BackendError::Validation(message) => message.clone(),
        BackendError::Connectivity(_) => format!(
            "Cannot connect to backend server. Please make sure the tokenizer backend is running at {}.",
            base_url
        ),
        BackendError::Server { .. } | BackendError::MalformedResponse(_) => {
            format!("{}: {}", operation.failure_prefix(), error)
        }
    }
}
