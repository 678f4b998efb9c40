//! Authorization Prompt
//!
//! The synchronous user-interaction channel of the authorization code flow:
//! show the authorization URL, read back one line containing the code.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use crate::error::{AuthorizationError, OAuth2Error};

/// What the user is asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptRequest {
    /// URL the user must open.
    pub authorization_url: String,
    /// Instruction shown before the URL.
    pub message: String,
}

impl PromptRequest {
    /// Standard request for an authorization URL.
    pub fn new(authorization_url: impl Into<String>) -> Self {
        Self {
            authorization_url: authorization_url.into(),
            message: "Go to the following link in your browser then type the authorization code:"
                .to_string(),
        }
    }
}

/// Blocking user interaction.
///
/// Implementations may block indefinitely; callers needing a timeout wrap
/// the acquisition externally.
pub trait AuthorizationPrompt: Send + Sync {
    /// Present the request and return the user's raw answer.
    fn prompt(&self, request: &PromptRequest) -> Result<String, OAuth2Error>;
}

impl<F> AuthorizationPrompt for F
where
    F: Fn(&PromptRequest) -> Result<String, OAuth2Error> + Send + Sync,
{
    fn prompt(&self, request: &PromptRequest) -> Result<String, OAuth2Error> {
        self(request)
    }
}

/// Prompt on the process stdout/stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }
}

impl AuthorizationPrompt for ConsolePrompt {
    fn prompt(&self, request: &PromptRequest) -> Result<String, OAuth2Error> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        interact(&mut input, &mut output, request)
    }
}

/// Prompt over arbitrary streams.
pub struct StreamPrompt<R, W> {
    streams: Mutex<(R, W)>,
}

impl<R: BufRead + Send, W: Write + Send> StreamPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            streams: Mutex::new((input, output)),
        }
    }

    /// Recover the output stream.
    pub fn into_output(self) -> W {
        self.streams.into_inner().unwrap_or_else(|e| e.into_inner()).1
    }
}

impl<R: BufRead + Send, W: Write + Send> AuthorizationPrompt for StreamPrompt<R, W> {
    fn prompt(&self, request: &PromptRequest) -> Result<String, OAuth2Error> {
        let mut guard = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        let (input, output) = &mut *guard;
        interact(input, output, request)
    }
}

fn interact<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    request: &PromptRequest,
) -> Result<String, OAuth2Error> {
    writeln!(output, "{} \n{}", request.message, request.authorization_url)
        .and_then(|_| output.flush())
        .map_err(|e| abort(format!("unable to write prompt: {}", e)))?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| abort(format!("unable to read authorization code: {}", e)))?;

    if read == 0 {
        return Err(abort("input closed before an authorization code was entered"));
    }

    let answer = line.trim();
    if answer.is_empty() {
        return Err(abort("no authorization code entered"));
    }

    Ok(answer.to_string())
}

fn abort(reason: impl Into<String>) -> OAuth2Error {
    AuthorizationError::UserAbort {
        reason: reason.into(),
    }
    .into()
}

/// Scripted prompt for testing.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Result<String, OAuth2Error>>>,
    requests: Mutex<Vec<PromptRequest>>,
}

impl ScriptedPrompt {
    /// Create an empty script; unanswered prompts abort.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a script with one answer.
    pub fn answering(answer: impl Into<String>) -> Self {
        let prompt = Self::new();
        prompt.push_answer(answer);
        prompt
    }

    /// Queue an answer.
    pub fn push_answer(&self, answer: impl Into<String>) -> &Self {
        self.answers.lock().unwrap().push_back(Ok(answer.into()));
        self
    }

    /// Queue a failure.
    pub fn push_error(&self, error: OAuth2Error) -> &Self {
        self.answers.lock().unwrap().push_back(Err(error));
        self
    }

    /// Requests presented so far.
    pub fn get_requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl AuthorizationPrompt for ScriptedPrompt {
    fn prompt(&self, request: &PromptRequest) -> Result<String, OAuth2Error> {
        self.requests.lock().unwrap().push(request.clone());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(abort("script exhausted")))
    }
}
