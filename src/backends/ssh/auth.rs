//! SSH connection establishment and authentication.
//!
//! Provides [`connect_and_authenticate()`] for producing an authenticated
//! `ssh2::Session`, trying password authentication first and falling back
//! to keyboard-interactive. A keyboard-interactive challenge is answered
//! either by replaying one pre-collected response for every prompt, or by
//! relaying the prompts to an [`InteractiveAuth`] handler that blocks the
//! connect call until the user answers or cancels.

use std::net::TcpStream;

use tracing::{debug, warn};

use super::SshSettings;
use crate::errors::ConnectError;

/// One prompt of a keyboard-interactive challenge.
#[derive(Debug, Clone)]
pub struct AuthPrompt {
    /// Prompt text as sent by the server (e.g., `"Verification code: "`).
    pub text: String,
    /// Whether the user's input may be echoed on screen.
    pub echo: bool,
}

/// Synchronous relay for keyboard-interactive challenges whose prompts are
/// not known in advance.
///
/// `answer()` runs on the thread performing the connect and must block
/// until the user has responded. Returning `None` cancels authentication.
pub trait InteractiveAuth: Send {
    /// Return exactly one response string per prompt, or `None` to cancel.
    fn answer(&self, instructions: &str, prompts: &[AuthPrompt]) -> Option<Vec<String>>;
}

/// Replays a single pre-collected response for every prompt in a
/// challenge. This is the simple path: the response is collected at
/// form-fill time, no per-prompt dialog.
struct ReplayPrompter<'a> {
    response: &'a str,
}

impl ssh2::KeyboardInteractivePrompt for ReplayPrompter<'_> {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        debug!("answering {} keyboard-interactive prompt(s)", prompts.len());
        prompts.iter().map(|_| self.response.to_string()).collect()
    }
}

/// Relays challenges to an [`InteractiveAuth`] handler.
struct RelayPrompter<'a> {
    handler: &'a dyn InteractiveAuth,
    canceled: bool,
}

impl ssh2::KeyboardInteractivePrompt for RelayPrompter<'_> {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        let relayed: Vec<AuthPrompt> = prompts
            .iter()
            .map(|p| AuthPrompt {
                text: p.text.to_string(),
                echo: p.echo,
            })
            .collect();
        match self.handler.answer(instructions, &relayed) {
            Some(responses) => responses,
            None => {
                self.canceled = true;
                Vec::new()
            }
        }
    }
}

/// Connect to an SSH server, perform the handshake, and authenticate.
///
/// Authentication order follows the connector's preference: password (when
/// one was supplied), then keyboard-interactive. The keyboard-interactive
/// responder is the replay prompter when a pre-collected response exists,
/// otherwise the optional interactive handler.
///
/// Returns an authenticated `Session` in blocking mode.
pub fn connect_and_authenticate(
    settings: &SshSettings,
    interactive: Option<&dyn InteractiveAuth>,
) -> Result<ssh2::Session, ConnectError> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let tcp = TcpStream::connect(&addr)
        .map_err(|e| ConnectError::Unreachable(format!("{addr}: {e}")))?;

    let mut session =
        ssh2::Session::new().map_err(|e| ConnectError::Handshake(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| ConnectError::Handshake(e.to_string()))?;

    let username = settings.user.as_str();

    if let Some(password) = settings.password.as_deref().filter(|p| !p.is_empty()) {
        if let Err(e) = session.userauth_password(username, password) {
            debug!("password auth failed: {e}");
        }
    }

    if !session.authenticated() {
        if let Some(response) = settings.kbd_response.as_deref().filter(|r| !r.is_empty()) {
            let mut prompter = ReplayPrompter { response };
            if let Err(e) = session.userauth_keyboard_interactive(username, &mut prompter) {
                debug!("keyboard-interactive auth failed: {e}");
            }
        } else if let Some(handler) = interactive {
            let mut prompter = RelayPrompter {
                handler,
                canceled: false,
            };
            let result = session.userauth_keyboard_interactive(username, &mut prompter);
            if prompter.canceled {
                return Err(ConnectError::Canceled);
            }
            if let Err(e) = result {
                debug!("keyboard-interactive auth failed: {e}");
            }
        }
    }

    if !session.authenticated() {
        warn!("all authentication methods exhausted for {username}@{addr}");
        return Err(ConnectError::Auth(format!("{username}@{addr}")));
    }

    Ok(session)
}
