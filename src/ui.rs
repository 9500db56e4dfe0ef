// UI layer: prompts, the login step and the command loop. Every flow writes
// to a `Write` sink and reads through a `Prompt`, so the same code runs
// against the terminal and against scripted input in tests.

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::validate_text;
use crate::realtime::{EventHandlers, Listener, ListenerHandle};
use anyhow::{Context, Result};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

/// Source of user input, one line per prompt.
///
/// End of input is reported as `UnexpectedEof`; Ctrl+C while a terminal
/// prompt is active is reported as `Interrupted`.
pub trait Prompt {
    fn input(&mut self, prompt: &str) -> io::Result<String>;
}

/// Interactive prompt on the terminal, via `dialoguer`.
#[derive(Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        Input::<String>::new().with_prompt(prompt).allow_empty(true).interact_text()
    }
}

/// Plain line reader, used when stdin is not a terminal (pipes, tests).
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        LinePrompt { reader, writer }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.writer, "{}: ", prompt)?;
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input"));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

/// Pick the prompt matching how stdin is attached.
pub fn stdin_prompt() -> Box<dyn Prompt> {
    if io::stdin().is_terminal() {
        Box::new(TerminalPrompt)
    } else {
        Box::new(LinePrompt::new(io::BufReader::new(io::stdin()), io::stdout()))
    }
}

impl<P: Prompt + ?Sized> Prompt for Box<P> {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        (**self).input(prompt)
    }
}

/// How the command loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Quit,
    Interrupted,
    EndOfInput,
}

/// Spinner on stderr while a request is in flight; hidden when stderr is
/// not a terminal.
fn spinner(msg: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn report<W: Write>(out: &mut W, err: &ApiError, action: &str) -> io::Result<()> {
    for line in err.user_lines(action) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

/// Prompt for a username and exchange it for a token. Returns false when
/// login failed; the reason has already been printed.
pub fn login<P: Prompt, W: Write>(api: &mut ApiClient, prompt: &mut P, out: &mut W) -> io::Result<bool> {
    let username = match prompt.input("Enter username") {
        Ok(name) => name,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => String::new(),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => {
            writeln!(out, "\nExiting...")?;
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    if username.trim().is_empty() {
        writeln!(out, "Username cannot be empty")?;
        return Ok(false);
    }

    let pb = spinner("Logging in...");
    let result = api.login(&username);
    pb.finish_and_clear();

    match result {
        Ok(Some(token)) => {
            api.set_token(&token);
            info!(%username, "logged in");
            writeln!(out, "Login successful!")?;
            Ok(true)
        }
        Ok(None) => {
            writeln!(out, "Error: No token received from server")?;
            Ok(false)
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            match &e {
                // no server detail at login, just the status line
                ApiError::Status { .. } => writeln!(out, "Error during login: {}", e)?,
                _ => report(out, &e, "during login")?,
            }
            Ok(false)
        }
    }
}

/// `send`: read one line and post it.
pub fn send<P: Prompt, W: Write>(api: &ApiClient, prompt: &mut P, out: &mut W) -> io::Result<()> {
    let text = prompt.input("Message")?;
    if let Err(e) = validate_text(&text) {
        writeln!(out, "{}", e)?;
        return Ok(());
    }

    let pb = spinner("Sending...");
    let result = api.send_message(&text);
    pb.finish_and_clear();

    match result {
        Ok(sent) => writeln!(out, "Sent: {}", sent.text.as_deref().unwrap_or("N/A")),
        Err(e) => {
            warn!(error = %e, "send failed");
            report(out, &e, "sending message")
        }
    }
}

/// `list`: print the most recent page of messages.
pub fn list<W: Write>(api: &ApiClient, out: &mut W) -> io::Result<()> {
    let pb = spinner("Loading messages...");
    let result = api.list_messages();
    pb.finish_and_clear();

    match result {
        Ok(messages) if messages.is_empty() => writeln!(out, "No messages found"),
        Ok(messages) => {
            for msg in &messages {
                writeln!(out, "{}", msg.listing_line())?;
            }
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "list failed");
            report(out, &e, "listing messages")
        }
    }
}

/// Read-dispatch-print until `quit`, Ctrl+C or end of input.
pub fn command_loop<P: Prompt, W: Write>(api: &ApiClient, prompt: &mut P, out: &mut W) -> io::Result<LoopExit> {
    loop {
        let result = prompt
            .input("Command (list/send/quit)")
            .and_then(|cmd| match cmd.as_str() {
                "list" => list(api, out).map(|_| None),
                "send" => send(api, prompt, out).map(|_| None),
                "quit" => Ok(Some(LoopExit::Quit)),
                _ => writeln!(out, "Unknown command. Use 'list', 'send', or 'quit'").map(|_| None),
            });
        match result {
            Ok(None) => {}
            Ok(Some(exit)) => return Ok(exit),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                writeln!(out, "\nExiting...")?;
                return Ok(LoopExit::Interrupted);
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(LoopExit::EndOfInput),
            Err(e) => return Err(e),
        }
    }
}

/// Try to start the real-time listener. Failure only costs live updates.
pub fn connect_listener<W: Write>(
    base_url: &str,
    timeout: Duration,
    handlers: EventHandlers,
    out: &mut W,
) -> io::Result<Option<Listener>> {
    match Listener::connect(base_url, timeout, handlers) {
        Ok(listener) => Ok(Some(listener)),
        Err(e) => {
            warn!(error = %e, "realtime listener unavailable");
            writeln!(out, "Warning: Could not connect to WebSocket: {}", e)?;
            writeln!(out, "Continuing without real-time updates...")?;
            Ok(None)
        }
    }
}

/// Ctrl+C outside a terminal prompt (e.g. while a request is in flight or
/// when input is piped): say goodbye, close the listener and exit cleanly.
fn install_interrupt_handler(listener: Option<ListenerHandle>) -> Result<()> {
    ctrlc::set_handler(move || {
        println!("\nExiting...");
        if let Some(handle) = &listener {
            handle.close();
        }
        std::process::exit(0);
    })
    .context("Failed to set Ctrl+C handler")
}

/// Whole session: login, listener, command loop, cleanup.
pub fn run(config: &Config) -> Result<ExitCode> {
    let mut api = ApiClient::new(config)?;
    let mut prompt = stdin_prompt();
    let mut out = io::stdout();

    if !login(&mut api, &mut prompt, &mut out)? {
        return Ok(ExitCode::FAILURE);
    }

    let listener = connect_listener(&config.api_url, config.connect_timeout, EventHandlers::printing(), &mut out)?;
    install_interrupt_handler(listener.as_ref().map(Listener::handle))?;

    let result = command_loop(&api, &mut prompt, &mut out);

    if let Some(listener) = listener {
        listener.close();
    }
    let exit = result.context("Failed to read command")?;
    info!(?exit, "session ended");
    Ok(ExitCode::SUCCESS)
}
