// Library root
// ------------
// A small interactive chat client. The binary (`main.rs`) only sets up
// logging and configuration and then hands off to `ui::run`.
//
// Module responsibilities:
// - `config`: base URL and timeouts from the environment.
// - `api`: blocking HTTP calls (login, send, list) and the session token.
// - `models`: message records, response shapes and input validation.
// - `error`: HTTP failure taxonomy and the text shown for each class.
// - `realtime`: Socket.IO listener printing pushed message events.
// - `ui`: prompts, the login step and the command loop.
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod realtime;
pub mod ui;
