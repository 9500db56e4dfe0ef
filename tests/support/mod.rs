// Throwaway HTTP server for driving the client flows in tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chat_cli::api::ApiClient;
use chat_cli::config::Config;
use chat_cli::ui::{LinePrompt, Prompt};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub struct FakeServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeServer {
    /// Serve every request with `(status, body)` from `responder`.
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let Ok(req) = read_request(&stream) else { continue };
                log.lock().unwrap().push(req.clone());
                let (status, body) = responder(&req);
                let _ = write_response(stream, status, &body);
            }
        });

        FakeServer { url, requests }
    }

    /// Accept connections and never answer them.
    pub fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
                thread::sleep(Duration::from_millis(10));
            }
        });
        FakeServer { url, requests: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> Config {
        Config::new(&self.url, Duration::from_secs(5))
    }

    /// Client for this server, already holding `token`.
    pub fn client_with_token(&self, token: &str) -> ApiClient {
        let mut api = ApiClient::new(&self.config()).unwrap();
        api.set_token(token);
        api
    }
}

/// Base URL of a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Prompt answering from `input`, one line per prompt.
pub fn scripted(input: &str) -> LinePrompt<Cursor<String>, io::Sink> {
    LinePrompt::new(Cursor::new(input.to_string()), io::sink())
}

/// Prompt replaying canned results, including errors such as Ctrl+C.
/// Runs dry as end of input.
pub struct Replies(VecDeque<io::Result<String>>);

impl Replies {
    pub fn new(replies: Vec<io::Result<String>>) -> Self {
        Replies(replies.into())
    }
}

impl Prompt for Replies {
    fn input(&mut self, _prompt: &str) -> io::Result<String> {
        self.0
            .pop_front()
            .unwrap_or_else(|| Err(io::Error::from(io::ErrorKind::UnexpectedEof)))
    }
}

/// What a terminal prompt reports on Ctrl+C.
pub fn interrupted() -> io::Result<String> {
    Err(io::Error::from(io::ErrorKind::Interrupted))
}

pub fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

fn read_request(stream: &TcpStream) -> io::Result<Recorded> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        reader.read_line(&mut header)?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((k, v)) = header.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let len = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; len];
    reader.read_exact(&mut body)?;

    Ok(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn write_response(mut stream: TcpStream, status: u16, body: &str) -> io::Result<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    write!(
        stream,
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    )?;
    stream.flush()
}
