//! In-process HTTP stand-in for the key-management proxy.
//!
//! Serves `/api/v1/public-key` and `/api/v1/sign` on a loopback port, one
//! request per connection, and records every request it sees.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use kms_csr_builder::adapters::remote::protocol::{
    ErrorResponse, GetPublicKeyRequest, GetPublicKeyResponse, SignMessageRequest,
    SignMessageResponse,
};
use kms_csr_builder::{KeyUsageType, SignerAlgorithm};

/// How the sign endpoint answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignReply {
    /// Echo the request nonce and algorithm.
    Faithful,
    /// Return a nonce the client never sent.
    WrongNonce,
    /// Claim a different signing algorithm than requested.
    WrongAlgorithm,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

struct ProxyState {
    public_key_der: Vec<u8>,
    signing_algorithms: Vec<String>,
    reply: SignReply,
    signature: Vec<u8>,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct MockProxy {
    base_url: String,
    state: Arc<ProxyState>,
}

impl MockProxy {
    /// Start serving `public_key_der` with the given algorithm names.
    pub fn start(public_key_der: Vec<u8>, signing_algorithms: &[&str], reply: SignReply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(ProxyState {
            public_key_der,
            signing_algorithms: signing_algorithms.iter().map(|s| s.to_string()).collect(),
            reply,
            signature: Self::signature(),
            requests: Mutex::new(Vec::new()),
        });

        let served = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(&served, stream);
            }
        });

        Self { base_url, state }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// The 256 bytes returned by every sign call.
    pub fn signature() -> Vec<u8> {
        (0..=255u8).collect()
    }
}

fn serve(state: &ProxyState, stream: TcpStream) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }
    let body = String::from_utf8_lossy(&body).into_owned();

    state.requests.lock().unwrap().push(RecordedRequest {
        path: path.clone(),
        authorization,
        body: body.clone(),
    });

    let (status, payload) = match path.as_str() {
        "/api/v1/public-key" => public_key(state, &body),
        "/api/v1/sign" => sign(state, &body),
        _ => (
            "404 Not Found",
            serde_json::to_string(&ErrorResponse::new("BAD_REQUEST", "unknown path")).unwrap(),
        ),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn public_key(state: &ProxyState, body: &str) -> (&'static str, String) {
    let request: GetPublicKeyRequest = serde_json::from_str(body).unwrap();
    let mut response = GetPublicKeyResponse::new(
        &request.key_id,
        &state.public_key_der,
        KeyUsageType::SignVerify,
        &[],
    );
    response.signing_algorithms = state.signing_algorithms.clone();
    ("200 OK", serde_json::to_string(&response).unwrap())
}

fn sign(state: &ProxyState, body: &str) -> (&'static str, String) {
    let request: SignMessageRequest = serde_json::from_str(body).unwrap();
    let mut algorithm = request.signing_algorithm;
    let mut nonce = request.nonce.clone();
    match state.reply {
        SignReply::Faithful => {}
        SignReply::WrongNonce => nonce = Some("AAAAAAAAAAAAAAAAAAAAAA==".to_string()),
        SignReply::WrongAlgorithm => {
            algorithm = if algorithm == SignerAlgorithm::RsassaPssSha256 {
                SignerAlgorithm::RsassaPkcs1V15Sha256
            } else {
                SignerAlgorithm::RsassaPssSha256
            };
        }
    }
    let response =
        SignMessageResponse::new(&request.key_id, &state.signature, algorithm, nonce);
    ("200 OK", serde_json::to_string(&response).unwrap())
}
