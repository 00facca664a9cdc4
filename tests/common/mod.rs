//! Local fixtures shared by the integration tests: a UDP DNS server, plain
//! and TLS HTTP origins, and a CONNECT proxy. Everything binds to loopback.

#![allow(dead_code)]

use boring::asn1::Asn1Time;
use boring::bn::{BigNum, MsbOption};
use boring::hash::MessageDigest;
use boring::pkey::PKey;
use boring::rsa::Rsa;
use boring::ssl::{NameType, SslAcceptor, SslMethod};
use boring::x509::{X509NameBuilder, X509};
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};

use forcedns::dns::ResolverConfig;

/// How the fixture DNS server answers a query.
#[derive(Debug, Clone)]
pub enum Answer {
    /// NOERROR with these A records, in order.
    Records(Vec<Ipv4Addr>),
    /// NOERROR with an empty answer section.
    Empty,
    NxDomain,
    ServFail,
    /// Never reply.
    Silent,
}

/// UDP DNS server answering from a per-name callback.
pub struct DnsServer {
    pub addr: SocketAddr,
    /// Query names seen, without the trailing dot.
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl DnsServer {
    pub async fn start<F>(answer: F) -> Self
    where
        F: Fn(&str) -> Answer + Send + Sync + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let queries = Arc::new(Mutex::new(Vec::new()));
        let seen = queries.clone();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                let Ok(request) = Message::from_vec(&buf[..len]) else {
                    continue;
                };
                let Some(query) = request.queries().first().cloned() else {
                    continue;
                };
                let name = query.name().to_utf8();
                let name = name.trim_end_matches('.').to_string();
                seen.lock().unwrap().push(name.clone());

                let mut response = Message::new();
                response
                    .set_id(request.id())
                    .set_message_type(MessageType::Response)
                    .set_op_code(OpCode::Query)
                    .set_recursion_desired(request.recursion_desired())
                    .set_recursion_available(true)
                    .add_query(query.clone());

                match answer(&name) {
                    Answer::Records(ips) => {
                        for ip in ips {
                            response.add_answer(Record::from_rdata(
                                query.name().clone(),
                                60,
                                RData::A(A(ip)),
                            ));
                        }
                    }
                    Answer::Empty => {}
                    Answer::NxDomain => {
                        response.set_response_code(ResponseCode::NXDomain);
                    }
                    Answer::ServFail => {
                        response.set_response_code(ResponseCode::ServFail);
                    }
                    Answer::Silent => continue,
                }

                if let Ok(bytes) = response.to_vec() {
                    let _ = socket.send_to(&bytes, peer).await;
                }
            }
        });

        Self { addr, queries }
    }

    /// Answers every name with 127.0.0.1.
    pub async fn loopback() -> Self {
        Self::start(|_| Answer::Records(vec![Ipv4Addr::LOCALHOST])).await
    }

    /// Resolver configuration pointing only at this server.
    pub fn config(&self) -> ResolverConfig {
        ResolverConfig::new([self.addr])
            .unwrap()
            .with_timeout(Duration::from_millis(300))
            .with_attempts(1)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// Minimal HTTP/1.1 origin that answers every request with `body`.
pub struct HttpServer {
    pub addr: SocketAddr,
    /// Request heads received, one per request.
    pub requests: Arc<Mutex<Vec<String>>>,
    /// SNI each TLS client sent (`None` when absent). Empty for plain HTTP.
    pub server_names: Arc<Mutex<Vec<Option<String>>>>,
}

impl HttpServer {
    pub async fn plain(body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Self::new(&listener);
        let requests = server.requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let requests = requests.clone();
                tokio::spawn(serve_http(stream, body, requests));
            }
        });
        server
    }

    /// TLS origin with a self-signed certificate for `cert_name`.
    pub async fn tls(cert_name: &str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Self::new(&listener);
        let requests = server.requests.clone();
        let server_names = server.server_names.clone();
        let acceptor = Arc::new(self_signed_acceptor(cert_name));

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let acceptor = acceptor.clone();
                let requests = requests.clone();
                let server_names = server_names.clone();
                tokio::spawn(async move {
                    let Ok(tls) = tokio_boring::accept(&acceptor, stream).await else {
                        return;
                    };
                    let sni = tls.ssl().servername(NameType::HOST_NAME).map(str::to_string);
                    server_names.lock().unwrap().push(sni);
                    serve_http(tls, body, requests).await;
                });
            }
        });
        server
    }

    fn new(listener: &TcpListener) -> Self {
        Self {
            addr: listener.local_addr().unwrap(),
            requests: Arc::new(Mutex::new(Vec::new())),
            server_names: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn server_names(&self) -> Vec<Option<String>> {
        self.server_names.lock().unwrap().clone()
    }
}

async fn serve_http<S>(mut stream: S, body: &'static str, requests: Arc<Mutex<Vec<String>>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(head) = read_head(&mut stream).await else {
        return;
    };
    requests.lock().unwrap().push(head);

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Send a bare `GET /` on an established stream and read until close.
pub async fn fetch_over<S>(mut stream: S, host: &str) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", host);
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

/// Read up to and including the blank line ending an HTTP head.
pub async fn read_head<S>(stream: &mut S) -> Option<String>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte).await {
            Ok(1) => head.push(byte[0]),
            _ => return None,
        }
    }
    String::from_utf8(head).ok()
}

fn self_signed_acceptor(cert_name: &str) -> SslAcceptor {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cert_name).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut cert = X509::builder().unwrap();
    cert.set_version(2).unwrap();
    cert.set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    cert.set_subject_name(&name).unwrap();
    cert.set_issuer_name(&name).unwrap();
    cert.set_pubkey(&pkey).unwrap();
    cert.set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    cert.set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    cert.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = cert.build();

    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pkey).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    acceptor.check_private_key().unwrap();
    acceptor.build()
}

/// CONNECT proxy that tunnels every request to `upstream`, whatever target
/// the client names, or refuses with `407` when `reject` is set.
pub struct ConnectProxy {
    pub addr: SocketAddr,
    /// CONNECT request heads received.
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl ConnectProxy {
    pub async fn start(upstream: SocketAddr) -> Self {
        Self::spawn(Some(upstream)).await
    }

    pub async fn rejecting() -> Self {
        Self::spawn(None).await
    }

    async fn spawn(upstream: Option<SocketAddr>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut client, _)) = listener.accept().await else {
                    return;
                };
                let seen = seen.clone();
                tokio::spawn(async move {
                    let Some(head) = read_head(&mut client).await else {
                        return;
                    };
                    seen.lock().unwrap().push(head);

                    let Some(upstream) = upstream else {
                        let _ = client
                            .write_all(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
                            .await;
                        return;
                    };
                    let Ok(mut server) = TcpStream::connect(upstream).await else {
                        let _ = client.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
                        return;
                    };
                    if client
                        .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                        .await
                        .is_err()
                    {
                        return;
                    }
                    let _ = tokio::io::copy_bidirectional(&mut client, &mut server).await;
                });
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}
