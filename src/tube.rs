// Line-oriented byte streams to challenge services, and a padding oracle
// that runs over one.
use crate::bytes::parse_int;
use crate::padding_oracle::PaddingOracle;
use crate::Result;

use num_bigint::BigInt;
use tracing::{debug, info};

use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub trait Tube {
    /// Reads at most `max` bytes. An empty buffer means the peer hung up.
    fn recv(&mut self, max: usize) -> Result<Vec<u8>>;

    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Reads up to and including `term`.
    fn recv_until(&mut self, term: &[u8]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        while !buf.ends_with(term) {
            let chunk = self.recv(1)?;
            if chunk.is_empty() {
                return Err(unexpected_eof(term).into());
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }

    fn recv_line(&mut self) -> Result<Vec<u8>> {
        self.recv_until(b"\n")
    }

    fn recv_line_after(&mut self, term: &[u8]) -> Result<Vec<u8>> {
        self.recv_until(term)?;
        self.recv_line()
    }

    /// Reads a `name = value` or `name: value` line and parses the value.
    fn recv_int(&mut self) -> Result<BigInt> {
        let line = self.recv_line()?;
        let line = String::from_utf8_lossy(&line);
        let value = line
            .split_once(['=', ':'])
            .map_or(&*line, |(_, value)| value);
        parse_int(value)
    }

    /// Reads a line of hex, such as a ciphertext printed by the service.
    fn recv_hex_line(&mut self) -> Result<Vec<u8>> {
        let line = self.recv_line()?;
        Ok(hex::decode(line.trim_ascii())?)
    }

    fn send_line(&mut self, data: &[u8]) -> Result<()> {
        self.send(&[data, b"\n"].concat())
    }

    /// Waits for `term`, then sends. Returns what was read.
    fn send_after(&mut self, term: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let received = self.recv_until(term)?;
        self.send(data)?;
        Ok(received)
    }

    fn send_line_after(&mut self, term: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let received = self.recv_until(term)?;
        self.send_line(data)?;
        Ok(received)
    }
}

fn unexpected_eof(term: &[u8]) -> io::Error {
    io::Error::new(
        ErrorKind::UnexpectedEof,
        format!("connection closed before {:?}", String::from_utf8_lossy(term)),
    )
}

/// A TCP connection with a read timeout.
pub struct Remote {
    reader: BufReader<TcpStream>,
}

impl Remote {
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(timeout))?;
        info!(peer = %stream.peer_addr()?, "connected");
        Ok(Self {
            reader: BufReader::new(stream),
        })
    }
}

impl Tube for Remote {
    fn recv(&mut self, max: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; max];
        let n = self.reader.read(&mut buf)?;
        buf.truncate(n);
        debug!(data = %String::from_utf8_lossy(&buf), "recv");
        Ok(buf)
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        debug!(data = %String::from_utf8_lossy(data), "send");
        let stream = self.reader.get_mut();
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }

    fn recv_until(&mut self, term: &[u8]) -> Result<Vec<u8>> {
        let Some(&last) = term.last() else {
            return Ok(Vec::new());
        };
        let mut buf = Vec::new();
        while !buf.ends_with(term) {
            if self.reader.read_until(last, &mut buf)? == 0 {
                return Err(unexpected_eof(term).into());
            }
        }
        debug!(data = %String::from_utf8_lossy(&buf), "recv");
        Ok(buf)
    }
}

/// Padding oracle served line by line: after the prompt the service reads
/// a hex encoded ciphertext and answers with one line, `accept` meaning
/// valid padding.
pub struct RemotePaddingOracle<T> {
    tube: T,
    prompt: Vec<u8>,
    accept: Vec<u8>,
}

impl<T: Tube> RemotePaddingOracle<T> {
    pub fn new(tube: T) -> Self {
        Self::with_protocol(tube, b"> ", b"ok")
    }

    pub fn with_protocol(tube: T, prompt: &[u8], accept: &[u8]) -> Self {
        Self {
            tube,
            prompt: prompt.to_vec(),
            accept: accept.to_vec(),
        }
    }

    pub fn into_inner(self) -> T {
        self.tube
    }
}

impl<T: Tube> PaddingOracle for RemotePaddingOracle<T> {
    fn query(&mut self, msg: &[u8]) -> Result<bool> {
        self.tube
            .send_line_after(&self.prompt, hex::encode(msg).as_bytes())?;
        let reply = self.tube.recv_line()?;
        Ok(reply.trim_ascii() == self.accept.as_slice())
    }
}
