//! Transport capabilities: the encryption transform and the outbound sink
//! are external; this module only fixes their interfaces and the order in
//! which chunks are handed to them.

use std::io::{self, Write};

use crate::chunk::chunk;

/// Prefixes marking an inbound line as ciphertext.
const CIPHER_PREFIXES: [&str; 2] = ["+OK ", "mcps "];


/// A byte-level encrypt/decrypt transform with a bounded plaintext size.
pub trait Cipher {
    fn encrypt(&self, plaintext: &str) -> String;
    fn decrypt(&self, ciphertext: &str) -> String;
    /// Largest plaintext the transform accepts in one call, in bytes.
    fn max_plaintext(&self) -> usize;
}


/// Identity transform for unencrypted channels and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plaintext;

impl Cipher for Plaintext {
    fn encrypt(&self, plaintext: &str) -> String {
        plaintext.to_string()
    }

    fn decrypt(&self, ciphertext: &str) -> String {
        ciphertext.to_string()
    }

    fn max_plaintext(&self) -> usize {
        usize::MAX
    }
}


/// Where encrypted chunks go, one call per transport message.
pub trait Sink {
    fn send(&mut self, message: &str) -> io::Result<()>;
}

/// Writes each message as its own line.
pub struct LineSink<W: Write> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        LineSink { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for LineSink<W> {
    fn send(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", message)?;
        self.out.flush()
    }
}


/// Decode an inbound line: strip a ciphertext prefix and decrypt, or pass
/// plaintext through untouched.
pub fn decode_inbound(cipher: &dyn Cipher, line: &str) -> String {
    for prefix in CIPHER_PREFIXES {
        if let Some(body) = line.strip_prefix(prefix) {
            return cipher.decrypt(body);
        }
    }
    line.to_string()
}


/// Chunks reply lines to the transport limit, encrypts each chunk and hands
/// them to the sink in order.
pub struct Outbox<'a> {
    cipher: &'a dyn Cipher,
    max_message_size: usize,
}

impl<'a> Outbox<'a> {
    pub fn new(cipher: &'a dyn Cipher, max_message_size: usize) -> Self {
        Outbox {
            cipher,
            max_message_size: max_message_size.min(cipher.max_plaintext()),
        }
    }

    pub fn chunk_limit(&self) -> usize {
        self.max_message_size
    }

    /// Deliver every line of a reply. Returns the number of messages sent.
    pub fn deliver(&self, lines: &[String], sink: &mut dyn Sink) -> io::Result<usize> {
        let mut sent = 0;
        for line in lines {
            for piece in chunk(line, self.max_message_size) {
                sink.send(&self.cipher.encrypt(&piece))?;
                sent += 1;
            }
        }
        Ok(sent)
    }
}
