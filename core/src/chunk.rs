//! Chunked output: split long replies on word boundaries so each piece
//! fits the transport's per-message limit.


/// Split `text` into whitespace-token chunks of at most `max_size` bytes.
///
/// Tokens are packed greedily in order; a token that would push the current
/// chunk (plus one separating space) past `max_size` starts a new chunk.
/// Joining the result with single spaces yields the token sequence of
/// `text`. A single token longer than `max_size` is emitted on its own,
/// oversized, rather than cut. Blank input yields no chunks.
pub fn chunk(text: &str, max_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for token in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(token);
        } else if current.len() + 1 + token.len() <= max_size {
            current.push(' ');
            current.push_str(token);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(token);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
