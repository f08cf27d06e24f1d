//! Chunk text to `StreamChunk` objects.
//!
//! A decoded chunk may hold one JSON object, several newline-separated
//! objects (Ollama), several objects back to back with no separator, or the
//! front half of an object whose rest arrives in the next chunk. Complete
//! objects are returned in order. What happens to an unparsable remainder
//! depends on the [`FragmentPolicy`].

use aidash_types::stream::{FragmentPolicy, StreamChunk};

/// Upper bound on text carried between chunks under `Reassemble`.
const MAX_CARRY_BYTES: usize = 1024 * 1024;

/// Objects parsed from one chunk.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedChunks {
    pub chunks: Vec<StreamChunk>,
    /// Number of unparsable fragments discarded by this call.
    pub dropped: u64,
}

/// Stateful parser for a single stream.
#[derive(Debug)]
pub struct ChunkParser {
    policy: FragmentPolicy,
    carry: String,
}

impl ChunkParser {
    pub fn new(policy: FragmentPolicy) -> Self {
        Self {
            policy,
            carry: String::new(),
        }
    }

    /// Parse every complete object in `text`.
    ///
    /// An unparsable fragment is discarded and counted, and parsing resumes
    /// at the next line so later objects in the same chunk survive. Under
    /// `Reassemble` a trailing fragment that is merely truncated is kept and
    /// prepended to the next call instead.
    pub fn feed(&mut self, text: &str) -> ParsedChunks {
        let input = match self.policy {
            FragmentPolicy::Drop => text.to_string(),
            FragmentPolicy::Reassemble => {
                let mut joined = std::mem::take(&mut self.carry);
                joined.push_str(text);
                joined
            }
        };

        let mut parsed = ParsedChunks::default();
        let mut rest = input.as_str();

        loop {
            let mut objects = serde_json::Deserializer::from_str(rest).into_iter::<StreamChunk>();
            let mut consumed = 0;
            let mut truncated = false;

            loop {
                match objects.next() {
                    Some(Ok(chunk)) => {
                        parsed.chunks.push(chunk);
                        consumed = objects.byte_offset();
                    }
                    Some(Err(e)) => {
                        truncated = e.is_eof();
                        break;
                    }
                    None => {
                        consumed = rest.len();
                        break;
                    }
                }
            }

            let fragment = rest[consumed..].trim_start();
            if fragment.trim_end().is_empty() {
                return parsed;
            }

            let keep = self.policy == FragmentPolicy::Reassemble
                && truncated
                && fragment.len() <= MAX_CARRY_BYTES;
            if keep {
                self.carry = fragment.to_string();
                return parsed;
            }

            parsed.dropped += 1;
            match fragment.split_once('\n') {
                Some((bad, next)) => {
                    tracing::debug!(bytes = bad.len(), "skipping unparsable stream line");
                    rest = next;
                }
                None => {
                    tracing::debug!(bytes = fragment.len(), "dropping unparsable stream fragment");
                    return parsed;
                }
            }
        }
    }

    /// End of stream: anything still carried can never complete.
    ///
    /// Returns the number of fragments discarded (0 or 1).
    pub fn finish(&mut self) -> u64 {
        if self.carry.trim().is_empty() {
            self.carry.clear();
            return 0;
        }
        tracing::debug!(bytes = self.carry.len(), "discarding incomplete trailing fragment");
        self.carry.clear();
        1
    }
}
