use crate::random::key::{key_at, RandomKey};

/// Sequential source of random keys.
///
/// The stream stores only its seed and how many keys it has handed out;
/// the n-th key is `key_at(seed, n)`. Re-creating a stream with the same
/// seed replays exactly the same keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomStream {
    seed: u64,
    draws: u64,
}

impl RandomStream {
    pub fn new(seed: u64) -> RandomStream {
        RandomStream { seed, draws: 0 }
    }

    /// Returns the next key and advances the stream by one.
    pub fn next_key(&mut self) -> RandomKey {
        let key = key_at(self.seed, self.draws);
        self.draws += 1;
        key
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of keys drawn so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Iterator for RandomStream {
    type Item = RandomKey;

    fn next(&mut self) -> Option<RandomKey> {
        Some(self.next_key())
    }
}
