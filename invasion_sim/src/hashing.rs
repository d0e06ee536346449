use std::hash::Hasher;

/// A deterministic FNV-1a 64-bit hasher.
///
/// `DefaultHasher` is randomized per process, so it cannot be used to derive
/// reproducible RNG streams or snapshot fingerprints.
#[derive(Debug)]
pub struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Derive an independent seed for one consumer of randomness (`"placement"`,
/// `"driver"`, ...) from the run seed.
pub fn stream_seed(seed: u64, stream: &str) -> u64 {
    let mut hasher = FnvHasher::new();
    hasher.write_u64(seed);
    hasher.write(stream.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_matches_reference_vector() {
        let mut hasher = FnvHasher::new();
        hasher.write(b"a");
        assert_eq!(hasher.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn streams_are_stable_and_distinct() {
        assert_eq!(stream_seed(7, "driver"), stream_seed(7, "driver"));
        assert_ne!(stream_seed(7, "driver"), stream_seed(7, "placement"));
        assert_ne!(stream_seed(7, "driver"), stream_seed(8, "driver"));
    }
}
