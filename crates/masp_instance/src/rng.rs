use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Odd multiplier spreading job indices across the seed space.
const STREAM_DERIVATION_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministic RNG for reproducible instances.
pub fn seeded_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// System-seeded RNG; successive runs differ.
pub fn entropy_rng() -> ChaCha12Rng {
    ChaCha12Rng::from_entropy()
}

/// Independent stream for job `stream` of a run seeded with `base_seed`.
pub fn derive_rng(base_seed: u64, stream: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(base_seed.wrapping_add(stream.wrapping_mul(STREAM_DERIVATION_PRIME)))
}
