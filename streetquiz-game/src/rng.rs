//! Deterministic random streams for a game session.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand::rngs::SmallRng;
use sha2::Sha256;

/// One named random stream of a session. Counts the calls made against it so
/// simulated rounds can report how much randomness they consumed.
#[derive(Debug, Clone)]
pub struct SessionStream {
    tag: &'static str,
    rng: SmallRng,
    calls: u64,
}

impl SessionStream {
    fn derive(user_seed: u64, tag: &'static str) -> Self {
        Self {
            tag,
            rng: SmallRng::seed_from_u64(derive_stream_seed(user_seed, tag.as_bytes())),
            calls: 0,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> &'static str {
        self.tag
    }

    #[must_use]
    pub const fn calls(&self) -> u64 {
        self.calls
    }

    fn tick(&mut self) -> &mut SmallRng {
        self.calls = self.calls.saturating_add(1);
        &mut self.rng
    }
}

impl RngCore for SessionStream {
    fn next_u32(&mut self) -> u32 {
        self.tick().next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.tick().next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.tick().fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Independent streams for street draws and presentation shuffles, so that
/// changing how a round is shuffled never changes which streets are drawn.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    draw: SessionStream,
    shuffle: SessionStream,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            draw: SessionStream::derive(seed, "draw"),
            shuffle: SessionStream::derive(seed, "shuffle"),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used for weighted street draws.
    pub const fn draw(&mut self) -> &mut SessionStream {
        &mut self.draw
    }

    /// Stream used to shuffle presentation order.
    pub const fn shuffle(&mut self) -> &mut SessionStream {
        &mut self.shuffle
    }

    /// Calls made against both streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.draw.calls().saturating_add(self.shuffle.calls())
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        // HMAC accepts keys of any length.
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
