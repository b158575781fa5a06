use crate::domain::model::{QuoteReference, QuoteRequest};
use crate::domain::ports::{Clock, QuoteSubmitter, SystemClock};
use crate::utils::error::Result;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

pub const DEFAULT_REFERENCE_PREFIX: &str = "MOT";

/// `PREFIX-NNNN-YYYY`, with NNNN drawn uniformly from 0..10000. Display-only.
pub fn generate_reference<R: Rng + ?Sized>(rng: &mut R, prefix: &str, year: i32) -> QuoteReference {
    let number: u32 = rng.gen_range(0..10_000);
    QuoteReference(format!("{}-{:04}-{}", prefix, number, year))
}

/// Stands in for the quote backend: waits, then accepts every request.
pub struct SimulatedSubmitter<C: Clock = SystemClock> {
    delay: Duration,
    prefix: String,
    clock: C,
}

impl SimulatedSubmitter<SystemClock> {
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, SystemClock)
    }
}

impl<C: Clock> SimulatedSubmitter<C> {
    pub fn with_clock(delay: Duration, clock: C) -> Self {
        Self {
            delay,
            prefix: DEFAULT_REFERENCE_PREFIX.to_string(),
            clock,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[async_trait]
impl<C: Clock> QuoteSubmitter for SimulatedSubmitter<C> {
    async fn submit(&self, request: &QuoteRequest) -> Result<QuoteReference> {
        tracing::debug!(
            "Simulating submission of {} quote ({} -> {}), waiting {:?}",
            request.service.title,
            request.pickup.address,
            request.dropoff.address,
            self.delay
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reference = generate_reference(&mut rand::thread_rng(), &self.prefix, self.clock.current_year());
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    #[test]
    fn test_reference_format() {
        let pattern = Regex::new(r"^MOT-\d{4}-2026$").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let reference = generate_reference(&mut rng, "MOT", 2026);
            assert!(pattern.is_match(&reference.0), "bad reference {}", reference);
        }
    }

    #[test]
    fn test_reference_is_zero_padded() {
        struct Zero;
        impl rand::RngCore for Zero {
            fn next_u32(&mut self) -> u32 {
                0
            }
            fn next_u64(&mut self) -> u64 {
                0
            }
            fn fill_bytes(&mut self, dest: &mut [u8]) {
                dest.fill(0);
            }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                dest.fill(0);
                Ok(())
            }
        }
        assert_eq!(generate_reference(&mut Zero, "MOT", 2026).0, "MOT-0000-2026");
    }
}
