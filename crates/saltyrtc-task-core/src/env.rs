//! Environment abstraction for deterministic testing.
//!
//! Decouples the transport and task state machines from system resources
//! (time, randomness) so that candidate-buffering timers and cookie
//! generation can be driven deterministically in tests while production
//! code uses real system resources.

use std::time::Duration;

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards.
/// - `random_bytes()` uses cryptographically secure entropy in production.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; simulation
    /// environments may use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the only async method in the trait; it is used only by
    /// driver code, never by protocol logic.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random 16-byte cookie.
    fn random_cookie(&self) -> saltyrtc_task_proto::Cookie {
        let mut cookie = [0u8; 16];
        self.random_bytes(&mut cookie);
        cookie
    }

    /// Generates a random `u32`, used as a chunker message id.
    fn random_u32(&self) -> u32 {
        let mut bytes = [0u8; 4];
        self.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }
}

/// Production [`Environment`] backed by `std::time::Instant` and OS
/// entropy via `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvironment;

impl Environment for StdEnvironment {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - task cannot operate securely");
    }
}
