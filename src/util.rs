//! Small helpers shared by the connection and observer tasks.

use std::future::pending;

use rand::Rng;
use tokio::time::{sleep_until, Instant};

/// Sleep until `deadline`, or forever when there is none.
///
/// Lets an optional timer sit in a `select!` branch without special casing.
pub(crate) async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// `n` random decimal digits, e.g. `"04719"`.
pub(crate) fn random_digits(n: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
