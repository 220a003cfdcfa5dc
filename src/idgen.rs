//! Customer/account number generation
//!
//! Six-digit numbers drawn at random and checked against the store until a
//! free one turns up. Collisions are retried transparently and never surface
//! as errors. Transfer and rule identifiers do not go through this path;
//! they are UUIDs, which need no availability check.

use rand::Rng;

use crate::store::{IdNamespace, LedgerStore, StoreError};

pub const ID_MIN: i64 = 100_000;
pub const ID_MAX: i64 = 999_999;

/// Draw a random candidate from the six-digit space.
pub fn random_candidate() -> i64 {
    rand::thread_rng().gen_range(ID_MIN..=ID_MAX)
}

/// Return the first drawn candidate not already present in `namespace`.
///
/// The draw source is a parameter so tests can use a seeded generator; the
/// loop is unbounded, matching the store's guarantee that the id space is
/// never exhausted in practice.
pub async fn generate_unique_id<S>(
    store: &S,
    namespace: IdNamespace,
    mut draw: impl FnMut() -> i64 + Send,
) -> Result<i64, StoreError>
where
    S: LedgerStore + ?Sized,
{
    loop {
        let candidate = draw();
        if !store.id_taken(namespace, candidate).await? {
            return Ok(candidate);
        }
    }
}
