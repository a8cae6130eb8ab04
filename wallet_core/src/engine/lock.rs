use common::UserId;

/// Derives a deterministic signed 64-bit advisory-lock key from the parties
/// and asset of a pending operation (spec §4.1).
///
/// The parts are sorted lexicographically before hashing so the key is
/// order-insensitive with respect to party identity: a SPEND (user→system)
/// and a TOP_UP (system→user) on the same (user, asset) pair collide on the
/// same key, serializing re-entrant idempotency-key processing before any
/// row is touched.
///
/// The fold is the classic `h = (h << 5) - h + byte` (i.e. `h * 31 + byte`)
/// running in wrapping 64-bit two's complement arithmetic, the same
/// djb2-family hash used across the corpus for advisory-lock keys (e.g. the
/// `compute_lock_key` idiom paired with `pg_advisory_xact_lock`). A 64-bit
/// hash can theoretically collide across unrelated tuples; that only costs
/// spurious serialization; true conflicts remain correctly serialized by the
/// row-lock layer regardless (spec §9).
pub fn derive_key(parts: &[&str]) -> i64 {
    let mut sorted: Vec<&str> = parts.to_vec();
    sorted.sort_unstable();
    let joined = sorted.join("\u{1}");

    let mut h: i64 = 0;
    for byte in joined.as_bytes() {
        h = h
            .wrapping_shl(5)
            .wrapping_sub(h)
            .wrapping_add(*byte as i64);
    }
    h
}

/// Returns `(a, b)` reordered so row locks on the two wallets' owning users
/// are always acquired in ascending `user_id` order, breaking cycle
/// formation under mixed operations on overlapping wallets (spec §4.1).
pub fn ordered_user_ids(a: UserId, b: UserId) -> (UserId, UserId) {
    if a.0 <= b.0 {
        (a, b)
    } else {
        (b, a)
    }
}
