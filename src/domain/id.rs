//! Process-wide identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Return a fresh identifier for a card or tree node.
///
/// Format is `<sequence-hex>-<8 random hex>`. The sequence never repeats
/// within a process; the random part keeps generated ids apart from ids
/// supplied by a data source (e.g. `"1-1"`).
pub fn uid() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!("{:x}-{}", seq, &random[..8])
}
