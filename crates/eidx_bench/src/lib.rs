//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use eidx_core::EidMetadata;
use rand::seq::SliceRandom;
use rand::Rng;

const WORDS: &[&str] = &[
    "account", "add", "browse", "cart", "checkout", "click", "commerce", "discovery", "feed",
    "login", "media", "page", "pause", "pay", "play", "profile", "recommendations", "remove",
    "search", "settings", "share", "submit", "view", "vnext",
];

/// Generate a random dotted EID with three to five segments.
pub fn random_eid<R: Rng>(rng: &mut R) -> String {
    let segments = rng.gen_range(3..=5);
    (0..segments)
        .map(|_| {
            let word = WORDS.choose(rng).copied().unwrap_or("x");
            format!("{word}{}", rng.gen_range(0..20))
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Generate `count` distinct random EIDs.
pub fn generate_eids(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    let mut seen = std::collections::HashSet::with_capacity(count);
    while seen.len() < count {
        seen.insert(random_eid(&mut rng));
    }
    let mut eids: Vec<String> = seen.into_iter().collect();
    eids.sort();
    eids
}

/// Generate `count` records with random usage counters.
pub fn generate_records(count: usize) -> Vec<EidMetadata> {
    let mut rng = rand::thread_rng();
    generate_eids(count)
        .into_iter()
        .filter_map(|eid| {
            let mut meta = EidMetadata::from_eid(&eid, 0).ok()?;
            meta.frequency = rng.gen_range(0..1_000);
            Some(meta)
        })
        .collect()
}
