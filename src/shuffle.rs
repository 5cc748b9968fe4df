//! Playlist ordering.
//!
//! [`shuffle`] is the plain uniform permutation. [`weighted_shuffle`] and
//! [`enforce_artist_gap`] are opt-in refinements composed by [`arrange`].
//! Every function returns a new vector and leaves its input untouched, and
//! every output is a permutation of the input.

use std::collections::HashMap;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::types::Track;

/// Popularity assumed for tracks the API reports without one.
const DEFAULT_POPULARITY: u32 = 50;
/// Upper bound of the weighting term; keeps the weight positive for
/// popularity 100.
const POPULARITY_CEILING: f64 = 120.0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShuffleOptions {
    pub seed: Option<u64>,
    pub weighted: bool,
    pub min_artist_gap: usize,
}

/// Returns a seeded generator, or one seeded from the thread-local CSPRNG.
fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Uniformly random permutation of `items` (Fisher–Yates).
///
/// Deterministic for a given `seed`; sequences of length 0 or 1 come back
/// unchanged.
pub fn shuffle<T: Clone>(items: &[T], seed: Option<u64>) -> Vec<T> {
    let mut rng = rng_for(seed);
    let mut out = items.to_vec();

    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }

    out
}

/// Popularity-biased ordering: more popular tracks tend to come first.
///
/// Each track gets the score `u * (120 - popularity)` with `u` uniform in
/// `[0, 1)`, and tracks are sorted by ascending score.
pub fn weighted_shuffle(tracks: &[Track], seed: Option<u64>) -> Vec<Track> {
    let mut rng = rng_for(seed);

    let mut scored: Vec<(f64, &Track)> = tracks
        .iter()
        .map(|t| {
            let popularity = t.popularity.unwrap_or(DEFAULT_POPULARITY).min(100) as f64;
            (rng.random::<f64>() * (POPULARITY_CEILING - popularity), t)
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.into_iter().map(|(_, t)| t.clone()).collect()
}

/// Spreads out tracks sharing a main artist so that two of them are at least
/// `gap` positions apart, keeping the incoming order wherever possible.
///
/// Tracks that do not fit at the end are inserted at the earliest position
/// that satisfies the gap on both sides; inserting never shrinks the distance
/// between tracks already placed. Tracks with no position left are parked,
/// retried once every track has been placed, and appended as-is at the end if
/// they still do not fit. A `gap` of 0 or 1 is a no-op.
///
/// Each placement is a single scan of the output, so the pass is quadratic in
/// the worst case.
pub fn enforce_artist_gap(tracks: &[Track], gap: usize) -> Vec<Track> {
    if gap <= 1 {
        return tracks.to_vec();
    }

    let keys = artist_ids(tracks);
    let mut out: Vec<usize> = Vec::with_capacity(tracks.len());
    let mut parked: Vec<usize> = Vec::new();

    for idx in 0..tracks.len() {
        if !place(&mut out, &keys, idx, gap) {
            parked.push(idx);
        }
    }

    // an insertion can open room for other artists, so repeat until a pass
    // places nothing
    loop {
        let before = parked.len();
        parked.retain(|&idx| !place(&mut out, &keys, idx, gap));
        if parked.is_empty() || parked.len() == before {
            break;
        }
    }

    // best effort for whatever cannot be spaced out
    out.extend(parked);
    out.into_iter().map(|idx| tracks[idx].clone()).collect()
}

/// Interns main artist keys so the gap pass compares integers.
fn artist_ids(tracks: &[Track]) -> Vec<Option<usize>> {
    let mut ids: HashMap<&str, usize> = HashMap::new();
    tracks
        .iter()
        .map(|t| {
            let key = t.main_artist_key()?;
            let next = ids.len();
            Some(*ids.entry(key).or_insert(next))
        })
        .collect()
}

/// Appends or inserts track `idx` if some position satisfies the gap.
///
/// Inserting at `pos` is valid when no track of the same artist sits within
/// `pos - gap + 1 ..= pos + gap - 2` of the current output, i.e. between two
/// consecutive occurrences `p` and `q` the valid positions are
/// `p + gap ..= q - gap + 1`.
fn place(out: &mut Vec<usize>, keys: &[Option<usize>], idx: usize, gap: usize) -> bool {
    let Some(key) = keys[idx] else {
        out.push(idx);
        return true;
    };

    let mut last: Option<usize> = None;
    let mut earliest: Option<usize> = None;
    for (pos, &other) in out.iter().enumerate() {
        if keys[other] != Some(key) {
            continue;
        }
        let from = last.map_or(0, |p| p + gap);
        if earliest.is_none() && from + gap - 1 <= pos {
            earliest = Some(from);
        }
        last = Some(pos);
    }

    if last.is_none_or(|p| out.len() >= p + gap) {
        out.push(idx);
        return true;
    }

    match earliest {
        Some(pos) => {
            out.insert(pos, idx);
            true
        }
        None => false,
    }
}

/// Applies the configured ordering: uniform or weighted shuffle, followed by
/// the artist-gap pass when `min_artist_gap` is set.
pub fn arrange(tracks: &[Track], options: &ShuffleOptions) -> Vec<Track> {
    let shuffled = if options.weighted {
        weighted_shuffle(tracks, options.seed)
    } else {
        shuffle(tracks, options.seed)
    };

    enforce_artist_gap(&shuffled, options.min_artist_gap)
}
