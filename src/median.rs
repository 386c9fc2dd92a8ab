// SPDX-License-Identifier: MIT
//! Generalized median strings of weighted string collections.
//!
//! A weight behaves exactly like a multiplicity, except any positive
//! value is allowed. Giving a string weight 2 is considerably cheaper
//! than storing two identical strings with weight 1.

use rustc_hash::FxHashSet;

use crate::distance::distance;
use crate::symbol::Symbol;

const INFINITY: f64 = 1e100;

// ---------------------------------------------------------------------------
// Symbol table
// ---------------------------------------------------------------------------

/// Collects the distinct symbols occurring in `strings`, in ascending
/// order.
///
/// Symbols with a byte index go through a dense 256-slot table, the rest
/// through a hash set.
pub fn symbol_table<T: Symbol>(strings: &[&[T]]) -> Vec<T> {
    let mut dense = [false; 256];
    let mut wide = FxHashSet::default();
    let mut symbols = Vec::new();
    for s in strings {
        for &c in *s {
            let fresh = match c.byte_index() {
                Some(idx) => !std::mem::replace(&mut dense[idx], true),
                None => wide.insert(c),
            };
            if fresh {
                symbols.push(c);
            }
        }
    }
    symbols.sort_unstable();
    symbols
}

fn vote_slot<T: Symbol>(symbols: &[T], c: T) -> usize {
    match symbols.binary_search(&c) {
        Ok(slot) => slot,
        Err(_) => unreachable!("symbol missing from the symbol table"),
    }
}

// ---------------------------------------------------------------------------
// Greedy median
// ---------------------------------------------------------------------------

/// Finds a generalized median of `strings` with the greedy algorithm:
/// the candidate grows one symbol at a time, each step picking the
/// symbol with the smallest weighted sum of simulated-row minima, and
/// the best recorded prefix is returned.
///
/// The candidate never grows past `2 * maxlen + 1` symbols, and growth
/// stops early once it exceeds every input and the recorded sum of
/// distances worsens. An empty collection (or one containing only empty
/// strings) yields the empty string.
///
/// # Panics
///
/// Panics when `strings` and `weights` have different lengths.
pub fn greedy_median<T: Symbol>(strings: &[&[T]], weights: &[f64]) -> Vec<T> {
    assert_eq!(strings.len(), weights.len());

    let symbols = symbol_table(strings);
    if symbols.is_empty() {
        return Vec::new();
    }

    let maxlen = strings.iter().map(|s| s.len()).max().unwrap_or(0);
    let stoplen = 2 * maxlen + 1;

    // one cached matrix row per string: rows[i][k] is the cost of turning
    // the current candidate into strings[i][..k]
    let mut rows: Vec<Vec<usize>> = strings.iter().map(|s| (0..=s.len()).collect()).collect();
    let mut row = vec![0usize; maxlen + 1];

    let mut median: Vec<T> = Vec::with_capacity(stoplen);
    // mediandist[len] is the total weighted distance of the candidate
    // truncated to len symbols; entry 0 belongs to the empty string
    let mut mediandist: Vec<f64> = Vec::with_capacity(stoplen + 1);
    mediandist.push(
        strings
            .iter()
            .zip(weights)
            .map(|(s, &w)| s.len() as f64 * w)
            .sum(),
    );

    for len in 1..=stoplen {
        let mut best_symbol = symbols[0];
        let mut best_totaldist = 0.0;
        let mut minminsum = INFINITY;
        for &symbol in &symbols {
            let mut totaldist = 0.0;
            let mut minsum = 0.0;
            // simulate how the rows would look with this symbol appended;
            // the row minimum is a look-ahead ranking key, the row end is
            // the actual distance contribution
            for (i, stri) in strings.iter().enumerate() {
                let ri = &rows[i];
                let mut min = len;
                let mut x = len;
                for (k, &c) in stri.iter().enumerate() {
                    let diag = ri[k] + usize::from(symbol != c);
                    x += 1;
                    if x > diag {
                        x = diag;
                    }
                    let up = ri[k + 1] + 1;
                    if x > up {
                        x = up;
                    }
                    if x < min {
                        min = x;
                    }
                }
                minsum += min as f64 * weights[i];
                totaldist += x as f64 * weights[i];
            }
            if minsum < minminsum {
                minminsum = minsum;
                best_totaldist = totaldist;
                best_symbol = symbol;
            }
        }
        mediandist.push(best_totaldist);
        median.push(best_symbol);

        if len == stoplen || (len > maxlen && mediandist[len] > mediandist[len - 1]) {
            break;
        }

        // the step is committed, recompute the cached rows for real
        row[0] = len;
        for (i, stri) in strings.iter().enumerate() {
            let oldrow = &mut rows[i];
            for k in 1..=stri.len() {
                let c1 = oldrow[k] + 1;
                let c2 = row[k - 1] + 1;
                let c3 = oldrow[k - 1] + usize::from(best_symbol != stri[k - 1]);
                row[k] = c2.min(c3).min(c1);
            }
            oldrow[..=stri.len()].copy_from_slice(&row[..=stri.len()]);
        }
    }

    let mut bestlen = 0;
    for (len, &dist) in mediandist.iter().enumerate().skip(1) {
        if dist < mediandist[bestlen] {
            bestlen = len;
        }
    }
    median.truncate(bestlen);
    median
}

// ---------------------------------------------------------------------------
// Median improvement
// ---------------------------------------------------------------------------

/// Knowing the cached matrix rows up to the current cut, finishes the
/// distance computations for the median tail `tail` against every
/// string.
///
/// The cached row's cell 0 carries the length of the already-committed
/// median prefix (the `offset`), so only the tail part of each matrix
/// needs completing. The common suffix of the tail and each string is
/// stripped first; the prefix cannot be, it is what the cache is for.
fn finish_distance<T: Symbol>(
    tail: &[T],
    strings: &[&[T]],
    weights: &[f64],
    rows: &[Vec<usize>],
    row: &mut [usize],
) -> f64 {
    let mut distsum = 0.0;

    if tail.is_empty() {
        for (i, stri) in strings.iter().enumerate() {
            distsum += rows[i][stri.len()] as f64 * weights[i];
        }
        return distsum;
    }

    for (i, stri) in strings.iter().enumerate() {
        let rowi = &rows[i];
        let mut len = tail.len();
        let mut leni = stri.len();
        while len > 0 && leni > 0 && stri[leni - 1] == tail[len - 1] {
            len -= 1;
            leni -= 1;
        }
        if len == 0 {
            distsum += rowi[leni] as f64 * weights[i];
            continue;
        }
        let offset = rowi[0];
        if leni == 0 {
            distsum += (offset + len) as f64 * weights[i];
            continue;
        }

        row[..=leni].copy_from_slice(&rowi[..=leni]);
        for p in 1..=len {
            let char1 = tail[p - 1];
            let mut d = p + offset;
            let mut x = p + offset;
            for k in 1..=leni {
                let c3 = d - 1 + usize::from(char1 != stri[k - 1]);
                x += 1;
                if x > c3 {
                    x = c3;
                }
                d = row[k] + 1;
                if x > d {
                    x = d;
                }
                row[k] = x;
            }
        }
        distsum += row[leni] as f64 * weights[i];
    }

    distsum
}

enum Perturbation<T> {
    Keep,
    Replace(T),
    Insert(T),
    Delete,
}

/// Tries to improve a generalized median `seed` with single-symbol
/// perturbations, walking left to right over its positions and applying
/// each Replace, Insert, or Delete that lowers the weighted sum of
/// distances.
///
/// The result never has a larger sum of distances than `seed`; in the
/// worst case it is a copy of `seed`. One pass is made; callers may
/// iterate the function to convergence.
///
/// # Panics
///
/// Panics when `strings` and `weights` have different lengths.
pub fn median_improve<T: Symbol>(seed: &[T], strings: &[&[T]], weights: &[f64]) -> Vec<T> {
    assert_eq!(strings.len(), weights.len());

    let symbols = symbol_table(strings);
    if symbols.is_empty() {
        return Vec::new();
    }

    let maxlen = strings.iter().map(|s| s.len()).max().unwrap_or(0);

    let mut rows: Vec<Vec<usize>> = strings.iter().map(|s| (0..=s.len()).collect()).collect();
    let mut row = vec![0usize; maxlen + 1];

    // buf[0] is a scratch slot so an insertion at position 0 can be
    // simulated by overwriting the symbol before the cut; the median
    // itself lives in buf[1..]
    let mut buf: Vec<T> = Vec::with_capacity(seed.len() + 1);
    buf.push(symbols[0]);
    buf.extend_from_slice(seed);

    let mut minminsum = finish_distance(&buf[1..], strings, weights, &rows, &mut row);

    let mut pos = 0usize;
    while pos + 1 <= buf.len() {
        let medlen = buf.len() - 1;
        let mut operation = Perturbation::Keep;

        // replace the symbol at pos with every other symbol
        if pos < medlen {
            let orig = buf[pos + 1];
            for &symbol in &symbols {
                if symbol == orig {
                    continue;
                }
                buf[pos + 1] = symbol;
                let sum = finish_distance(&buf[pos + 1..], strings, weights, &rows, &mut row);
                if sum < minminsum {
                    minminsum = sum;
                    operation = Perturbation::Replace(symbol);
                }
            }
            buf[pos + 1] = orig;
        }

        // insert every symbol at pos, simulated via the slot before the cut
        {
            let orig = buf[pos];
            for &symbol in &symbols {
                buf[pos] = symbol;
                let sum = finish_distance(&buf[pos..], strings, weights, &rows, &mut row);
                if sum < minminsum {
                    minminsum = sum;
                    operation = Perturbation::Insert(symbol);
                }
            }
            buf[pos] = orig;
        }

        // delete the symbol at pos
        if pos < medlen {
            let sum = finish_distance(&buf[pos + 2..], strings, weights, &rows, &mut row);
            if sum < minminsum {
                minminsum = sum;
                operation = Perturbation::Delete;
            }
        }

        let deleted = matches!(operation, Perturbation::Delete);
        match operation {
            Perturbation::Keep => {}
            Perturbation::Replace(symbol) => buf[pos + 1] = symbol,
            Perturbation::Insert(symbol) => buf.insert(pos + 1, symbol),
            Perturbation::Delete => {
                buf.remove(pos + 1);
            }
        }

        // after a deletion the symbol now at pos is the next to consider;
        // otherwise commit the row cache for pos and advance
        if !deleted {
            if pos + 1 < buf.len() {
                let symbol = buf[pos + 1];
                row[0] = pos + 1;
                for (i, stri) in strings.iter().enumerate() {
                    let oldrow = &mut rows[i];
                    for k in 1..=stri.len() {
                        let c1 = oldrow[k] + 1;
                        let c2 = row[k - 1] + 1;
                        let c3 = oldrow[k - 1] + usize::from(symbol != stri[k - 1]);
                        row[k] = c2.min(c3).min(c1);
                    }
                    oldrow[..=stri.len()].copy_from_slice(&row[..=stri.len()]);
                }
            }
            pos += 1;
        }
    }

    buf.remove(0);
    buf
}

// ---------------------------------------------------------------------------
// Quick (voting) median
// ---------------------------------------------------------------------------

/// Finds an approximate generalized median by position voting.
///
/// The output length is the weighted mean input length, rounded with the
/// original half-down fudge `floor(mean + 0.499999)`. Each output
/// position j collects weighted votes from the matching fractional
/// interval of every input string; whole symbols vote with the full
/// weight, the fractional head and tail with their covered share. Ties
/// elect the lowest symbol.
///
/// # Panics
///
/// Panics when `strings` and `weights` have different lengths.
pub fn quick_median<T: Symbol>(strings: &[&[T]], weights: &[f64]) -> Vec<T> {
    assert_eq!(strings.len(), weights.len());

    let mut ml = 0.0;
    let mut wl = 0.0;
    for (s, &w) in strings.iter().zip(weights) {
        ml += s.len() as f64 * w;
        wl += w;
    }
    if wl == 0.0 {
        return Vec::new();
    }
    let ml = (ml / wl + 0.499999).floor();
    let len = ml as usize;
    if len == 0 {
        return Vec::new();
    }

    let symbols = symbol_table(strings);
    let mut votes = vec![0.0f64; symbols.len()];
    let mut median = Vec::with_capacity(len);

    for j in 0..len {
        votes.fill(0.0);

        for (i, stri) in strings.iter().enumerate() {
            let lengthi = stri.len();
            if lengthi == 0 {
                continue;
            }
            let weighti = weights[i];
            let start = lengthi as f64 / ml * j as f64;
            let end = start + lengthi as f64 / ml;
            let istart = (start.floor() as usize).min(lengthi - 1);
            let iend = (end.ceil() as usize).min(lengthi);

            // the inner part, including the complete last symbol
            for k in istart + 1..iend {
                votes[vote_slot(&symbols, stri[k])] += weighti;
            }
            // the initial fraction
            votes[vote_slot(&symbols, stri[istart])] += weighti * ((istart + 1) as f64 - start);
            // subtract the share of the last symbol that was counted
            // above but belongs to the next position; this also holds
            // when everything happens inside one symbol
            votes[vote_slot(&symbols, stri[iend - 1])] -= weighti * (iend as f64 - end);
        }

        let mut elected = 0;
        for (slot, &v) in votes.iter().enumerate().skip(1) {
            if v > votes[elected] {
                elected = slot;
            }
        }
        median.push(symbols[elected]);
    }

    median
}

// ---------------------------------------------------------------------------
// Set median
// ---------------------------------------------------------------------------

/// Finds the index of the input string with the lowest weighted sum of
/// distances to all the others. `None` on an empty collection.
///
/// Pairwise distances are computed lazily into a triangular cache, and a
/// candidate is abandoned as soon as its accumulated sum reaches the
/// best one found so far.
///
/// # Panics
///
/// Panics when `strings` and `weights` have different lengths.
pub fn set_median_index<T: Symbol>(strings: &[&[T]], weights: &[f64]) -> Option<usize> {
    assert_eq!(strings.len(), weights.len());

    let n = strings.len();
    if n == 0 {
        return None;
    }

    // pair (a, b) with a < b lives at b*(b-1)/2 + a
    let mut cache: Vec<Option<usize>> = vec![None; n * (n - 1) / 2];
    let mut minidx = 0;
    let mut mindist = INFINITY;

    for i in 0..n {
        let stri = strings[i];
        let mut dist = 0.0;
        let mut j = 0;
        // below the diagonal the distance may already be cached
        while j < i && dist < mindist {
            let d = cache[i * (i - 1) / 2 + j]
                .unwrap_or_else(|| distance(strings[j], stri, false));
            dist += weights[j] * d as f64;
            j += 1;
        }
        j += 1; // no need to compare a string with itself
        while j < n && dist < mindist {
            let d = distance(strings[j], stri, false);
            cache[j * (j - 1) / 2 + i] = Some(d);
            dist += weights[j] * d as f64;
            j += 1;
        }
        if dist < mindist {
            mindist = dist;
            minidx = i;
        }
    }

    Some(minidx)
}

/// Like [`set_median_index`], but returns a copy of the winning string.
pub fn set_median<T: Symbol>(strings: &[&[T]], weights: &[f64]) -> Option<Vec<T>> {
    set_median_index(strings, weights).map(|i| strings[i].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sod(candidate: &[u8], strings: &[&[u8]], weights: &[f64]) -> f64 {
        strings
            .iter()
            .zip(weights)
            .map(|(s, &w)| distance(candidate, s, false) as f64 * w)
            .sum()
    }

    #[test]
    fn symbol_table_is_sorted_and_distinct() {
        let strings: [&[u8]; 2] = [b"banana", b"abba"];
        assert_eq!(symbol_table(&strings), vec![b'a', b'b', b'n']);
        assert!(symbol_table::<u8>(&[]).is_empty());

        let wide: Vec<u32> = "aé漢é".chars().map(|c| c as u32).collect();
        let table = symbol_table(&[&wide[..]]);
        assert_eq!(table, vec![b'a' as u32, 'é' as u32, '漢' as u32]);
    }

    #[test]
    fn greedy_median_beats_every_input() {
        let strings: [&[u8]; 3] = [b"Levenshtein", b"Levenstein", b"Lenvinsten"];
        let weights = [1.0, 1.0, 1.0];
        let median = greedy_median(&strings, &weights);
        let best_input_sod = strings
            .iter()
            .map(|s| sod(s, &strings, &weights))
            .fold(f64::INFINITY, f64::min);
        assert!(sod(&median, &strings, &weights) <= best_input_sod);
    }

    #[test]
    fn greedy_median_of_one_string_is_that_string() {
        let strings: [&[u8]; 1] = [b"spam"];
        assert_eq!(greedy_median(&strings, &[1.0]), b"spam");
    }

    #[test]
    fn greedy_median_of_identical_strings() {
        let strings: [&[u8]; 3] = [b"abc", b"abc", b"abc"];
        assert_eq!(greedy_median(&strings, &[1.0, 2.0, 0.5]), b"abc");
    }

    #[test]
    fn greedy_median_of_empty_collection() {
        assert!(greedy_median::<u8>(&[], &[]).is_empty());
        let strings: [&[u8]; 2] = [b"", b""];
        assert!(greedy_median(&strings, &[1.0, 1.0]).is_empty());
    }

    #[test]
    fn weights_behave_like_multiplicities() {
        let heavy: [&[u8]; 2] = [b"heap", b"leap"];
        let median = greedy_median(&heavy, &[5.0, 1.0]);
        assert_eq!(median, b"heap");
    }

    #[test]
    fn median_improve_never_worsens() {
        let strings: [&[u8]; 3] = [b"Levenshtein", b"Levenstein", b"Lenvinsten"];
        let weights = [1.0, 1.0, 1.0];
        let seeds: [&[u8]; 4] = [b"", b"Levenshtein", b"Lvnshtn", b"xxxxxxxxxxxxxxxxxxxx"];
        for seed in seeds {
            let improved = median_improve(seed, &strings, &weights);
            assert!(
                sod(&improved, &strings, &weights) <= sod(seed, &strings, &weights),
                "seed {seed:?}"
            );
        }
    }

    #[test]
    fn median_improve_fixes_a_near_median() {
        let strings: [&[u8]; 3] = [b"ehe", b"ehe", b"the"];
        let weights = [1.0, 1.0, 1.0];
        let improved = median_improve(b"the", &strings, &weights);
        assert_eq!(sod(&improved, &strings, &weights), 1.0);
        assert_eq!(improved, b"ehe");
    }

    #[test]
    fn quick_median_length_is_the_weighted_mean() {
        let strings: [&[u8]; 2] = [b"aa", b"aaaa"];
        assert_eq!(quick_median(&strings, &[1.0, 1.0]).len(), 3);
        // the fudge rounds an exact .5 down: mean of 1 and 2 gives 1
        let strings: [&[u8]; 2] = [b"a", b"ab"];
        assert_eq!(quick_median(&strings, &[1.0, 1.0]).len(), 1);
    }

    #[test]
    fn quick_median_of_identical_strings() {
        let strings: [&[u8]; 2] = [b"abab", b"abab"];
        assert_eq!(quick_median(&strings, &[1.0, 1.0]), b"abab");
    }

    #[test]
    fn quick_median_ignores_empty_voters() {
        // mean length 2; each position takes the majority of its
        // 1.5-symbol interval, the empty string casts no votes
        let strings: [&[u8]; 3] = [b"abc", b"abc", b""];
        let median = quick_median(&strings, &[1.0, 1.0, 1.0]);
        assert_eq!(median, b"ac");
    }

    #[test]
    fn quick_median_of_nothing() {
        assert!(quick_median::<u8>(&[], &[]).is_empty());
    }

    #[test]
    fn set_median_picks_the_central_string() {
        let strings: [&[u8]; 3] = [b"kitten", b"sitten", b"sitting"];
        let weights = [1.0, 1.0, 1.0];
        let idx = set_median_index(&strings, &weights).unwrap();
        for s in &strings {
            assert!(sod(strings[idx], &strings, &weights) <= sod(s, &strings, &weights));
        }
        assert_eq!(set_median(&strings, &weights).unwrap(), b"sitten");
    }

    #[test]
    fn set_median_respects_weights() {
        let strings: [&[u8]; 3] = [b"aaaa", b"bbbb", b"aaab"];
        // the heavy outlier drags the median towards itself
        let idx = set_median_index(&strings, &[1.0, 10.0, 1.0]).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn set_median_of_nothing() {
        assert_eq!(set_median_index::<u8>(&[], &[]), None);
        assert_eq!(set_median::<u8>(&[], &[]), None);
    }
}
