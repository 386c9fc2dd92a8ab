// SPDX-License-Identifier: MIT
//! Minimum-cost assignment on rectangular matrices
//! (Munkres-Blackman algorithm).

const EPSILON: f64 = 1e-14;
const INFINITY: f64 = 1e100;

/// Finds the minimum-cost assignment of columns to rows.
///
/// `dists` is an `n2 x n1` matrix in row-major order (`dists[i * n1 + j]`
/// is the cost of giving column `j` to row `i`) with `n1 <= n2`; it is
/// consumed and destroyed by the reduction steps. Returns `map` of
/// length `n1`, where `map[j]` is the row assigned to column `j`; the
/// sum of `dists[map[j] * n1 + j]` over the original matrix is minimal.
///
/// # Panics
///
/// Panics when `n1 > n2` or when the matrix has the wrong size.
pub fn assignment(n1: usize, n2: usize, mut dists: Vec<f64>) -> Vec<usize> {
    assert!(n1 <= n2);
    assert_eq!(dists.len(), n1 * n2);

    let mut covc = vec![false; n1]; // covered columns
    let mut covr = vec![false; n2]; // covered rows
    // 1-based indices so 0 can mean `none`:
    // zstarr: column of the starred zero in a given row
    // zstarc: row of the starred zero in a given column
    // zprimer: column of the primed zero in a given row
    let mut zstarr = vec![0usize; n2];
    let mut zstarc = vec![0usize; n1];
    let mut zprimer = vec![0usize; n2];

    // column reduction, then star a zero per column where possible
    for j in 0..n1 {
        let mut minidx = 0;
        let mut min = dists[j];
        for i in 1..n2 {
            if min > dists[i * n1 + j] {
                minidx = i;
                min = dists[i * n1 + j];
            }
        }
        for i in 0..n2 {
            let p = &mut dists[i * n1 + j];
            *p -= min;
            if *p < EPSILON {
                *p = 0.0;
            }
        }
        if zstarc[j] == 0 && zstarr[minidx] == 0 {
            zstarc[j] = minidx + 1;
            zstarr[minidx] = j + 1;
        } else {
            for i in 0..n2 {
                if i != minidx
                    && dists[i * n1 + j] == 0.0
                    && zstarc[j] == 0
                    && zstarr[i] == 0
                {
                    zstarc[j] = i + 1;
                    zstarr[i] = j + 1;
                    break;
                }
            }
        }
    }

    loop {
        // cover the columns containing a starred zero; all columns
        // covered means the assignment is complete
        let mut covered = 0;
        for j in 0..n1 {
            if zstarc[j] != 0 {
                covc[j] = true;
                covered += 1;
            }
        }
        if covered == n1 {
            break;
        }

        // find an uncovered zero and prime it; when its row holds a
        // star, swap the cover from the star's column to the row and
        // rescan, otherwise the prime starts an augmenting path
        let zrow;
        'find: loop {
            for j in 0..n1 {
                if covc[j] {
                    continue;
                }
                for i in 0..n2 {
                    if !covr[i] && dists[i * n1 + j] == 0.0 {
                        zprimer[i] = j + 1;
                        if zstarr[i] != 0 {
                            covr[i] = true;
                            covc[zstarr[i] - 1] = false;
                            continue 'find;
                        }
                        zrow = i;
                        break 'find;
                    }
                }
            }

            // no uncovered zero at all: manufacture new ones by moving
            // the smallest uncovered value out of the uncovered region
            let mut min = INFINITY;
            for j in 0..n1 {
                if covc[j] {
                    continue;
                }
                for i in 0..n2 {
                    if !covr[i] && min > dists[i * n1 + j] {
                        min = dists[i * n1 + j];
                    }
                }
            }
            for i in 0..n2 {
                if !covr[i] {
                    continue;
                }
                for j in 0..n1 {
                    dists[i * n1 + j] += min;
                }
            }
            for j in 0..n1 {
                if covc[j] {
                    continue;
                }
                for i in 0..n2 {
                    let p = &mut dists[i * n1 + j];
                    *p -= min;
                    if *p < EPSILON {
                        *p = 0.0;
                    }
                }
            }
        }

        // augment: walk prime -> star-in-column -> prime-in-row from the
        // fresh prime, turning the primes on the path into stars
        let mut i = zrow + 1;
        while i != 0 {
            let x = i;
            i -= 1;
            let j = zprimer[i] - 1;
            zstarr[i] = j + 1;
            i = zstarc[j];
            zstarc[j] = x;
        }
        zprimer.fill(0);
        covr.fill(false);
        covc.fill(false);
    }

    for z in &mut zstarc {
        *z -= 1;
    }
    zstarc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment_cost(map: &[usize], dists: &[f64], n1: usize) -> f64 {
        map.iter()
            .enumerate()
            .map(|(j, &i)| dists[i * n1 + j])
            .sum()
    }

    /// Minimum assignment cost by trying every injective column-to-row
    /// mapping.
    fn brute_force(n1: usize, n2: usize, dists: &[f64]) -> f64 {
        fn go(col: usize, n1: usize, used: &mut [bool], dists: &[f64]) -> f64 {
            if col == n1 {
                return 0.0;
            }
            let mut best = f64::INFINITY;
            for i in 0..used.len() {
                if used[i] {
                    continue;
                }
                used[i] = true;
                let cost = dists[i * n1 + col] + go(col + 1, n1, used, dists);
                used[i] = false;
                if cost < best {
                    best = cost;
                }
            }
            best
        }
        go(0, n1, &mut vec![false; n2], dists)
    }

    #[test]
    fn trivial_single_cell() {
        assert_eq!(assignment(1, 1, vec![0.7]), vec![0]);
    }

    #[test]
    fn picks_the_cheap_diagonal() {
        let dists = vec![
            0.0, 9.0, //
            9.0, 0.0,
        ];
        assert_eq!(assignment(2, 2, dists), vec![0, 1]);
    }

    #[test]
    fn picks_the_cheap_antidiagonal() {
        let dists = vec![
            9.0, 0.0, //
            0.0, 9.0,
        ];
        assert_eq!(assignment(2, 2, dists), vec![1, 0]);
    }

    #[test]
    fn rectangular_leaves_costly_rows_out() {
        // 3 rows, 2 columns; row 1 is poison
        let dists = vec![
            1.0, 2.0, //
            9.0, 9.0, //
            2.0, 1.0,
        ];
        let map = assignment(2, 3, dists.clone());
        assert_eq!(map, vec![0, 2]);
        assert_eq!(assignment_cost(&map, &dists, 2), 2.0);
    }

    #[test]
    fn requires_zero_manufacturing() {
        // no zero-cost perfect matching after the first reduction
        let dists = vec![
            1.0, 2.0, 3.0, //
            2.0, 4.0, 6.0, //
            3.0, 6.0, 9.0,
        ];
        let map = assignment(3, 3, dists.clone());
        assert_eq!(assignment_cost(&map, &dists, 3), brute_force(3, 3, &dists));
    }

    #[test]
    fn matches_brute_force_on_pseudorandom_matrices() {
        // a small multiplicative generator keeps the inputs deterministic
        let mut state = 0x2545f491u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) % 1000) as f64 / 1000.0
        };
        for (n1, n2) in [(1, 1), (2, 2), (2, 3), (3, 3), (3, 5), (4, 4), (4, 6)] {
            for _ in 0..20 {
                let dists: Vec<f64> = (0..n1 * n2).map(|_| next()).collect();
                let map = assignment(n1, n2, dists.clone());
                // the map must be injective
                let mut seen = vec![false; n2];
                for &i in &map {
                    assert!(!seen[i]);
                    seen[i] = true;
                }
                let got = assignment_cost(&map, &dists, n1);
                let want = brute_force(n1, n2, &dists);
                assert!(
                    (got - want).abs() < 1e-9,
                    "n1={n1} n2={n2} got={got} want={want}"
                );
            }
        }
    }
}
