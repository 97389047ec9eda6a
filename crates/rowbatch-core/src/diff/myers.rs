//! Myers O((N+M)·D) sequence diff in linear space.
//!
//! The common prefix and suffix are matched up front. The remaining window
//! is split at the middle snake of its shortest edit script and each half is
//! solved recursively, so only two frontiers of `N+M` slots are ever live.

use std::ops::Range;

/// Result of diffing two flat sequences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceDiff {
    /// Old indices with no counterpart in new, ascending
    pub deleted: Vec<usize>,
    /// New indices with no counterpart in old, ascending
    pub inserted: Vec<usize>,
    /// `(old, new)` pairs kept in place, ascending on both sides
    pub matched: Vec<(usize, usize)>,
}

impl SequenceDiff {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty()
    }
}

/// Diff `old` against `new` using `eq` as the element identity
pub fn diff_by<A, B, F>(old: &[A], new: &[B], eq: F) -> SequenceDiff
where
    F: Fn(&A, &B) -> bool,
{
    let mut result = SequenceDiff::default();
    if old.is_empty() && new.is_empty() {
        return result;
    }

    let mut search = Search {
        old,
        new,
        eq: &eq,
        forward: Frontier::new(old.len() + new.len()),
        backward: Frontier::new(old.len() + new.len()),
    };
    let (old_range, new_range, suffix) = search.trim(0..old.len(), 0..new.len(), &mut result);
    if search.shares_nothing(old_range.clone(), new_range.clone()) {
        result.deleted.extend(old_range);
        result.inserted.extend(new_range);
    } else {
        search.conquer(old_range, new_range, &mut result);
    }
    result.matched.extend(suffix);
    result
}

/// Furthest-reaching `x` per diagonal, indexed by `k` in `-d..=d`
struct Frontier {
    offset: isize,
    slots: Vec<isize>,
}

impl Frontier {
    fn new(max: usize) -> Self {
        let half = max / 2 + 2;
        Self {
            offset: half as isize,
            slots: vec![0; 2 * half + 1],
        }
    }

    fn get(&self, k: isize) -> isize {
        self.slots[(k + self.offset) as usize]
    }

    fn set(&mut self, k: isize, x: isize) {
        self.slots[(k + self.offset) as usize] = x;
    }

    /// Best `x` on diagonal `k` after one more edit at distance `d`
    fn step(&self, k: isize, d: isize) -> isize {
        if k == -d || (k != d && self.get(k - 1) < self.get(k + 1)) {
            self.get(k + 1)
        } else {
            self.get(k - 1) + 1
        }
    }
}

struct Search<'a, A, B, F> {
    old: &'a [A],
    new: &'a [B],
    eq: &'a F,
    forward: Frontier,
    backward: Frontier,
}

impl<A, B, F> Search<'_, A, B, F>
where
    F: Fn(&A, &B) -> bool,
{
    /// Match the common prefix into `out` and shrink both windows past it
    /// and the common suffix; the suffix pairs are returned for the caller
    /// to append once the middle is solved
    fn trim(
        &self,
        mut old: Range<usize>,
        mut new: Range<usize>,
        out: &mut SequenceDiff,
    ) -> (Range<usize>, Range<usize>, Vec<(usize, usize)>) {
        while old.start < old.end
            && new.start < new.end
            && (self.eq)(&self.old[old.start], &self.new[new.start])
        {
            out.matched.push((old.start, new.start));
            old.start += 1;
            new.start += 1;
        }
        let mut suffix = Vec::new();
        while old.start < old.end
            && new.start < new.end
            && (self.eq)(&self.old[old.end - 1], &self.new[new.end - 1])
        {
            old.end -= 1;
            new.end -= 1;
            suffix.push((old.end, new.end));
        }
        suffix.reverse();
        (old, new, suffix)
    }

    fn shares_nothing(&self, old: Range<usize>, new: Range<usize>) -> bool {
        !self.old[old].iter().any(|a| self.new[new.clone()].iter().any(|b| (self.eq)(a, b)))
    }

    fn conquer(&mut self, old: Range<usize>, new: Range<usize>, out: &mut SequenceDiff) {
        let (old, new, suffix) = self.trim(old, new, out);
        if old.is_empty() {
            out.inserted.extend(new);
        } else if new.is_empty() {
            out.deleted.extend(old);
        } else if let Some((x, y)) = self.middle_snake(old.clone(), new.clone()) {
            self.conquer(old.start..x, new.start..y, out);
            self.conquer(x..old.end, y..new.end, out);
        } else {
            out.deleted.extend(old);
            out.inserted.extend(new);
        }
        out.matched.extend(suffix);
    }

    /// Split point on a shortest edit path through the window
    ///
    /// Both windows are non-empty and their first and last elements differ,
    /// so the returned point is strictly inside the window.
    fn middle_snake(&mut self, old: Range<usize>, new: Range<usize>) -> Option<(usize, usize)> {
        let n = old.len() as isize;
        let m = new.len() as isize;
        let delta = n - m;
        let odd = delta & 1 == 1;
        let max_d = (n + m + 1) / 2 + 1;
        self.forward.set(1, 0);
        self.backward.set(1, 0);

        for d in 0..max_d {
            let mut k = d;
            while k >= -d {
                let mut x = self.forward.step(k, d);
                let mut y = x - k;
                let (x0, y0) = (x, y);
                while x < n
                    && y < m
                    && (self.eq)(
                        &self.old[old.start + x as usize],
                        &self.new[new.start + y as usize],
                    )
                {
                    x += 1;
                    y += 1;
                }
                self.forward.set(k, x);
                if odd && (k - delta).abs() < d && x + self.backward.get(delta - k) >= n {
                    return Some((old.start + x0 as usize, new.start + y0 as usize));
                }
                k -= 2;
            }

            let mut k = d;
            while k >= -d {
                let mut x = self.backward.step(k, d);
                let mut y = x - k;
                while x < n
                    && y < m
                    && (self.eq)(
                        &self.old[old.end - 1 - x as usize],
                        &self.new[new.end - 1 - y as usize],
                    )
                {
                    x += 1;
                    y += 1;
                }
                self.backward.set(k, x);
                if !odd && (k - delta).abs() <= d && x + self.forward.get(delta - k) >= n {
                    return Some((old.end - x as usize, new.end - y as usize));
                }
                k -= 2;
            }
        }
        None
    }
}
