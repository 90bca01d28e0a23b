// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle predicates shared by tile construction, patching, and hit testing.

use kurbo::{Point, Rect};

/// Half-open overlap test: `a.min < b.max && a.max > b.min` on both axes.
///
/// Two rectangles that only share an edge do not overlap, so a primitive that
/// ends exactly on a tile boundary belongs to one tile only.
#[inline]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && a.x1 > b.x0 && a.y0 < b.y1 && a.y1 > b.y0
}

/// Closed containment test used for pointer hits.
#[inline]
pub fn contains(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Union of `rects` padded by `margin`, or [`Rect::ZERO`] when empty.
pub fn padded_union(rects: impl IntoIterator<Item = Rect>, margin: f64) -> Rect {
    let mut it = rects.into_iter();
    let Some(first) = it.next() else {
        return Rect::ZERO;
    };
    it.fold(first, |acc, r| acc.union(r))
        .inflate(margin, margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_edge_is_not_an_overlap() {
        let left = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!overlaps(left, right));
        assert!(overlaps(left, Rect::new(9.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn degenerate_rect_inside_overlaps() {
        let cell = Rect::new(0.0, 0.0, 10.0, 10.0);
        let hline = Rect::new(2.0, 5.0, 8.0, 5.0);
        assert!(overlaps(hline, cell));
    }

    #[test]
    fn empty_union_is_zero() {
        assert_eq!(padded_union([], 2.0), Rect::ZERO);
        assert_eq!(
            padded_union([Rect::new(0.0, 0.0, 100.0, 100.0)], 2.0),
            Rect::new(-2.0, -2.0, 102.0, 102.0)
        );
    }
}
