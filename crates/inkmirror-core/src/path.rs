//! SVG path construction from outline polygons.

use kurbo::Point;
use std::fmt::Write;

/// Fewer vertices than this cannot be curve-fit.
const MIN_OUTLINE_POINTS: usize = 4;

/// Convert an outline polygon into SVG path data.
///
/// The curve passes through the midpoints of consecutive vertices using a
/// quadratic segment followed by smooth quadratic (`T`) continuations.
/// Coordinates are written with two decimals so identical geometry always
/// produces identical strings.
pub fn to_svg_path(outline: &[Point], closed: bool) -> String {
    if outline.len() < MIN_OUTLINE_POINTS {
        return String::new();
    }

    let (a, b, c) = (outline[0], outline[1], outline[2]);
    let mid = b.midpoint(c);

    let mut d = String::with_capacity(outline.len() * 14 + 32);
    // Writing to a String cannot fail.
    let _ = write!(
        d,
        "M{:.2},{:.2} Q{:.2},{:.2} {:.2},{:.2} T",
        a.x, a.y, b.x, b.y, mid.x, mid.y
    );

    for pair in outline[2..].windows(2) {
        let m = pair[0].midpoint(pair[1]);
        let _ = write!(d, "{:.2},{:.2} ", m.x, m.y);
    }

    if closed {
        d.push('Z');
    }
    d
}
