//! MMPX 2x pixel-art magnification.
//!
//! Each source pixel `E` becomes a 2x2 block `J K / L M`. Blocks start as
//! copies of `E` and rules over the 5x5 neighbourhood (1:1 slopes,
//! intersections, triangle tips, 2:1 slopes) bend them toward neighbours
//! to smooth diagonal edges. Sampling clamps at the borders.
//!
//! Neighbourhood names, with `y` growing downward:
//!
//! ```text
//!         P
//!     A   B   C
//! Q   D   E   F   R
//!     G   H   I
//!         S
//! ```

use crate::types::{Colour, PixelBuffer};

/// Rows counted from the top, clamped at the edges.
struct Grid<'a> {
    buffer: &'a PixelBuffer,
    width: i64,
    height: i64,
}

impl Grid<'_> {
    fn at(&self, x: i64, y: i64) -> Colour {
        let x = x.clamp(0, self.width - 1);
        let y = y.clamp(0, self.height - 1);
        self.buffer.pixel(x as u32, (self.height - 1 - y) as u32)
    }
}

fn luma(c: Colour) -> u32 {
    c.sum()
}

fn all_eq2(b: Colour, a0: Colour, a1: Colour) -> bool {
    b == a0 && b == a1
}

fn all_eq3(b: Colour, a0: Colour, a1: Colour, a2: Colour) -> bool {
    b == a0 && b == a1 && b == a2
}

fn all_eq4(b: Colour, a0: Colour, a1: Colour, a2: Colour, a3: Colour) -> bool {
    b == a0 && b == a1 && b == a2 && b == a3
}

fn any_eq3(b: Colour, a0: Colour, a1: Colour, a2: Colour) -> bool {
    b == a0 || b == a1 || b == a2
}

fn none_eq2(b: Colour, a0: Colour, a1: Colour) -> bool {
    b != a0 && b != a1
}

fn none_eq4(b: Colour, a0: Colour, a1: Colour, a2: Colour, a3: Colour) -> bool {
    b != a0 && b != a1 && b != a2 && b != a3
}

/// The 2x2 output block `[J, K, L, M]` for the source pixel at `(x, y)`.
fn block(src: &Grid<'_>, x: i64, y: i64) -> [Colour; 4] {
    let at = |dx: i64, dy: i64| src.at(x + dx, y + dy);

    let (a, b, c) = (at(-1, -1), at(0, -1), at(1, -1));
    let (d, e, f) = (at(-1, 0), at(0, 0), at(1, 0));
    let (g, h, i) = (at(-1, 1), at(0, 1), at(1, 1));

    let (mut j, mut k, mut l, mut m) = (e, e, e, e);

    if [a, b, c, d, f, g, h, i].iter().all(|&n| n == e) {
        return [j, k, l, m];
    }

    let (p, s) = (at(0, -2), at(0, 2));
    let (q, r) = (at(-2, 0), at(2, 0));
    let (bl, dl, el, fl, hl) = (luma(b), luma(d), luma(e), luma(f), luma(h));

    // 1:1 slope
    if (d == b && d != h && d != f)
        && (el >= dl || e == a)
        && any_eq3(e, a, c, g)
        && (el < dl || a != d || e != p || e != q)
    {
        j = d;
    }
    if (b == f && b != d && b != h)
        && (el >= bl || e == c)
        && any_eq3(e, a, c, i)
        && (el < bl || c != b || e != p || e != r)
    {
        k = b;
    }
    if (h == d && h != f && h != b)
        && (el >= hl || e == g)
        && any_eq3(e, a, g, i)
        && (el < hl || g != h || e != s || e != q)
    {
        l = h;
    }
    if (f == h && f != b && f != d)
        && (el >= fl || e == i)
        && any_eq3(e, c, g, i)
        && (el < fl || i != h || e != r || e != s)
    {
        m = f;
    }

    // intersections
    if e != f && all_eq4(e, c, i, d, q) && all_eq2(f, b, h) && f != at(3, 0) {
        k = f;
        m = f;
    }
    if e != d && all_eq4(e, a, g, f, r) && all_eq2(d, b, h) && d != at(-3, 0) {
        j = d;
        l = d;
    }
    if e != h && all_eq4(e, g, i, b, p) && all_eq2(h, d, f) && h != at(0, 3) {
        l = h;
        m = h;
    }
    if e != b && all_eq4(e, a, c, h, s) && all_eq2(b, d, f) && b != at(0, -3) {
        j = b;
        k = b;
    }

    // triangle tips
    if bl < el && all_eq4(e, g, h, i, s) && none_eq4(e, a, d, c, f) {
        j = b;
        k = b;
    }
    if hl < el && all_eq4(e, a, b, c, p) && none_eq4(e, d, g, i, f) {
        l = h;
        m = h;
    }
    if fl < el && all_eq4(e, a, d, g, q) && none_eq4(e, b, c, i, h) {
        k = f;
        m = f;
    }
    if dl < el && all_eq4(e, c, f, i, r) && none_eq4(e, b, a, g, h) {
        j = d;
        l = d;
    }

    // 2:1 slopes
    if h != b {
        if h != a && h != e && h != c {
            if all_eq3(h, g, f, r) && none_eq2(h, d, at(2, -1)) {
                l = m;
            }
            if all_eq3(h, i, d, q) && none_eq2(h, f, at(-2, -1)) {
                m = l;
            }
        }
        if b != i && b != g && b != e {
            if all_eq3(b, a, f, r) && none_eq2(b, d, at(2, 1)) {
                j = k;
            }
            if all_eq3(b, c, d, q) && none_eq2(b, f, at(-2, 1)) {
                k = j;
            }
        }
    }
    if f != d {
        if d != i && d != e && d != c {
            if all_eq3(d, a, h, s) && none_eq2(d, b, at(1, 2)) {
                j = l;
            }
            if all_eq3(d, g, b, p) && none_eq2(d, h, at(1, -2)) {
                l = j;
            }
        }
        if f != e && f != a && f != g {
            if all_eq3(f, c, h, s) && none_eq2(f, b, at(-1, 2)) {
                k = m;
            }
            if all_eq3(f, i, b, p) && none_eq2(f, h, at(-1, -2)) {
                m = k;
            }
        }
    }

    [j, k, l, m]
}

/// Magnify `buffer` to twice its width and height.
pub fn magnify(buffer: &PixelBuffer) -> PixelBuffer {
    let (width, height) = buffer.shape();
    let mut out = PixelBuffer::filled(width * 2, height * 2, Colour::BLACK);
    if buffer.is_empty() {
        return out;
    }

    let grid = Grid {
        buffer,
        width: width as i64,
        height: height as i64,
    };
    let out_height = height * 2;

    for row in 0..height {
        for x in 0..width {
            let [j, k, l, m] = block(&grid, x as i64, row as i64);
            // output rows also count from the top
            let top = out_height - 1 - row * 2;
            out.set(x * 2, top, j);
            out.set(x * 2 + 1, top, k);
            out.set(x * 2, top - 1, l);
            out.set(x * 2 + 1, top - 1, m);
        }
    }

    out
}
