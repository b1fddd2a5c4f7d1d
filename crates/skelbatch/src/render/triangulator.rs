//! Splitting clip polygons into convex pieces.
//!
//! Polygons are flat `x, y` lists. Everything here expects counter-clockwise
//! winding (positive signed area); `make_counter_clockwise` normalizes input.

/// Twice the signed area of triangle `a, b, c`; positive when `c` is left of `a -> b`.
pub(crate) fn cross(ax: f32, ay: f32, bx: f32, by: f32, cx: f32, cy: f32) -> f32 {
    (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
}

fn point(polygon: &[f32], index: usize) -> (f32, f32) {
    (polygon[index * 2], polygon[index * 2 + 1])
}

/// Shoelace area; positive for counter-clockwise polygons.
pub fn signed_area(polygon: &[f32]) -> f32 {
    let n = polygon.len() / 2;
    let mut twice = 0.0;
    for i in 0..n {
        let (x1, y1) = point(polygon, i);
        let (x2, y2) = point(polygon, (i + 1) % n);
        twice += x1 * y2 - x2 * y1;
    }
    twice * 0.5
}

pub fn make_counter_clockwise(polygon: &mut [f32]) {
    if signed_area(polygon) >= 0.0 {
        return;
    }
    let n = polygon.len() / 2;
    for i in 0..n / 2 {
        let j = n - 1 - i;
        polygon.swap(i * 2, j * 2);
        polygon.swap(i * 2 + 1, j * 2 + 1);
    }
}

/// True when every corner of the ring turns left (collinear corners allowed).
fn ring_is_convex(polygon: &[f32], ring: &[usize]) -> bool {
    let n = ring.len();
    (0..n).all(|i| {
        let (ax, ay) = point(polygon, ring[(i + n - 1) % n]);
        let (bx, by) = point(polygon, ring[i]);
        let (cx, cy) = point(polygon, ring[(i + 1) % n]);
        cross(ax, ay, bx, by, cx, cy) >= 0.0
    })
}

pub fn is_convex(polygon: &[f32]) -> bool {
    let ring: Vec<usize> = (0..polygon.len() / 2).collect();
    ring.len() >= 3 && ring_is_convex(polygon, &ring)
}

fn is_reflex(polygon: &[f32], ring: &[usize], i: usize) -> bool {
    let n = ring.len();
    let (ax, ay) = point(polygon, ring[(i + n - 1) % n]);
    let (bx, by) = point(polygon, ring[i]);
    let (cx, cy) = point(polygon, ring[(i + 1) % n]);
    cross(ax, ay, bx, by, cx, cy) < 0.0
}

fn is_ear(polygon: &[f32], ring: &[usize], reflex: &[bool], i: usize) -> bool {
    if reflex[i] {
        return false;
    }
    let n = ring.len();
    let prev = (i + n - 1) % n;
    let next = (i + 1) % n;
    let (ax, ay) = point(polygon, ring[prev]);
    let (bx, by) = point(polygon, ring[i]);
    let (cx, cy) = point(polygon, ring[next]);
    // Only reflex vertices can fall inside a candidate ear.
    !(0..n)
        .filter(|&j| j != prev && j != i && j != next && reflex[j])
        .any(|j| {
            let (px, py) = point(polygon, ring[j]);
            cross(ax, ay, bx, by, px, py) >= 0.0
                && cross(bx, by, cx, cy, px, py) >= 0.0
                && cross(cx, cy, ax, ay, px, py) >= 0.0
        })
}

/// Merge two counter-clockwise rings sharing an edge, if the union stays convex.
fn merge_convex(polygon: &[f32], a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    for ai in 0..a.len() {
        let u = a[ai];
        let v = a[(ai + 1) % a.len()];
        // The shared edge runs v -> u in b.
        let Some(bj) = (0..b.len()).find(|&bj| b[bj] == v && b[(bj + 1) % b.len()] == u) else {
            continue;
        };
        let mut merged = Vec::with_capacity(a.len() + b.len() - 2);
        merged.extend((0..a.len()).map(|k| a[(ai + 1 + k) % a.len()]));
        merged.extend((0..b.len() - 2).map(|k| b[(bj + 2 + k) % b.len()]));
        return ring_is_convex(polygon, &merged).then_some(merged);
    }
    None
}

/// Ear-clipping triangulator with reusable buffers.
#[derive(Debug, Default)]
pub struct Triangulator {
    ring: Vec<usize>,
    reflex: Vec<bool>,
    triangles: Vec<usize>,
}

impl Triangulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangulate a simple counter-clockwise polygon.
    ///
    /// Returns vertex indices, three per triangle. Self-intersecting input
    /// still yields `n - 2` triangles, though they may overlap.
    pub fn triangulate(&mut self, polygon: &[f32]) -> &[usize] {
        let n = polygon.len() / 2;
        self.triangles.clear();
        if n < 3 {
            return &self.triangles;
        }

        self.ring.clear();
        self.ring.extend(0..n);
        self.reflex.clear();
        for i in 0..n {
            let reflex = is_reflex(polygon, &self.ring, i);
            self.reflex.push(reflex);
        }

        while self.ring.len() > 3 {
            let m = self.ring.len();
            let ear = (0..m)
                .find(|&i| is_ear(polygon, &self.ring, &self.reflex, i))
                .or_else(|| (0..m).find(|&i| !self.reflex[i]))
                .unwrap_or(0);

            let prev = (ear + m - 1) % m;
            let next = (ear + 1) % m;
            self.triangles
                .extend([self.ring[prev], self.ring[ear], self.ring[next]]);
            self.ring.remove(ear);
            self.reflex.remove(ear);

            let m = m - 1;
            let prev = (ear + m - 1) % m;
            let next = ear % m;
            self.reflex[prev] = is_reflex(polygon, &self.ring, prev);
            self.reflex[next] = is_reflex(polygon, &self.ring, next);
        }
        self.triangles
            .extend([self.ring[0], self.ring[1], self.ring[2]]);
        &self.triangles
    }

    /// Split a counter-clockwise polygon into convex counter-clockwise pieces.
    ///
    /// A convex polygon comes back whole. Otherwise the triangulation is
    /// greedily merged along shared edges while the result stays convex.
    pub fn decompose(&mut self, polygon: &[f32]) -> Vec<Vec<f32>> {
        if polygon.len() < 6 {
            return Vec::new();
        }
        if is_convex(polygon) {
            return vec![polygon.to_vec()];
        }

        let mut pieces: Vec<Vec<usize>> = self
            .triangulate(polygon)
            .chunks_exact(3)
            .map(<[usize]>::to_vec)
            .collect();

        let mut i = 0;
        while i < pieces.len() {
            let mut j = i + 1;
            while j < pieces.len() {
                match merge_convex(polygon, &pieces[i], &pieces[j]) {
                    Some(merged) => {
                        pieces[i] = merged;
                        pieces.swap_remove(j);
                        j = i + 1;
                    }
                    None => j += 1,
                }
            }
            i += 1;
        }

        pieces
            .iter()
            .map(|ring| ring.iter().flat_map(|&v| [polygon[v * 2], polygon[v * 2 + 1]]).collect())
            .collect()
    }
}
