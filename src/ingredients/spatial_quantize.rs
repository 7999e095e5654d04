//! Spatial colour quantization.
//!
//! Chooses a small palette and a dithered assignment of pixels to it at the
//! same time, by minimising the difference between the source and the
//! output as seen through a small Gaussian blur filter. The minimisation is
//! a mean-field simulated anneal run coarse to fine:
//!
//! 1. The image is block-averaged into a pyramid of coarser levels.
//! 2. Starting at the coarsest level, each pixel holds a probability for
//!    every palette entry. Sweeps update those probabilities from the
//!    neighbours' expected colours at the current temperature, and the
//!    palette is re-solved between iterations.
//! 3. Probabilities are copied down to the next finer level and the anneal
//!    continues with a lower temperature.
//! 4. A final zero-temperature sweep settles each pixel on one entry.
//!
//! Everything random comes from a single seeded generator, so the same
//! input and seed always give the same output.

use palette::Srgb;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cancel::CancelToken;
use crate::error::{PierogisError, Result};
use crate::types::{Colour, Palette, PixelBuffer};

/// Levels stop coarsening once either side is at most this long.
const COARSEST_SIDE: usize = 16;

/// Largest supported palette.
pub const MAX_PALETTE_SIZE: u32 = 256;

/// Ridge added to the palette system so unused entries stay put.
const RIDGE: f64 = 1e-9;

/// Probabilities below this are skipped when building the palette system.
const NEGLIGIBLE: f64 = 1e-9;

type Rgb = [f64; 3];

/// Spatial quantization parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpatialQuantizeParams {
    /// Number of colours to choose.
    pub palette_size: u32,
    /// Iterations at each coarseness level.
    pub iterations: u32,
    /// Sweeps at each temperature.
    pub repeats: u32,
    /// Starting temperature (around 1).
    pub initial_temp: f64,
    /// Final temperature (near but above 0).
    pub final_temp: f64,
    /// Blur filter side: 1, 3 or 5.
    pub filter_size: u32,
    /// Relative dithering strength (0.5 to 1.5 is typical).
    pub dithering_level: f64,
    pub seed: u64,
    /// Fixed palette to dither to instead of choosing one.
    pub palette: Option<Palette>,
}

impl Default for SpatialQuantizeParams {
    fn default() -> Self {
        Self {
            palette_size: 8,
            iterations: 3,
            repeats: 1,
            initial_temp: 1.0,
            final_temp: 0.001,
            filter_size: 3,
            dithering_level: 0.8,
            seed: 0,
            palette: None,
        }
    }
}

/// Spatial quantization ingredient.
#[derive(Debug, Clone)]
pub struct SpatialQuantize {
    params: SpatialQuantizeParams,
    cancel: Option<CancelToken>,
}

impl SpatialQuantize {
    /// Validate `params`.
    pub fn new(params: SpatialQuantizeParams) -> Result<Self> {
        let invalid = |message: String, help: &str| PierogisError::InvalidParameter {
            message,
            help: Some(help.to_string()),
        };

        if params.palette_size == 0 || params.palette_size > MAX_PALETTE_SIZE {
            return Err(invalid(
                format!("palette size must be 1..={}, got {}", MAX_PALETTE_SIZE, params.palette_size),
                "Pick a palette size between 1 and 256",
            ));
        }
        if let Some(palette) = &params.palette {
            if palette.len() > MAX_PALETTE_SIZE as usize {
                return Err(invalid(
                    format!("fixed palette has {} colours, the limit is {}", palette.len(), MAX_PALETTE_SIZE),
                    "Pass at most 256 palette colours",
                ));
            }
        }
        if params.iterations == 0 || params.repeats == 0 {
            return Err(invalid(
                "iterations and repeats must be at least 1".to_string(),
                "The defaults are 3 iterations and 1 repeat",
            ));
        }
        if !(params.final_temp > 0.0 && params.final_temp < params.initial_temp)
            || !params.initial_temp.is_finite()
        {
            return Err(invalid(
                format!(
                    "temperatures must satisfy 0 < final < initial, got {} and {}",
                    params.final_temp, params.initial_temp
                ),
                "The defaults are 1.0 and 0.001",
            ));
        }
        if !matches!(params.filter_size, 1 | 3 | 5) {
            return Err(invalid(
                format!("filter size must be 1, 3 or 5, got {}", params.filter_size),
                "The default filter size is 3",
            ));
        }
        if params.dithering_level <= 0.0 || !params.dithering_level.is_finite() {
            return Err(invalid(
                format!("dithering level must be positive, got {}", params.dithering_level),
                "Values between 0.5 and 1.5 work well",
            ));
        }

        Ok(Self {
            params,
            cancel: None,
        })
    }

    /// Poll `token` between annealing sweeps.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn params(&self) -> &SpatialQuantizeParams {
        &self.params
    }

    #[tracing::instrument(skip_all, fields(width = buffer.width(), height = buffer.height()))]
    pub fn cook(&self, buffer: &PixelBuffer) -> Result<PixelBuffer> {
        if buffer.is_empty() {
            return Ok(buffer.clone());
        }

        let params = &self.params;
        let mut rng = fastrand::Rng::with_seed(params.seed);

        let (fixed, palette) = match &params.palette {
            Some(palette) => (true, palette.colours().iter().map(|&c| to_unit(c)).collect()),
            None => (
                false,
                (0..params.palette_size)
                    .map(|_| [rng.f64(), rng.f64(), rng.f64()])
                    .collect::<Vec<Rgb>>(),
            ),
        };

        let filter = Filter::new(params.filter_size as usize, params.dithering_level);
        let pyramid = Pyramid::build(buffer);

        let steps = (pyramid.levels.len() as u32 * params.iterations) as f64;
        let multiplier = (params.final_temp / params.initial_temp).powf(1.0 / steps);

        let mut anneal = Anneal {
            filter,
            palette,
            fixed,
            rng,
            cancel: self.cancel.as_ref(),
        };
        let state = anneal.run(&pyramid, params, multiplier)?;

        let colours: Vec<Colour> = anneal.palette.iter().map(|&c| from_unit(c)).collect();
        let (width, height) = buffer.shape();
        Ok(PixelBuffer::from_fn(width, height, |x, y| {
            colours[state.argmax(y as usize * width as usize + x as usize)]
        }))
    }
}

fn to_unit(c: Colour) -> Rgb {
    let (r, g, b) = Srgb::new(c.r, c.g, c.b).into_format::<f64>().into_components();
    [r, g, b]
}

fn from_unit(c: Rgb) -> Colour {
    let rgb: Srgb<u8> = Srgb::new(c[0], c[1], c[2]).into_format();
    Colour::rgb(rgb.red, rgb.green, rgb.blue)
}

fn dot(a: Rgb, b: Rgb) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// One resolution of the image.
struct Level {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Level {
    fn len(&self) -> usize {
        self.width * self.height
    }

    /// Average 2x2 blocks; odd edges average what is there.
    fn coarsen(&self) -> Level {
        let width = self.width.div_ceil(2);
        let height = self.height.div_ceil(2);
        let mut pixels = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let mut sum = [0.0; 3];
                let mut count = 0.0;
                for sy in (y * 2)..(y * 2 + 2).min(self.height) {
                    for sx in (x * 2)..(x * 2 + 2).min(self.width) {
                        let p = self.pixels[sy * self.width + sx];
                        for (s, v) in sum.iter_mut().zip(p) {
                            *s += v;
                        }
                        count += 1.0;
                    }
                }
                pixels.push(sum.map(|s| s / count));
            }
        }

        Level {
            width,
            height,
            pixels,
        }
    }
}

/// Levels from finest (index 0) to coarsest.
struct Pyramid {
    levels: Vec<Level>,
}

impl Pyramid {
    fn build(buffer: &PixelBuffer) -> Self {
        let finest = Level {
            width: buffer.width() as usize,
            height: buffer.height() as usize,
            pixels: buffer.pixels().map(to_unit).collect(),
        };

        let mut levels = vec![finest];
        while let Some(last) = levels.last() {
            if last.width <= COARSEST_SIDE || last.height <= COARSEST_SIDE {
                break;
            }
            let next = last.coarsen();
            levels.push(next);
        }

        Pyramid { levels }
    }
}

/// Autocorrelation of a normalised Gaussian blur filter.
struct Filter {
    /// `(dx, dy, weight)` for every offset with a non-zero weight, centre included.
    offsets: Vec<(i64, i64, f64)>,
    centre: f64,
}

impl Filter {
    fn new(size: usize, dithering_level: f64) -> Self {
        let radius = (size / 2) as i64;
        let spread = dithering_level * dithering_level;

        let mut weights = vec![vec![0.0; size]; size];
        let mut total = 0.0;
        for (j, row) in weights.iter_mut().enumerate() {
            for (i, w) in row.iter_mut().enumerate() {
                let dx = i as f64 - radius as f64;
                let dy = j as f64 - radius as f64;
                *w = (-(dx * dx + dy * dy).sqrt() / spread).exp();
                total += *w;
            }
        }
        for w in weights.iter_mut().flatten() {
            *w /= total;
        }

        let reach = 2 * radius;
        let mut offsets = Vec::new();
        let mut centre = 0.0;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let mut b = 0.0;
                for ky in 0..size as i64 {
                    for kx in 0..size as i64 {
                        let (ox, oy) = (kx + dx, ky + dy);
                        if ox >= 0 && oy >= 0 && ox < size as i64 && oy < size as i64 {
                            b += weights[ky as usize][kx as usize] * weights[oy as usize][ox as usize];
                        }
                    }
                }
                if dx == 0 && dy == 0 {
                    centre = b;
                }
                if b > 0.0 {
                    offsets.push((dx, dy, b));
                }
            }
        }

        Filter { offsets, centre }
    }

    /// In-bounds neighbours of `index` with their weights, centre excluded.
    fn neighbours(
        &self,
        width: usize,
        height: usize,
        index: usize,
    ) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (x, y) = ((index % width) as i64, (index / width) as i64);
        self.offsets.iter().filter_map(move |&(dx, dy, b)| {
            let (nx, ny) = (x + dx, y + dy);
            let inside = nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64;
            (inside && (dx, dy) != (0, 0)).then(|| (ny as usize * width + nx as usize, b))
        })
    }

    /// `a_i = -2 sum_j b(j - i) x_j` for every pixel of `level`.
    fn linear_terms(&self, level: &Level) -> Vec<Rgb> {
        (0..level.len())
            .map(|i| {
                let mut sum = level.pixels[i].map(|v| v * self.centre);
                for (j, b) in self.neighbours(level.width, level.height, i) {
                    for (s, v) in sum.iter_mut().zip(level.pixels[j]) {
                        *s += b * v;
                    }
                }
                sum.map(|s| -2.0 * s)
            })
            .collect()
    }
}

/// Soft assignments for one level.
struct State {
    width: usize,
    height: usize,
    colours: usize,
    /// `probabilities[i * colours + v]`.
    probabilities: Vec<f64>,
    /// Expected colour of each pixel under its probabilities.
    expected: Vec<Rgb>,
}

impl State {
    fn random(width: usize, height: usize, palette: &[Rgb], rng: &mut fastrand::Rng) -> Self {
        let colours = palette.len();
        let mut probabilities = Vec::with_capacity(width * height * colours);
        for _ in 0..width * height {
            let start = probabilities.len();
            probabilities.extend((0..colours).map(|_| rng.f64() + f64::EPSILON));
            let total: f64 = probabilities[start..].iter().sum();
            for p in &mut probabilities[start..] {
                *p /= total;
            }
        }
        let mut state = State {
            width,
            height,
            colours,
            probabilities,
            expected: Vec::new(),
        };
        state.refresh_expected(palette);
        state
    }

    /// Copy each coarse pixel's probabilities to its 2x2 block on `finer`.
    fn zoom(&self, finer: &Level, palette: &[Rgb]) -> State {
        let colours = self.colours;
        let mut probabilities = Vec::with_capacity(finer.len() * colours);
        for y in 0..finer.height {
            for x in 0..finer.width {
                let parent = (y / 2) * self.width + x / 2;
                probabilities
                    .extend_from_slice(&self.probabilities[parent * colours..(parent + 1) * colours]);
            }
        }
        let mut state = State {
            width: finer.width,
            height: finer.height,
            colours,
            probabilities,
            expected: Vec::new(),
        };
        state.refresh_expected(palette);
        state
    }

    fn row(&self, i: usize) -> &[f64] {
        &self.probabilities[i * self.colours..(i + 1) * self.colours]
    }

    fn expected_for(&self, i: usize, palette: &[Rgb]) -> Rgb {
        let mut sum = [0.0; 3];
        for (p, c) in self.row(i).iter().zip(palette) {
            for (s, v) in sum.iter_mut().zip(c) {
                *s += p * v;
            }
        }
        sum
    }

    fn refresh_expected(&mut self, palette: &[Rgb]) {
        self.expected = (0..self.width * self.height)
            .map(|i| self.expected_for(i, palette))
            .collect();
    }

    fn argmax(&self, i: usize) -> usize {
        let mut best = 0;
        for (v, &p) in self.row(i).iter().enumerate() {
            if p > self.row(i)[best] {
                best = v;
            }
        }
        best
    }
}

struct Anneal<'a> {
    filter: Filter,
    palette: Vec<Rgb>,
    fixed: bool,
    rng: fastrand::Rng,
    cancel: Option<&'a CancelToken>,
}

impl Anneal<'_> {
    fn run(
        &mut self,
        pyramid: &Pyramid,
        params: &SpatialQuantizeParams,
        multiplier: f64,
    ) -> Result<State> {
        let coarsest = pyramid.levels.len() - 1;
        let top = &pyramid.levels[coarsest];
        let mut state = State::random(top.width, top.height, &self.palette, &mut self.rng);
        let mut temperature = params.initial_temp;
        let mut linear = Vec::new();

        for depth in (0..=coarsest).rev() {
            let level = &pyramid.levels[depth];
            if depth != coarsest {
                state = state.zoom(level, &self.palette);
            }
            linear = self.filter.linear_terms(level);

            debug!(
                level = depth,
                width = level.width,
                height = level.height,
                temperature,
                "annealing level"
            );

            for _ in 0..params.iterations {
                for _ in 0..params.repeats {
                    self.sweep(&mut state, &linear, temperature)?;
                }
                if !self.fixed {
                    self.refine_palette(&state, &linear);
                    state.refresh_expected(&self.palette);
                }
                temperature *= multiplier;
            }
        }

        // settle every pixel on a single entry
        self.sweep(&mut state, &linear, 0.0)?;
        Ok(state)
    }

    /// Update every pixel's probabilities once, in a shuffled order.
    fn sweep(&mut self, state: &mut State, linear: &[Rgb], temperature: f64) -> Result<()> {
        if let Some(cancel) = self.cancel {
            cancel.check()?;
        }

        let mut order: Vec<usize> = (0..state.width * state.height).collect();
        self.rng.shuffle(&mut order);

        let colours = state.colours;
        let mut costs = vec![0.0; colours];

        for i in order {
            let mut field = [0.0; 3];
            for (j, b) in self.filter.neighbours(state.width, state.height, i) {
                for (f, v) in field.iter_mut().zip(state.expected[j]) {
                    *f += b * v;
                }
            }

            for (cost, c) in costs.iter_mut().zip(&self.palette) {
                *cost = 2.0 * dot(field, *c) + self.filter.centre * dot(*c, *c) + dot(linear[i], *c);
            }

            let row = &mut state.probabilities[i * colours..(i + 1) * colours];
            if temperature > 0.0 {
                let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
                let mut total = 0.0;
                for (p, cost) in row.iter_mut().zip(&costs) {
                    *p = (-(cost - min) / temperature).exp();
                    total += *p;
                }
                for p in row.iter_mut() {
                    *p /= total;
                }
            } else {
                let mut best = 0;
                for (v, cost) in costs.iter().enumerate() {
                    if *cost < costs[best] {
                        best = v;
                    }
                }
                for (v, p) in row.iter_mut().enumerate() {
                    *p = if v == best { 1.0 } else { 0.0 };
                }
            }

            state.expected[i] = state.expected_for(i, &self.palette);
        }

        Ok(())
    }

    /// Solve for the palette that minimises the energy under the current
    /// assignments.
    fn refine_palette(&mut self, state: &State, linear: &[Rgb]) {
        let k = self.palette.len();
        let mut system = vec![vec![0.0; k]; k];
        let mut rhs = vec![[0.0; 3]; k];

        for i in 0..state.width * state.height {
            let own: Vec<(usize, f64)> = state
                .row(i)
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, p)| p > NEGLIGIBLE)
                .collect();

            for &(v, p) in &own {
                system[v][v] += self.filter.centre * p;
                for (r, a) in rhs[v].iter_mut().zip(linear[i]) {
                    *r -= 0.5 * a * p;
                }
            }

            for (j, b) in self.filter.neighbours(state.width, state.height, i) {
                for (alpha, &q) in state.row(j).iter().enumerate() {
                    if q <= NEGLIGIBLE {
                        continue;
                    }
                    for &(v, p) in &own {
                        system[v][alpha] += b * p * q;
                    }
                }
            }
        }

        for (v, colour) in self.palette.iter().enumerate() {
            system[v][v] += RIDGE;
            for (r, c) in rhs[v].iter_mut().zip(colour) {
                *r += RIDGE * c;
            }
        }

        match solve(system, rhs) {
            Some(solved) => {
                self.palette = solved
                    .into_iter()
                    .map(|c| c.map(|v| v.clamp(0.0, 1.0)))
                    .collect();
            }
            None => trace!("palette system is singular, keeping palette"),
        }
    }
}

/// Gaussian elimination with partial pivoting on `system * x = rhs`.
fn solve(mut system: Vec<Vec<f64>>, mut rhs: Vec<Rgb>) -> Option<Vec<Rgb>> {
    let n = system.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| {
            system[a][col]
                .abs()
                .total_cmp(&system[b][col].abs())
        })?;
        if system[pivot][col].abs() < f64::EPSILON {
            return None;
        }
        system.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = system[row][col] / system[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                system[row][c] -= factor * system[col][c];
            }
            let pivot_rhs = rhs[col];
            for (r, p) in rhs[row].iter_mut().zip(pivot_rhs) {
                *r -= factor * p;
            }
        }
    }

    let mut solution = vec![[0.0; 3]; n];
    for row in (0..n).rev() {
        let mut acc = rhs[row];
        for c in (row + 1)..n {
            for (a, s) in acc.iter_mut().zip(solution[c]) {
                *a -= system[row][c] * s;
            }
        }
        solution[row] = acc.map(|a| a / system[row][row]);
    }

    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn gradient() -> PixelBuffer {
        PixelBuffer::from_fn(12, 10, |x, y| Colour::rgb((x * 20) as u8, (y * 25) as u8, 100))
    }

    fn quantize(params: SpatialQuantizeParams) -> PixelBuffer {
        SpatialQuantize::new(params).unwrap().cook(&gradient()).unwrap()
    }

    fn distinct(buffer: &PixelBuffer) -> usize {
        buffer.pixels().collect::<HashSet<_>>().len()
    }

    #[test]
    fn test_deterministic_for_seed() {
        let params = SpatialQuantizeParams {
            palette_size: 4,
            seed: 7,
            ..Default::default()
        };
        assert_eq!(quantize(params.clone()), quantize(params));
    }

    #[test]
    fn test_respects_palette_size() {
        let cooked = quantize(SpatialQuantizeParams {
            palette_size: 3,
            ..Default::default()
        });
        assert_eq!(cooked.shape(), (12, 10));
        assert!(distinct(&cooked) <= 3);
    }

    #[test]
    fn test_fixed_palette_output_is_exact() {
        let palette = Palette::new(vec![Colour::BLACK, Colour::WHITE, Colour::rgb(255, 0, 0)]).unwrap();
        let cooked = quantize(SpatialQuantizeParams {
            palette: Some(palette.clone()),
            ..Default::default()
        });
        assert!(cooked.pixels().all(|c| palette.colours().contains(&c)));
    }

    #[test]
    fn test_flat_image_stays_close() {
        let flat = PixelBuffer::filled(6, 6, Colour::rgb(200, 40, 40));
        let cooked = SpatialQuantize::new(SpatialQuantizeParams {
            palette_size: 1,
            ..Default::default()
        })
        .unwrap()
        .cook(&flat)
        .unwrap();

        let first = cooked.pixel(0, 0);
        assert!(cooked.pixels().all(|c| c == first));
        assert!(first.distance_sq(Colour::rgb(200, 40, 40)) < 3 * 4 * 4);
    }

    #[test]
    fn test_larger_image_uses_pyramid() {
        let buffer = PixelBuffer::from_fn(40, 36, |x, y| Colour::rgb((x * 6) as u8, (y * 7) as u8, 50));
        assert!(Pyramid::build(&buffer).levels.len() > 1);

        let cooked = SpatialQuantize::new(SpatialQuantizeParams {
            palette_size: 4,
            iterations: 1,
            ..Default::default()
        })
        .unwrap()
        .cook(&buffer)
        .unwrap();
        assert_eq!(cooked.shape(), (40, 36));
        assert!(distinct(&cooked) <= 4);
    }

    #[test]
    fn test_invalid_parameters() {
        for params in [
            SpatialQuantizeParams {
                palette_size: 0,
                ..Default::default()
            },
            SpatialQuantizeParams {
                palette_size: 257,
                ..Default::default()
            },
            SpatialQuantizeParams {
                final_temp: 2.0,
                ..Default::default()
            },
            SpatialQuantizeParams {
                filter_size: 2,
                ..Default::default()
            },
            SpatialQuantizeParams {
                dithering_level: 0.0,
                ..Default::default()
            },
        ] {
            let err = SpatialQuantize::new(params).unwrap_err();
            assert!(matches!(err, PierogisError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn test_fixed_palette_size_capped() {
        let palette = |n: u32| {
            Palette::new((0..n).map(|i| Colour::rgb(i as u8, (i / 256) as u8, 0)).collect()).unwrap()
        };

        let err = SpatialQuantize::new(SpatialQuantizeParams {
            palette: Some(palette(MAX_PALETTE_SIZE + 1)),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PierogisError::InvalidParameter { .. }));

        assert!(SpatialQuantize::new(SpatialQuantizeParams {
            palette: Some(palette(MAX_PALETTE_SIZE)),
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn test_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let quantize = SpatialQuantize::new(SpatialQuantizeParams::default())
            .unwrap()
            .with_cancel(token);
        assert!(matches!(quantize.cook(&gradient()), Err(PierogisError::Cancelled)));
    }

    #[test]
    fn test_solve_identity() {
        let solved = solve(
            vec![vec![2.0, 0.0], vec![0.0, 4.0]],
            vec![[2.0, 4.0, 6.0], [4.0, 8.0, 12.0]],
        )
        .unwrap();
        assert_eq!(solved, vec![[1.0, 2.0, 3.0], [1.0, 2.0, 3.0]]);
        assert!(solve(vec![vec![0.0]], vec![[1.0, 1.0, 1.0]]).is_none());
    }
}
