//! The pass scheduler: tile partitioning, a thread pool pulling tiles from
//! an MPMC queue, and the per-pass merge barrier described in spec.md
//! §4.E's pass state machine (`Idle -> Dispatched -> Running -> Merged`).
//! `LocalRenderer` is the in-process worker pool; `rpc` holds the
//! network-transport sibling that forwards the same work to a remote
//! process and speaks the same `Renderer` trait.
pub mod rpc;

use crate::camera::Ray;
use crate::error::RenderError;
use crate::image::Image;
use crate::integrator;
use crate::material::BLACK;
use crate::scene::Scene;
use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::sync::atomic::{AtomicBool, Ordering};

/// Tile edge length in pixels (spec.md §4.E: "e.g. 64x64 pixels").
pub const TILE_SIZE: u32 = 64;

#[derive(Clone, Copy, Debug)]
pub struct Tile {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Partitions a `width x height` image into row-major `tile_size` tiles,
/// clipped to the image bounds at the right/bottom edges.
pub fn partition(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut y = 0;
    while y < height {
        let y1 = (y + tile_size).min(height);
        let mut x = 0;
        while x < width {
            let x1 = (x + tile_size).min(width);
            tiles.push(Tile { x0: x, y0: y, x1, y1 });
            x = x1;
        }
        y = y1;
    }
    tiles
}

/// `render(scene, pass_callback) -> image`: the one operation every
/// renderer exposes (spec.md §6). `on_pass` is called once per completed
/// pass with the running mean image so far, letting a caller checkpoint a
/// `passes = 0` (unbounded) render or preview progress.
pub trait Renderer {
    fn render(
        &self,
        scene: &Scene,
        cancel: &AtomicBool,
        on_pass: &mut dyn FnMut(&Image, u32),
    ) -> Result<Image, RenderError>;
}

/// In-process worker pool over an MPMC tile queue, the default `Renderer`.
pub struct LocalRenderer {
    pub workers: usize,
}

impl LocalRenderer {
    pub fn new(workers: usize) -> LocalRenderer {
        LocalRenderer { workers: workers.max(1) }
    }

    /// Worker count defaults to the host's logical CPU count (spec.md
    /// §4.E: "Scheduling model").
    pub fn default_workers() -> LocalRenderer {
        LocalRenderer { workers: num_cpus::get().max(1) }
    }
}

impl Renderer for LocalRenderer {
    fn render(
        &self,
        scene: &Scene,
        cancel: &AtomicBool,
        on_pass: &mut dyn FnMut(&Image, u32),
    ) -> Result<Image, RenderError> {
        let mut sum = Image::black(scene.width, scene.height);
        let mut completed: u32 = 0;

        loop {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            if scene.passes != 0 && completed >= scene.passes {
                break;
            }

            let pass_index = completed;
            let tiles = partition(scene.width, scene.height, TILE_SIZE);
            let (tx, rx) = unbounded::<Tile>();
            for t in &tiles {
                tx.send(*t).expect("receiver still held by workers below");
            }
            drop(tx);

            let pass_sum = Mutex::new(vec![0.0f64; scene.width as usize * scene.height as usize * 3]);

            std::thread::scope(|scope| {
                for worker in 0..self.workers {
                    let rx = rx.clone();
                    let pass_sum = &pass_sum;
                    scope.spawn(move || {
                        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed_for(worker as u32, pass_index));
                        while let Ok(tile) = rx.try_recv() {
                            if cancel.load(Ordering::Relaxed) {
                                break;
                            }
                            render_tile(scene, tile, &mut rng, pass_sum);
                        }
                    });
                }
            });

            let tile_total = pass_sum.into_inner();
            for (s, t) in sum.data.iter_mut().zip(tile_total.iter()) {
                *s += t;
            }
            completed += 1;

            let mean = mean_image(&sum, completed);
            on_pass(&mean, completed);
        }

        Ok(mean_image(&sum, completed.max(1)))
    }
}

/// Deterministic per-worker, per-pass RNG seed: distinct streams so no two
/// workers ever produce correlated samples, reproducible given a
/// (worker, pass) pair (spec.md §5: "RNGs are per-worker").
fn seed_for(worker: u32, pass: u32) -> u64 {
    ((pass as u64) << 32) | worker as u64
}

fn mean_image(sum: &Image, passes: u32) -> Image {
    let inv = 1.0 / passes as f64;
    Image { width: sum.width, height: sum.height, data: sum.data.iter().map(|v| v * inv).collect() }
}

/// Renders every pixel of one tile for one pass: `scene.samples` camera-ray
/// samples per pixel, averaged, then merged into the pass accumulator under
/// a single lock for the whole tile (tiles never overlap, so one lock per
/// tile is equivalent to — and cheaper than — one per pixel).
fn render_tile(scene: &Scene, tile: Tile, rng: &mut Xoshiro256PlusPlus, pass_sum: &Mutex<Vec<f64>>) {
    let w = scene.width as usize;
    let tw = (tile.x1 - tile.x0) as usize;
    let th = (tile.y1 - tile.y0) as usize;
    let mut local = vec![(0.0f64, 0.0f64, 0.0f64, 0u32); tw * th];

    let mut idx = 0;
    for y in tile.y0..tile.y1 {
        for x in tile.x0..tile.x1 {
            let mut accum = BLACK;
            let mut counted = 0u32;
            for _ in 0..scene.samples {
                let ray: Ray = scene.camera.ray_for_pixel(x, y, scene.width, scene.height, rng);
                let sample = integrator::sanitize_sample(integrator::trace_path(scene, ray, rng));
                accum = accum.add(sample);
                counted += 1;
            }
            local[idx] = (accum.r, accum.g, accum.b, counted);
            idx += 1;
        }
    }

    let mut guard = pass_sum.lock();
    let mut idx = 0;
    for y in tile.y0..tile.y1 {
        for x in tile.x0..tile.x1 {
            let (r, g, b, counted) = local[idx];
            idx += 1;
            if counted == 0 {
                continue;
            }
            let inv = 1.0 / counted as f64;
            let i = (y as usize * w + x as usize) * 3;
            guard[i] += r * inv;
            guard[i + 1] += g * inv;
            guard[i + 2] += b * inv;
        }
    }
}

/// Shards `scene.passes` across several renderers and averages their
/// results, weighted by the number of passes each one actually completed
/// (spec.md §6: "the driver shards passes across them and averages"). A
/// renderer that errors is dropped and logged rather than failing the
/// whole render; only running out of renderers is fatal.
pub fn render_with(
    renderers: &[Box<dyn Renderer>],
    scene: &Scene,
    cancel: &AtomicBool,
    on_pass: &mut dyn FnMut(&Image, u32),
) -> Result<Image, RenderError> {
    if renderers.is_empty() {
        return Err(RenderError::AllRenderersFailed);
    }
    let share = if scene.passes == 0 { 0 } else { (scene.passes / renderers.len() as u32).max(1) };

    let mut results: Vec<(Image, u32)> = Vec::new();
    for r in renderers {
        let mut sub_scene = scene.clone();
        sub_scene.passes = share;
        let mut completed = 0u32;
        match r.render(&sub_scene, cancel, &mut |_img, n| completed = n) {
            Ok(img) => results.push((img, completed.max(1))),
            Err(err) => tracing::warn!(%err, "renderer dropped out; redistributing remaining passes"),
        }
    }

    if results.is_empty() {
        return Err(RenderError::AllRenderersFailed);
    }

    let total: u32 = results.iter().map(|(_, n)| *n).sum();
    let mut combined = Image::black(scene.width, scene.height);
    for (img, n) in &results {
        let weight = *n as f64 / total as f64;
        for (c, p) in combined.data.iter_mut().zip(img.data.iter()) {
            *c += p * weight;
        }
    }
    on_pass(&combined, total);
    Ok(combined)
}
