//! Thin CLI driver: builds a demo scene, renders it via one or more
//! `Renderer`s, and writes a PNG. Not part of the path-tracing library
//! itself — the external collaborator spec.md calls out as in-scope to
//! actually run a render end to end.
use anyhow::Context;
use clap::Parser;
use pathtrace_sdf::camera::Camera;
use pathtrace_sdf::material::{Color, Material};
use pathtrace_sdf::math::{Vec3, Z3, ZERO3};
use pathtrace_sdf::render::rpc::RpcRenderer;
use pathtrace_sdf::render::{render_with, LocalRenderer, Renderer};
use pathtrace_sdf::scene::{object, workbench, Scene, SceneBuilder, ShadowParams};
use pathtrace_sdf::sdf;
use std::sync::atomic::AtomicBool;

#[derive(Parser, Debug)]
#[command(about = "Render the demo SDF scene to a PNG")]
struct Args {
    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    #[arg(long, default_value_t = 8)]
    passes: u32,

    #[arg(long, default_value_t = 1)]
    samples: u32,

    #[arg(long, default_value_t = 8)]
    bounces: u32,

    #[arg(long, default_value = "render.png")]
    output: String,

    /// `host:port` of a remote `RpcRenderer` to add to the pool, alongside
    /// the local one. May be repeated.
    #[arg(long = "remote")]
    remotes: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let scene = demo_scene(args.width, args.height, args.passes, args.samples, args.bounces)
        .context("building demo scene")?;

    let mut renderers: Vec<Box<dyn Renderer>> = vec![Box::new(LocalRenderer::default_workers())];
    for addr in &args.remotes {
        renderers.push(Box::new(RpcRenderer::new(addr.clone())));
    }

    let cancel = AtomicBool::new(false);
    let image = render_with(&renderers, &scene, &cancel, &mut |_img, pass| {
        tracing::info!(pass, "completed pass");
    })
    .context("rendering scene")?;

    image.write_png(&args.output).context("writing output PNG")?;
    tracing::info!(path = %args.output, "wrote image");
    Ok(())
}

/// A scaled-down version of the workbench-and-elongated-cylinder rig this
/// project's original fixtures used as a smoke test scene.
fn demo_scene(width: u32, height: u32, passes: u32, samples: u32, bounces: u32) -> anyhow::Result<Scene> {
    let copper = Material::metal(Color::new(0.68, 0.45, 0.41), 0.8);

    let bench = workbench(50.0)?;
    let light = object(
        Material::light(Color::new(4.0, 4.0, 4.0)),
        sdf::translate(Vec3::new(-7.5, 0.0, 20.0), sdf::sphere(10.0)?)?,
    );
    let post = object(
        copper,
        sdf::translate(
            Vec3::new(0.0, 0.0, 0.5),
            sdf::elongate(0.5, 0.0, 0.0, sdf::cylinder(1.0, 0.5)?)?,
        )?,
    );

    let camera = Camera::new(Vec3::new(0.0, -8.0, 8.0), Vec3::new(0.0, 0.0, 0.5), Z3, 40.0, ZERO3, 0.0);

    Ok(Scene::build(SceneBuilder {
        width,
        height,
        passes,
        samples,
        bounces,
        horizon: 1000.0,
        threshold: 1e-4,
        ambient: Color::new(0.05, 0.05, 0.05),
        shadow: ShadowParams { samples: 4, radius: 0.5, intensity: 0.8, falloff: 0.2 },
        camera,
        stuff: vec![bench, light, post],
    })?)
}
