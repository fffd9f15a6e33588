use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glam::Vec3;
use sceneview_common::{Color, NodeId, PickRegion, Transform, Viewport};
use sceneview_gfx::{EditorCamera, SoftwareProvider};
use sceneview_render::nearest_first;
use sceneview_scene::{Pass, RenderComponent, Scene, SceneNode, Shape};
use sceneview_viewport::{ViewportConfig, ViewportSession};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sceneview-cli", about = "Render scenes offscreen and pick objects")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SceneArgs {
    /// Scene JSON file; a built-in demo scene when omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,
    /// Viewport config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "640")]
    width: u32,
    #[arg(long, default_value = "480")]
    height: u32,
    /// Camera position as x,y,z
    #[arg(long, value_delimiter = ',', num_args = 3, default_values_t = [0.0, 4.0, 8.0])]
    eye: Vec<f32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Render a scene to a PNG file
    Render {
        #[command(flatten)]
        scene: SceneArgs,
        /// Output PNG path
        #[arg(short, long, default_value = "frame.png")]
        out: PathBuf,
        /// Names or ids of nodes to select before rendering
        #[arg(long)]
        select: Vec<String>,
    },
    /// List what lies under a point or inside a rectangle
    Pick {
        #[command(flatten)]
        scene: SceneArgs,
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        /// Opposite corner for a rectangle pick
        #[arg(long, requires = "y2")]
        x2: Option<f32>,
        #[arg(long, requires = "x2")]
        y2: Option<f32>,
    },
    /// Write the built-in demo scene as JSON
    DemoScene {
        #[arg(short, long, default_value = "scene.json")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("sceneview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("gfx: {}", sceneview_gfx::crate_info());
            println!("scene: {}", sceneview_scene::crate_info());
            println!("render: {}", sceneview_render::crate_info());
            println!("input: {}", sceneview_input::crate_info());
            println!("graph: {}", sceneview_graph::crate_info());
            println!("viewport: {}", sceneview_viewport::crate_info());
        }
        Commands::Render { scene, out, select } => {
            let mut session = open_session(&scene)?;
            if !select.is_empty() {
                let current = session.scene()?;
                let ids = select
                    .iter()
                    .map(|key| lookup(&current, key))
                    .collect::<anyhow::Result<BTreeSet<_>>>()?;
                session.set_selection(ids)?;
            }
            let Some(frame) = session.render()? else {
                bail!("nothing rendered: empty viewport or no drawing context");
            };
            frame
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            let stats = session.stats();
            println!(
                "Rendered {}x{} to {} in {:?}",
                frame.width(),
                frame.height(),
                out.display(),
                stats.last_frame_time
            );
        }
        Commands::Pick { scene, x, y, x2, y2 } => {
            let mut session = open_session(&scene)?;
            let region = match (x2, y2) {
                (Some(x2), Some(y2)) => PickRegion::around(
                    (x + x2) * 0.5,
                    (y + y2) * 0.5,
                    (x2 - x).abs(),
                    (y2 - y).abs(),
                ),
                _ => PickRegion::around(x, y, session.config().min_pick_size, session.config().min_pick_size),
            };
            let hits = nearest_first(session.pick(Some(region))?);
            if hits.is_empty() {
                println!("No hits");
            }
            let current = session.scene()?;
            for hit in &hits {
                let id = hit.renderable.node_id;
                let name = current
                    .find(id)
                    .and_then(|node| node.name.clone())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} {name:<12} pass={} depth={:#010x}",
                    id.short(),
                    hit.pass.name(),
                    hit.record.min_depth
                );
            }
        }
        Commands::DemoScene { out } => {
            let scene = demo_scene()?;
            scene.save(&out)?;
            println!("Wrote {} nodes to {}", scene.node_count(), out.display());
        }
    }

    Ok(())
}

fn open_session(args: &SceneArgs) -> anyhow::Result<ViewportSession<SoftwareProvider>> {
    let scene = match &args.scene {
        Some(path) => load_scene(path)?,
        None => demo_scene()?,
    };
    let config = match &args.config {
        Some(path) => ViewportConfig::load(path)?,
        None => ViewportConfig::default(),
    };
    let [ex, ey, ez] = args.eye[..] else {
        bail!("--eye takes exactly three components");
    };
    let camera = EditorCamera::look_at(Vec3::new(ex, ey, ez), Vec3::ZERO);
    let provider = SoftwareProvider::new(args.width, args.height);
    let viewport = Viewport::from_size(args.width, args.height);
    tracing::debug!(nodes = scene.node_count(), width = args.width, height = args.height, "opening session");
    Ok(ViewportSession::new(provider, scene, camera, viewport, config)?)
}

fn load_scene(path: &Path) -> anyhow::Result<Scene> {
    Scene::load(path).with_context(|| format!("loading scene {}", path.display()))
}

/// Resolve a node by name, falling back to a full or short id.
fn lookup(scene: &Scene, key: &str) -> anyhow::Result<NodeId> {
    let mut found = None;
    scene.root.walk(&mut |node| {
        let matches = node.name.as_deref() == Some(key)
            || node.id.short() == key
            || node.id.0.to_string() == key;
        if matches && found.is_none() {
            found = Some(node.id);
        }
    });
    found.with_context(|| format!("no node named {key:?}"))
}

fn demo_scene() -> anyhow::Result<Scene> {
    let solid = [Pass::Opaque, Pass::Outline, Pass::Selection];
    let cube = |name: &str, x: f32, color: Color| {
        SceneNode::new()
            .named(name)
            .with_transform(Transform::from_position(Vec3::new(x, 0.5, 0.0)))
            .with_renderable(RenderComponent::new(Shape::Cube { size: 1.0, color }, solid))
    };
    let floor = SceneNode::new().named("floor").with_renderable(RenderComponent::new(
        Shape::Grid {
            half_extent: 5,
            spacing: 1.0,
            color: Color::GRAY,
        },
        [Pass::Opaque],
    ));
    let stack = cube("stack", 2.0, Color::BLUE).with_child(
        SceneNode::new()
            .named("stack-top")
            .with_transform(Transform {
                position: Vec3::new(0.0, 1.0, 0.0),
                scale: Vec3::splat(0.6),
                ..Transform::default()
            })
            .with_renderable(RenderComponent::new(
                Shape::Cube {
                    size: 1.0,
                    color: Color::WHITE,
                },
                solid,
            )),
    );
    let root = SceneNode::new()
        .named("root")
        .with_child(floor)
        .with_child(cube("left", -2.0, Color::RED))
        .with_child(cube("middle", 0.0, Color::GREEN))
        .with_child(stack);
    Ok(Scene::new(root)?)
}
