use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::{
    ColorRgba, Filter, GpuContext, PixelFormat, Rect, RenderSettings, RenderSystem, Texture, Vec2,
    Wrap,
};

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 768;

/// Frame after which the checker texture is written to `kiln-checker.png`.
const SAVE_FRAME: u64 = 120;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let image_path = std::env::args_os().nth(1).map(PathBuf::from);

    let mut system = RenderSystem::new(RenderSettings::default());
    system.initialize(WIDTH, HEIGHT, "kiln demo")?;
    let ctx = system.context().context("render system has no GPU context")?;

    let checker = load_checker(&ctx)?;
    let gradient = spawn_gradient_upload(ctx.clone());
    let mut gradient_tex: Option<Texture> = None;

    let photo = match image_path {
        Some(path) => Some(load_image(&ctx, &path)?),
        None => None,
    };

    let mut frame: u64 = 0;
    while system.should_continue() {
        if gradient_tex.is_none() {
            gradient_tex = gradient.try_recv().ok();
        }

        system.begin_frame();
        draw_scene(&mut system, frame, &checker, gradient_tex.as_ref(), photo.as_ref())?;
        system.end_frame();

        if frame == SAVE_FRAME {
            save_texture(&ctx, &checker, "kiln-checker.png")?;
        }
        frame += 1;
    }

    system.shutdown();
    Ok(())
}

/// 8x8 checkerboard, sampled with nearest filtering so the cells stay sharp.
fn load_checker(ctx: &GpuContext) -> Result<Texture> {
    let mut data = Vec::with_capacity(8 * 8 * 4);
    for y in 0..8u32 {
        for x in 0..8u32 {
            let v = if (x + y) % 2 == 0 { 230 } else { 40 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }

    anyhow::ensure!(ctx.take_context(false), "could not take the graphics context");
    let mut tex = Texture::new();
    let loaded = tex.load_from_data(ctx, &data, 8, 8, PixelFormat::Rgba);
    if loaded.is_ok() {
        tex.set_filter(Filter::Nearest, Filter::Nearest);
        tex.set_wrap(Wrap::Repeat, Wrap::Repeat);
    }
    ctx.release_context();
    loaded?;

    Ok(tex)
}

fn load_image(ctx: &GpuContext, path: &Path) -> Result<Texture> {
    anyhow::ensure!(ctx.take_context(false), "could not take the graphics context");
    let mut tex = Texture::new();
    let loaded = tex
        .load_from_file(ctx, path, false)
        .and_then(|()| tex.generate_mipmaps(ctx));
    if loaded.is_ok() {
        tex.set_filter(Filter::LinearMipmapLinear, Filter::Linear);
    }
    ctx.release_context();
    loaded?;

    log::info!("loaded {} ({}x{})", path.display(), tex.width(), tex.height());
    Ok(tex)
}

/// Builds a texture on a worker thread, sharing the context between frames.
fn spawn_gradient_upload(ctx: GpuContext) -> mpsc::Receiver<Texture> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (w, h) = (256u32, 64u32);
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for _y in 0..h {
            for x in 0..w {
                let t = x as f32 / (w - 1) as f32;
                data.extend_from_slice(&[(t * 255.0) as u8, 80, ((1.0 - t) * 255.0) as u8]);
            }
        }

        if !ctx.take_context(false) {
            log::error!("gradient upload: could not take the graphics context");
            return;
        }
        let mut tex = Texture::new();
        let loaded = tex.load_from_data(&ctx, &data, w, h, PixelFormat::Rgb);
        ctx.release_context();

        match loaded {
            Ok(()) => {
                let _ = tx.send(tex);
            }
            Err(e) => log::error!("gradient upload failed: {e:#}"),
        }
    });

    rx
}

fn draw_scene(
    system: &mut RenderSystem,
    frame: u64,
    checker: &Texture,
    gradient: Option<&Texture>,
    photo: Option<&Texture>,
) -> Result<()> {
    let w = system.window_width() as f32;
    let h = system.window_height() as f32;
    let t = frame as f32 / 60.0;

    system.texture_quad(
        checker,
        Rect::new(24.0, 24.0, 192.0, 192.0),
        Rect::new(0.0, 0.0, 2.0, 2.0),
        ColorRgba::white(),
    )?;

    if let Some(gradient) = gradient {
        system.texture_quad(
            gradient,
            Rect::new(240.0, 24.0, 512.0, 128.0),
            Rect::unit(),
            ColorRgba::new(1.0, 1.0, 1.0, 0.85),
        )?;
    }

    if let Some(photo) = photo {
        let scale = (w * 0.3 / photo.width() as f32).min(1.0);
        system.texture_quad(
            photo,
            Rect::new(
                w - 24.0 - photo.width() as f32 * scale,
                24.0,
                photo.width() as f32 * scale,
                photo.height() as f32 * scale,
            ),
            Rect::unit(),
            ColorRgba::white(),
        )?;
    }

    let center = Vec2::new(w * 0.5, h * 0.55);
    system.circle_filled(center, 90.0, ColorRgba::new(0.2, 0.5, 0.9, 0.8))?;
    system.circle(center, 110.0 + 10.0 * (t * 2.0).sin(), ColorRgba::white())?;

    let orbit = center + Vec2::new(t.cos(), t.sin()) * 160.0;
    system.circle_filled(orbit, 18.0, ColorRgba::new(0.95, 0.6, 0.2, 1.0))?;
    system.line(center, orbit, ColorRgba::new(1.0, 1.0, 1.0, 0.4))?;

    let wave: Vec<Vec2> = (0..=64)
        .map(|i| {
            let x = 24.0 + i as f32 * (w - 48.0) / 64.0;
            Vec2::new(x, h - 80.0 + 30.0 * (x * 0.02 + t * 3.0).sin())
        })
        .collect();
    system.lines(&wave, ColorRgba::new(0.4, 0.9, 0.5, 1.0))?;

    let star = star_points(Vec2::new(120.0, h - 200.0), 70.0, 30.0, t * 0.5);
    system.polygon_filled(&star, ColorRgba::new(0.9, 0.3, 0.4, 0.9))?;
    system.polygon(&star, ColorRgba::white())?;

    Ok(())
}

/// Five-pointed star outline (concave).
fn star_points(center: Vec2, outer: f32, inner: f32, rotation: f32) -> Vec<Vec2> {
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let a = rotation + i as f32 * TAU / 10.0;
            center + Vec2::new(a.cos(), a.sin()) * r
        })
        .collect()
}

/// Reads a texture back from the GPU and writes it to disk.
fn save_texture(ctx: &GpuContext, texture: &Texture, path: &str) -> Result<()> {
    anyhow::ensure!(ctx.take_context(false), "could not take the graphics context");
    let saved = texture.save_to_file(ctx, path, false, 90);
    ctx.release_context();
    saved?;

    log::info!("wrote {path}");
    Ok(())
}
