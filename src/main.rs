//! Headless demo binary for the orbray path tracing engine.

use std::time::Instant;

use glam::Vec3;
use orbray::camera::Camera;
use orbray::frame::PathTraceEngine;
use orbray::gpu::entity_buffer::WgpuHeap;
use orbray::gpu::render_context::RenderContext;
use orbray::options::Options;
use orbray::record::{rgb8_to_vec3, RayMaterial};
use orbray::scene::ObjectState;

/// Headless demo: build a small scene, tick the engine for a few seconds,
/// and log how the autofocus settles. An embedding renderer would hand each
/// frame's buffers and parameters to its compute kernel instead.
fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => match Options::load(std::path::Path::new(&path)) {
            Ok(opts) => opts,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    let ctx = match pollster::block_on(RenderContext::new()) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("GPU init failed: {e}");
            std::process::exit(1);
        }
    };
    let heap = WgpuHeap::new(&ctx.device, &ctx.queue);

    let mut engine = PathTraceEngine::new(options);

    let floor_ball = ObjectState::surface(
        Vec3::new(0.0, 0.5, 0.0),
        0.5,
        RayMaterial::new(rgb8_to_vec3(200, 60, 60), 0.8, 1.0, 1.0),
    )
    .into_handle();
    let glass_ball = ObjectState::surface(
        Vec3::new(1.5, 0.7, 0.5),
        0.7,
        RayMaterial::new(rgb8_to_vec3(230, 230, 255), 1.0, 0.1, 1.5),
    )
    .into_handle();
    let lamp = ObjectState::emitter(
        Vec3::new(0.0, 6.0, 0.0),
        1.0,
        [12.0, 11.0, 10.0],
    )
    .into_handle();
    for h in [&floor_ball, &glass_ball, &lamp] {
        let _ = engine.register(h);
    }

    let camera = Camera::new(
        Vec3::new(0.0, 1.0, -5.0),
        Vec3::new(0.0, 0.5, 0.0),
        16.0 / 9.0,
    );

    let mut last = Instant::now();
    for tick in 0..240u32 {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().max(1.0 / 240.0);
        last = now;

        // The owner mutates object state between frames; the engine picks
        // it up on refresh.
        let t = tick as f32 / 60.0;
        glass_ball.borrow_mut().position.x = 1.5 * (t * 0.7).cos();

        match engine.begin_frame(&heap, &camera, dt) {
            Ok(params) => {
                if tick % 60 == 0 {
                    log::info!(
                        "tick {tick}: {} spheres, {} lights, focal {:.3}",
                        params.sphere_count,
                        params.light_count,
                        params.focal_distance
                    );
                }
            }
            Err(e) => {
                log::error!("frame {tick} failed: {e}");
                std::process::exit(1);
            }
        }
    }

    // One extra frame just to read the final value.
    if let Ok(params) = engine.begin_frame(&heap, &camera, 1.0 / 60.0) {
        log::info!("settled focal distance: {:.3}", params.focal_distance);
    }
}
