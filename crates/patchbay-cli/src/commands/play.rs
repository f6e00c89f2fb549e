//! Real-time playback of a session on an output device.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use patchbay_core::RenderConfig;

use super::common::{Renderer, open_session};

#[derive(Args)]
pub struct PlayArgs {
    /// Session file to play
    #[arg(value_name = "SESSION")]
    session: PathBuf,

    /// Stop after this many seconds (default: until Ctrl+C)
    #[arg(short, long)]
    seconds: Option<f32>,

    /// Output device (exact or partial name)
    #[arg(short, long)]
    output: Option<String>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let (session, mut controller) = open_session(&args.session)?;

    let host = cpal::default_host();
    let device = match &args.output {
        Some(name) => find_output_device(&host, name)?,
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no default output device"))?,
    };
    let device_name = device
        .description()
        .map(|d| d.name().to_string())
        .unwrap_or_else(|_| "unknown device".to_string());
    let config = device
        .default_output_config()
        .context("output device has no default config")?;
    let device_rate = config.sample_rate();
    let channels = usize::from(config.channels());

    if device_rate != session.engine.sample_rate {
        tracing::warn!(
            session_rate = session.engine.sample_rate,
            device_rate,
            "device rate differs from session, re-preparing"
        );
        controller.configure(RenderConfig {
            sample_rate: device_rate as f32,
            ..controller.config()
        })?;
    }

    println!(
        "Playing '{}' on {device_name} ({device_rate} Hz, {channels} ch). Press Ctrl+C to stop.",
        session.name
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let frames_played = Arc::new(AtomicUsize::new(0));
    let cb_running = Arc::clone(&running);
    let cb_frames = Arc::clone(&frames_played);
    let mut renderer = Renderer::new(
        controller.render_handle(),
        controller.config().block_size,
        session.engine.max_events_per_block,
    );

    let stream = device
        .build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !cb_running.load(Ordering::Relaxed) {
                    data.fill(0.0);
                    return;
                }
                let total = data.len() / channels;
                let mut frame = 0;
                while frame < total {
                    let (left, right) = renderer.render(total - frame);
                    for (i, (l, r)) in left.iter().zip(right).enumerate() {
                        let idx = (frame + i) * channels;
                        match channels {
                            1 => data[idx] = (l + r) * 0.5,
                            _ => {
                                data[idx] = *l;
                                data[idx + 1] = *r;
                                data[idx + 2..idx + channels].fill(0.0);
                            }
                        }
                    }
                    frame += left.len();
                }
                cb_frames.fetch_add(total, Ordering::Relaxed);
            },
            |err| tracing::error!("output stream error: {err}"),
            None,
        )
        .context("failed to build output stream")?;
    stream.play().context("failed to start output stream")?;

    let limit = args
        .seconds
        .map(|s| (f64::from(s.max(0.0)) * f64::from(device_rate)) as usize);
    while running.load(Ordering::SeqCst) {
        if limit.is_some_and(|l| frames_played.load(Ordering::Relaxed) >= l) {
            break;
        }
        controller.collect_garbage();
        std::thread::sleep(Duration::from_millis(100));
    }

    drop(stream);
    println!("Done!");
    Ok(())
}

fn find_output_device(host: &cpal::Host, name: &str) -> anyhow::Result<cpal::Device> {
    let needle = name.to_lowercase();
    host.output_devices()?
        .find(|d| {
            d.description()
                .is_ok_and(|desc| desc.name().to_lowercase().contains(&needle))
        })
        .ok_or_else(|| anyhow::anyhow!("no output device matching '{name}'"))
}
