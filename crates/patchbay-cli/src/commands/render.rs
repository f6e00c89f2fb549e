//! Offline render of a session to a WAV file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use indicatif::{ProgressBar, ProgressStyle};

use super::common::{CHANNELS, Renderer, open_session, peak, rms};

#[derive(Args)]
pub struct RenderArgs {
    /// Session file to render
    #[arg(value_name = "SESSION")]
    session: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Length of the render in seconds
    #[arg(short, long, default_value_t = 5.0)]
    seconds: f32,

    /// Output bit depth (16 or 32 for float)
    #[arg(long, default_value_t = 32)]
    bit_depth: u16,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        anyhow::bail!("--seconds must be positive, got {}", args.seconds);
    }
    let sample_format = match args.bit_depth {
        16 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => anyhow::bail!("unsupported bit depth {other} (use 16 or 32)"),
    };

    let (session, controller) = open_session(&args.session)?;
    let sample_rate = session.engine.sample_rate;
    let block_size = session.engine.block_size;
    let total_frames = (f64::from(args.seconds) * f64::from(sample_rate)).round() as usize;

    println!(
        "Rendering '{}' for {:.2}s at {} Hz...",
        session.name, args.seconds, sample_rate
    );

    let spec = WavSpec {
        channels: CHANNELS as u16,
        sample_rate,
        bits_per_sample: args.bit_depth,
        sample_format,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let pb = ProgressBar::new(total_frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut renderer = Renderer::new(
        controller.render_handle(),
        block_size,
        session.engine.max_events_per_block,
    );
    let mut peaks = [0.0f32; CHANNELS];
    let mut sum_squares = [0.0f64; CHANNELS];
    let mut remaining = total_frames;

    while remaining > 0 {
        let frames = remaining.min(renderer.capacity());
        let (left, right) = renderer.render(frames);
        for (ch, channel) in [left, right].into_iter().enumerate() {
            peaks[ch] = peaks[ch].max(peak(channel));
            let r = f64::from(rms(channel));
            sum_squares[ch] += r * r * channel.len() as f64;
        }
        for (l, r) in left.iter().zip(right) {
            write_sample(&mut writer, *l, sample_format)?;
            write_sample(&mut writer, *r, sample_format)?;
        }
        remaining -= frames;
        pb.inc(frames as u64);
    }

    writer.finalize()?;
    pb.finish_with_message("done");

    println!();
    println!("Wrote {}", args.output.display());
    for (ch, label) in ["L", "R"].iter().enumerate() {
        let rms = if total_frames == 0 {
            0.0
        } else {
            (sum_squares[ch] / total_frames as f64).sqrt()
        };
        println!("  {label}: peak {:.3}, rms {rms:.3}", peaks[ch]);
    }
    Ok(())
}

fn write_sample<W: std::io::Write + std::io::Seek>(
    writer: &mut WavWriter<W>,
    sample: f32,
    format: SampleFormat,
) -> Result<(), hound::Error> {
    match format {
        SampleFormat::Float => writer.write_sample(sample),
        SampleFormat::Int => {
            let max = f32::from(i16::MAX);
            writer.write_sample((sample * max).clamp(-max - 1.0, max) as i16)
        }
    }
}
