use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use stellar_engine::color::Rgb;
use stellar_engine::particles::{
    accretion_disk, nebula_cloud, ParticleField, DISK_POINTS, NEBULA_POINTS, NEBULA_RADIUS,
};
use stellar_engine::stages::hyper_object;
use stellar_engine::{FrameDriver, FrameSnapshot, InstanceBuffer, SceneConfig};

mod cli;
mod script;

use script::ScrollSample;

#[derive(Serialize)]
struct ParticleManifest<'a> {
    seed: u64,
    nebula: &'a ParticleField,
    disk: &'a ParticleField,
}

fn main() -> Result<()> {
    let args = cli::parse()?;
    env_logger::init();

    let mut config = match args.scene.as_ref() {
        Some(path) => SceneConfig::from_json_file(path)
            .with_context(|| format!("loading scene preset {}", path.display()))?,
        None => hyper_object(),
    };
    if args.no_damping {
        config.scroll.damping = None;
    }

    if let Some(path) = args.dump_scene.as_ref() {
        let json = config
            .to_json_pretty()
            .context("serializing scene description to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing scene JSON to {}", path.display()))?;
        println!("Saved scene description to {}", path.display());
    }

    let samples = match args.script.as_ref() {
        Some(path) => script::load_script(path)?,
        None => script::sweep(args.frames),
    };

    let mut driver = FrameDriver::from_config(&config).context("building frame driver")?;
    driver.set_viewport(args.width as f32, args.height as f32);
    let mut buffer = InstanceBuffer::for_arena(driver.arena());
    let delta = 1.0 / args.fps;

    println!(
        "Playing {} frames at {} fps ({} nodes, {} anchors, {} pages)",
        samples.len(),
        args.fps,
        config.nodes.len(),
        config.anchors.len(),
        config.scroll.pages
    );
    println!(
        "Timeline: {} segments across {} stages",
        driver.timeline().segments().len(),
        driver.stages().len()
    );
    for stage in driver.stages() {
        println!(
            "  - {:<12} [{:.2}, {:.2}]",
            stage.name, stage.window[0], stage.window[1]
        );
    }

    let keep_snapshots = args.snapshots_json.is_some();
    let mut snapshots = Vec::new();
    let mut last_stage: Option<String> = None;
    for sample in &samples {
        let raw = sample.progress(config.scroll.pages);
        driver
            .tick(raw, delta, &mut buffer)
            .with_context(|| format!("rendering frame {}", driver.frame() + 1))?;
        let snapshot = driver.snapshot();
        if args.verbose {
            describe_frame(sample, &snapshot);
        } else if snapshot.stage != last_stage {
            println!(
                "\nframe {:>4} | progress {:.3} | stage {}",
                snapshot.frame,
                snapshot.progress,
                snapshot.stage.as_deref().unwrap_or("none")
            );
            describe_callouts(&snapshot);
        }
        last_stage = snapshot.stage.clone();
        if keep_snapshots {
            snapshots.push(snapshot);
        }
    }

    println!("\nFinal node states:");
    for (_, name, node) in driver.arena().iter() {
        println!(
            "  - {name:<14} scale {scale:>6.3} opacity {opacity:>5.2} colour {color} @ ({x:>6.2}, {y:>6.2}, {z:>6.2})",
            scale = node.scale,
            opacity = node.opacity,
            color = node.color,
            x = node.position[0],
            y = node.position[1],
            z = node.position[2],
        );
    }

    if let Some(path) = args.snapshots_json.as_ref() {
        let json = serde_json::to_string_pretty(&snapshots)
            .context("serializing frame snapshots to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing snapshots JSON to {}", path.display()))?;
        println!("Saved {} frame snapshots to {}", snapshots.len(), path.display());
    }

    if let Some(path) = args.instances_bin.as_ref() {
        fs::write(path, buffer.as_bytes())
            .with_context(|| format!("writing instance buffer to {}", path.display()))?;
        println!(
            "Saved {} node instances ({} bytes) to {}",
            buffer.instances().len(),
            buffer.as_bytes().len(),
            path.display()
        );
    }

    if let Some(path) = args.particles_json.as_ref() {
        persist_particles(path, args.seed)?;
    }

    Ok(())
}

fn describe_frame(sample: &ScrollSample, snapshot: &FrameSnapshot) {
    let input = match sample {
        ScrollSample::Progress(value) => format!("{value:.3}"),
        ScrollSample::Scroll {
            scroll_top,
            viewport_height,
        } => format!("scroll {scroll_top}/{viewport_height}"),
        ScrollSample::Gap(()) => "gap".to_string(),
    };
    println!(
        "frame {:>4} | input {:<16} | progress {:.3} | stage {}",
        snapshot.frame,
        input,
        snapshot.progress,
        snapshot.stage.as_deref().unwrap_or("none")
    );
}

fn describe_callouts(snapshot: &FrameSnapshot) {
    for section in &snapshot.overlay.sections {
        if section.opacity > 0.0 {
            println!("    section {:<12} opacity {:.2}", section.id, section.opacity);
        }
    }
    for callout in snapshot.overlay.callouts.iter().filter(|c| c.interactive) {
        println!(
            "    callout {:<22} at ({:>5.1}%, {:>5.1}%)",
            callout.id, callout.left_percent, callout.top_percent
        );
    }
}

fn persist_particles(path: &Path, seed: u64) -> Result<()> {
    let nebula = nebula_cloud(
        seed,
        NEBULA_POINTS,
        NEBULA_RADIUS,
        Rgb::from_u32(0x442288),
        Rgb::from_u32(0xff00aa),
    );
    let disk = accretion_disk(seed.wrapping_add(1), DISK_POINTS);
    let manifest = ParticleManifest {
        seed,
        nebula: &nebula,
        disk: &disk,
    };
    let json =
        serde_json::to_string_pretty(&manifest).context("serializing particle fields to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("writing particle JSON to {}", path.display()))?;
    println!(
        "Saved {} nebula and {} disk particles to {}",
        nebula.len(),
        disk.len(),
        path.display()
    );
    Ok(())
}
