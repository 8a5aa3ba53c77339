//! Capture Pipeline Demo
//!
//! Simulates a camera feeding an image ring buffer, an analysis task that
//! walks every packet once and a recording consumer that keeps a
//! keyframe-aligned pre-event window once motion is detected.
//!
//! Run with `RUST_LOG=packetring_core=debug` to see ring catch-ups and trims.

use anyhow::Context;
use packetring::{Bytes, Packet, PacketRing, PacketRingConfig, QueuedPacket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const VIDEO: u32 = 0;
const AUDIO: u32 = 1;
const GOP: u64 = 15;
const FRAMES: u64 = 240;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json = r#"{
        "queue": { "image_buffer_size": 24, "video_stream_id": 0 },
        "recording": { "pre_event_frames": 10 },
        "logging": { "enabled": true, "default_directive": "info" }
    }"#;
    let config = PacketRingConfig::from_json_str(json).context("loading demo configuration")?;
    let ring = PacketRing::init_with(config)?;
    let queue = ring.create_queue::<Bytes>()?;

    println!("🎥 Packet Ring Capture Pipeline Demo");
    println!("====================================");
    println!(
        "Image ring: {} slots, queue references at most {}",
        ring.config().queue.image_buffer_size,
        queue.capacity()
    );

    let motion = Arc::new(AtomicBool::new(false));

    // Capture: one video frame per tick, audio in between
    let capture = {
        let queue = Arc::clone(&queue);
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let capacity = queue.capacity();
            for frame in 0..FRAMES {
                let slot = frame as usize % capacity;
                let payload = Bytes::from(format!("frame-{}", frame));
                let packet = Packet::video(VIDEO, frame % GOP == 0, payload).with_pts(frame as i64);
                queue.enqueue(QueuedPacket::shared(slot, Arc::new(packet)))?;

                let audio = Packet::audio(AUDIO, Bytes::from_static(b"pcm"));
                queue.enqueue(QueuedPacket::owned(audio))?;

                std::thread::sleep(Duration::from_millis(2));
            }
            Ok(())
        })
    };

    // Analysis: visit each packet once, flag motion from frame 180 on
    let analysis = {
        let queue = Arc::clone(&queue);
        let motion = Arc::clone(&motion);
        tokio::spawn(async move {
            let mut analysed = 0u64;
            let mut ticker = tokio::time::interval(Duration::from_millis(5));
            loop {
                ticker.tick().await;
                while let Some(pts) = queue.with_analysis_packet(|packet| packet.pts) {
                    analysed += 1;
                    if matches!(pts, Some(pts) if pts >= 180) {
                        motion.store(true, Ordering::SeqCst);
                    }
                    if !queue.advance() {
                        break;
                    }
                }
                if motion.load(Ordering::SeqCst) {
                    return analysed;
                }
            }
        })
    };

    let analysed = analysis.await?;
    println!("\n🔍 Motion detected after analysing {} packets", analysed);

    let evicted = ring.retain_pre_event(&queue);
    println!("✂️  Trimmed {} packets ahead of the pre-event window", evicted);

    capture.await??;

    let mut recorded = 0;
    while let Some(packet) = queue.pop_head() {
        let packet = packet.packet();
        if !packet.is_video() {
            continue;
        }
        if recorded == 0 {
            println!(
                "📼 Recording starts at pts {:?} (keyframe: {})",
                packet.pts, packet.is_keyframe
            );
        }
        recorded += 1;
    }
    println!("💾 Recorded {} video frames", recorded);

    let stats = queue.stats();
    println!("\n📊 Queue statistics");
    println!("  Enqueued:            {}", stats.packets_enqueued);
    println!("  Popped:              {}", stats.packets_popped);
    println!("  Ring catch-ups:      {}", stats.catch_up_evictions);
    println!("  Trimmed:             {}", stats.trim_evictions);
    println!("  Removed unanalysed:  {}", stats.unanalysed_removals);
    println!("  Keyframe fallbacks:  {}", stats.keyframe_fallbacks);
    println!("  Peak queue length:   {}", stats.peak_queue_len);

    println!("\n✨ Capture pipeline demo completed!");
    Ok(())
}
