//! Pipeline statistics

use std::time::Duration;

use detection::ConsumerStats;
use ingestion::ProducerStats;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Stream side
    pub producer: ProducerStats,

    /// Detection side
    pub consumer: ConsumerStats,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Loops that had to be aborted after the grace period
    pub aborted_tasks: Vec<&'static str>,
}

impl PipelineStats {
    /// Both loops exited on their own
    pub fn clean_shutdown(&self) -> bool {
        self.aborted_tasks.is_empty()
    }

    /// Frames handed to the detector per second
    pub fn sample_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.producer.frames_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let producer = &self.producer;
        let consumer = &self.consumer;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Tag Scanner Statistics                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sample rate: {:.2}/s", self.sample_rate());
        if self.clean_shutdown() {
            println!("   └─ Shutdown: clean");
        } else {
            println!("   └─ Shutdown: aborted {:?}", self.aborted_tasks);
        }

        println!("\n📷 Stream");
        println!("   ├─ Frames read: {}", producer.frames_read);
        println!("   ├─ Frames sampled: {}", producer.frames_published);
        println!("   ├─ Frames skipped: {}", producer.frames_skipped);
        println!(
            "   ├─ Opens: {} ({} failed)",
            producer.open_attempts, producer.open_failures
        );
        println!("   └─ Reconnects: {}", producer.reconnects());

        println!("\n🔍 Detection");
        println!("   ├─ Frames processed: {}", consumer.frames_processed);
        println!("   ├─ Tags detected: {}", consumer.detections);
        println!("   ├─ Detection errors: {}", consumer.detection_errors);
        println!("   └─ Latency (ms): {}", consumer.latency_ms);

        println!("\n📤 Events");
        println!("   ├─ Delivered: {}", consumer.events_delivered);
        println!("   └─ Failed: {}", consumer.delivery_failures);

        println!();
    }
}
