//! # Orchestrator
//!
//! 管道编排与生命周期管理。
//!
//! 负责：
//! - 组装 StreamProducer / FrameRelay / DetectionConsumer
//! - 持有 CancellationToken，统一停止两个循环
//! - 在宽限期内 join，超时则 abort 并记录
//!
//! ## 使用示例
//!
//! ```ignore
//! use orchestrator::Pipeline;
//!
//! let pipeline = Pipeline::new(config, source, detector, sink);
//! let stats = pipeline.run_until(shutdown_signal(), Duration::from_secs(5)).await;
//! stats.print_summary();
//! ```

mod lifecycle;
mod pipeline;
mod stats;

pub use lifecycle::Lifecycle;
pub use pipeline::{Pipeline, RunningPipeline};
pub use stats::PipelineStats;
