//! 配置校验模块
//!
//! 校验规则：
//! - tag_event_device_id / camera_rtsp_stream 非空
//! - frame_sample_interval >= 0 (0 = 不限速)
//! - stream_reconnect_delay / stream_read_timeout / http_timeout > 0
//! - 所有时间参数 <= 1 天
//! - frame_width / frame_height 在合理范围内
//! - home_assistant_api_url 为 http(s) 地址

use contracts::{ContractError, ScannerOptions, SinkKind};

/// Largest decode size accepted for either dimension
const MAX_FRAME_DIMENSION: u32 = 8192;

/// Upper bound for every interval option, in seconds (one day)
const MAX_INTERVAL_SECS: f64 = 86_400.0;

/// 校验 ScannerOptions 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(options: &ScannerOptions) -> Result<(), ContractError> {
    validate_required(options)?;
    validate_intervals(options)?;
    validate_frame_size(options)?;
    validate_sink(options)?;
    Ok(())
}

/// 校验必填字段
fn validate_required(options: &ScannerOptions) -> Result<(), ContractError> {
    if options.tag_event_device_id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "tag_event_device_id",
            "device id cannot be empty",
        ));
    }
    if options.camera_rtsp_stream.trim().is_empty() {
        return Err(ContractError::config_validation(
            "camera_rtsp_stream",
            "stream URI cannot be empty",
        ));
    }
    if options.ffmpeg_path.trim().is_empty() {
        return Err(ContractError::config_validation(
            "ffmpeg_path",
            "ffmpeg path cannot be empty",
        ));
    }
    Ok(())
}

/// 校验时间参数
fn validate_intervals(options: &ScannerOptions) -> Result<(), ContractError> {
    if !options.frame_sample_interval.is_finite() || options.frame_sample_interval < 0.0 {
        return Err(ContractError::config_validation(
            "frame_sample_interval",
            format!(
                "frame_sample_interval must be >= 0, got {}",
                options.frame_sample_interval
            ),
        ));
    }
    check_upper_bound("frame_sample_interval", options.frame_sample_interval)?;

    let positive = [
        ("stream_reconnect_delay", options.stream_reconnect_delay),
        ("stream_read_timeout", options.stream_read_timeout),
        ("http_timeout", options.http_timeout),
    ];
    for (field, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(ContractError::config_validation(
                field,
                format!("{field} must be > 0, got {value}"),
            ));
        }
        check_upper_bound(field, value)?;
    }
    Ok(())
}

fn check_upper_bound(field: &str, value: f64) -> Result<(), ContractError> {
    if value > MAX_INTERVAL_SECS {
        return Err(ContractError::config_validation(
            field,
            format!("{field} must be <= {MAX_INTERVAL_SECS} seconds, got {value}"),
        ));
    }
    Ok(())
}

/// 校验解码尺寸
fn validate_frame_size(options: &ScannerOptions) -> Result<(), ContractError> {
    for (field, value) in [
        ("frame_width", options.frame_width),
        ("frame_height", options.frame_height),
    ] {
        if value == 0 || value > MAX_FRAME_DIMENSION {
            return Err(ContractError::config_validation(
                field,
                format!("{field} must be in 1..={MAX_FRAME_DIMENSION}, got {value}"),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sink(options: &ScannerOptions) -> Result<(), ContractError> {
    if options.sink != SinkKind::HomeAssistant {
        return Ok(());
    }

    let url = options.home_assistant_api_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "home_assistant_api_url",
            format!("expected an http(s) URL, got '{url}'"),
        ));
    }
    Ok(())
}
