use crate::domain::model::GeoPoint;
use crate::domain::ports::{ConfigProvider, PositionOptions, PositionSource};
use crate::utils::error::{QuoteError, Result};
use async_trait::async_trait;

/// Device position as configured: a fixed fix, or no location support at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfiguredPosition {
    Fixed(GeoPoint),
    Unsupported,
}

impl ConfiguredPosition {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        match config.device_position() {
            Some(point) => Self::Fixed(point),
            None => Self::Unsupported,
        }
    }
}

#[async_trait]
impl PositionSource for ConfiguredPosition {
    async fn current_position(&self, options: PositionOptions) -> Result<GeoPoint> {
        match self {
            Self::Fixed(point) => {
                // 固定座標永遠是最新的，符合 maximum_age 的任何要求
                tracing::debug!(
                    "Device position {} (high_accuracy={}, timeout={:?}, maximum_age={:?})",
                    point,
                    options.high_accuracy,
                    options.timeout,
                    options.maximum_age
                );
                Ok(*point)
            }
            Self::Unsupported => Err(QuoteError::LocationUnavailable {
                message: "No device position is configured".to_string(),
            }),
        }
    }
}
