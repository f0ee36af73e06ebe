//! Low internal resolution and upscaling
//!
//! The scene renders at a fixed internal height (240 lines for the PS1 look)
//! with the width following the window aspect, then upscales to the window.

use crate::core::RenderConfig;

/// Render target sizes for the current window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Internal render width
    pub internal_width: u32,
    /// Internal render height
    pub internal_height: u32,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Upscale factor from internal to window pixels
    pub scale: f32,
    /// Top-left corner of the upscaled image in the window
    pub offset: (u32, u32),
}

impl Resolution {
    /// Aspect ratio of the internal target
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.internal_width as f32 / self.internal_height.max(1) as f32
    }
}

/// Tracks window size and derives the internal resolution
#[derive(Debug, Clone)]
pub struct ResolutionManager {
    internal_height: u32,
    integer_scaling: bool,
    current: Resolution,
}

impl ResolutionManager {
    /// Create for a window of `width` x `height`
    #[must_use]
    pub fn new(config: &RenderConfig, width: u32, height: u32) -> Self {
        let mut manager = Self {
            internal_height: config.internal_height.max(1),
            integer_scaling: config.integer_scaling,
            current: Resolution {
                internal_width: 1,
                internal_height: 1,
                window_width: 1,
                window_height: 1,
                scale: 1.0,
                offset: (0, 0),
            },
        };
        manager.resize(width, height);
        manager
    }

    /// Current sizes
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.current
    }

    /// Recompute for a new window size. Zero sizes (minimized) keep the
    /// previous resolution. Returns whether anything changed.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }

        let internal_height = self.internal_height.min(height);
        let aspect = width as f32 / height as f32;
        let internal_width = ((internal_height as f32 * aspect).round() as u32).max(1);

        let scale = if self.integer_scaling {
            (height / internal_height).min(width / internal_width).max(1) as f32
        } else {
            (height as f32 / internal_height as f32).min(width as f32 / internal_width as f32)
        };
        let scaled_width = (internal_width as f32 * scale) as u32;
        let scaled_height = (internal_height as f32 * scale) as u32;

        let next = Resolution {
            internal_width,
            internal_height,
            window_width: width,
            window_height: height,
            scale,
            offset: (
                width.saturating_sub(scaled_width) / 2,
                height.saturating_sub(scaled_height) / 2,
            ),
        };
        let changed = next != self.current;
        if changed {
            log::debug!(
                "Resolution {internal_width}x{internal_height} -> {width}x{height} (x{scale})"
            );
        }
        self.current = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integer_scale_from_720p() {
        let manager = ResolutionManager::new(&RenderConfig::default(), 1280, 720);
        let resolution = manager.resolution();
        assert_eq!(resolution.internal_height, 240);
        assert_eq!(resolution.internal_width, 427);
        assert_relative_eq!(resolution.scale, 2.0);
        assert_eq!(resolution.offset, (213, 120));
        assert_relative_eq!(resolution.aspect(), 427.0 / 240.0);
    }

    #[test]
    fn test_exact_multiple_fills_window() {
        let manager = ResolutionManager::new(&RenderConfig::default(), 1280, 960);
        let resolution = manager.resolution();
        assert_eq!(resolution.internal_width, 320);
        assert_relative_eq!(resolution.scale, 4.0);
        assert_eq!(resolution.offset, (0, 0));
    }

    #[test]
    fn test_small_window_clamps_internal_height() {
        let manager = ResolutionManager::new(&RenderConfig::default(), 200, 100);
        let resolution = manager.resolution();
        assert_eq!(resolution.internal_height, 100);
        assert_eq!(resolution.internal_width, 200);
        assert_relative_eq!(resolution.scale, 1.0);
    }

    #[test]
    fn test_minimized_window_ignored() {
        let mut manager = ResolutionManager::new(&RenderConfig::default(), 640, 480);
        let before = manager.resolution();
        assert!(!manager.resize(0, 0));
        assert_eq!(manager.resolution(), before);
        assert!(manager.resize(1280, 960));
    }
}
