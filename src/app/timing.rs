use crate::assets::CacheStats;
use std::time::Instant;
use winit::window::Window;

/// What the window title reports besides the frame rate.
#[derive(Debug, Clone, Default)]
pub struct TitleInfo {
    pub status: String,
    pub viewport: (u32, u32),
    pub stats: CacheStats,
}

pub struct FrameTiming {
    last_fps_time: Instant,
    frame_count: u32,
    prepare_ms: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_fps_time: Instant::now(),
            frame_count: 0,
            prepare_ms: 0.0,
            base_title,
        }
    }

    pub fn set_prepare_ms(&mut self, prepare_ms: f32) {
        self.prepare_ms = prepare_ms;
    }

    /// Counts a frame and refreshes the window title twice a second.
    pub fn update(&mut self, window: Option<&Window>, now: Instant, info: &TitleInfo) {
        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            if let Some(window) = window {
                window.set_title(&self.title(fps, info));
            }
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }

    fn title(&self, fps: f32, info: &TitleInfo) -> String {
        let (width, height) = info.viewport;
        format!(
            "{} - {} - {:.1} fps @ {} x {} (prepare {:.2} ms, {} meshes, {} textures)",
            self.base_title,
            info.status,
            fps,
            width,
            height,
            self.prepare_ms,
            info.stats.meshes_loaded,
            info.stats.textures_loaded
        )
    }
}
