//! Window-less platform for tests, servers and CI

use std::collections::VecDeque;

use super::Platform;
use crate::application::AppEvent;

/// Replays scripted events and optionally closes after a number of frames
#[derive(Debug, Clone)]
pub struct HeadlessPlatform {
    size: (u32, u32),
    scripted: VecDeque<(u64, AppEvent)>,
    frame: u64,
    frame_limit: Option<u64>,
}

impl HeadlessPlatform {
    /// Create with a virtual window size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            scripted: VecDeque::new(),
            frame: 0,
            frame_limit: None,
        }
    }

    /// Builder pattern: Request close once `frames` polls have happened
    #[must_use]
    pub const fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Queue an event for delivery on the given frame (0-based poll index)
    pub fn schedule(&mut self, frame: u64, event: AppEvent) {
        let index = self
            .scripted
            .iter()
            .position(|(at, _)| *at > frame)
            .unwrap_or(self.scripted.len());
        self.scripted.insert(index, (frame, event));
    }

    /// Number of polls so far
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}

impl Platform for HeadlessPlatform {
    fn poll_events(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Some((at, _)) = self.scripted.front() {
            if *at > self.frame {
                break;
            }
            if let Some((_, event)) = self.scripted.pop_front() {
                if let AppEvent::WindowResized { width, height } = event {
                    self.size = (width, height);
                }
                events.push(event);
            }
        }

        self.frame += 1;
        if self.frame_limit.is_some_and(|limit| self.frame >= limit) {
            events.push(AppEvent::CloseRequested);
        }
        events
    }

    fn window_size(&self) -> (u32, u32) {
        self.size
    }
}
