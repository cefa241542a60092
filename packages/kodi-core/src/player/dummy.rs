use std::time::Instant;

use super::{Player, PlayerError};
use crate::media::MediaItem;

/// Player with a simulated clock.
///
/// Opens any item whose path is non-empty, advances time in real time while
/// unpaused, and finishes once the item's known duration is reached. Items
/// without a duration play until stopped.
pub struct DummyPlayer {
    name: String,
    video: bool,
    item: Option<MediaItem>,
    position_ms: u64,
    resumed_at: Option<Instant>,
}

impl DummyPlayer {
    /// Creates a player. `video` selects whether opened video items report video.
    pub fn new(name: impl Into<String>, video: bool) -> Self {
        Self {
            name: name.into(),
            video,
            item: None,
            position_ms: 0,
            resumed_at: None,
        }
    }

    fn elapsed_since_resume(&self) -> u64 {
        self.resumed_at
            .map(|at| at.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn freeze_clock(&mut self) {
        self.position_ms += self.elapsed_since_resume();
        self.resumed_at = None;
    }
}

impl Player for DummyPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_file(&mut self, item: &MediaItem) -> Result<(), PlayerError> {
        if item.path.trim().is_empty() {
            return Err(PlayerError::OpenFailed {
                path: item.path.clone(),
                reason: "empty path".to_string(),
            });
        }
        log::debug!("[{}] Opening {}", self.name, item.path);
        self.item = Some(item.clone());
        self.position_ms = item.start_offset_ms;
        self.resumed_at = Some(Instant::now());
        Ok(())
    }

    fn close_file(&mut self) {
        if let Some(item) = self.item.take() {
            log::debug!("[{}] Closing {}", self.name, item.path);
        }
        self.position_ms = 0;
        self.resumed_at = None;
    }

    fn is_playing(&self) -> bool {
        self.item.is_some()
    }

    fn is_paused(&self) -> bool {
        self.item.is_some() && self.resumed_at.is_none()
    }

    fn pause(&mut self) {
        if self.item.is_none() {
            return;
        }
        if self.resumed_at.is_some() {
            self.freeze_clock();
        } else {
            self.resumed_at = Some(Instant::now());
        }
    }

    fn has_video(&self) -> bool {
        self.video && self.item.as_ref().is_some_and(MediaItem::is_video)
    }

    fn has_audio(&self) -> bool {
        self.item
            .as_ref()
            .is_some_and(|item| item.is_audio() || item.is_video())
    }

    fn seek_time(&mut self, position_ms: u64) {
        let paused = self.resumed_at.is_none();
        self.position_ms = match self.total_time_ms() {
            Some(total) => position_ms.min(total),
            None => position_ms,
        };
        if !paused {
            self.resumed_at = Some(Instant::now());
        }
    }

    fn time_ms(&self) -> u64 {
        let position = self.position_ms + self.elapsed_since_resume();
        match self.total_time_ms() {
            Some(total) => position.min(total),
            None => position,
        }
    }

    fn total_time_ms(&self) -> Option<u64> {
        self.item.as_ref().and_then(|item| item.duration_ms)
    }

    fn is_finished(&self) -> bool {
        match self.total_time_ms() {
            Some(total) => self.item.is_some() && self.time_ms() >= total,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_item_finishes_immediately() {
        let mut player = DummyPlayer::new("VideoPlayer", true);
        player
            .open_file(&MediaItem::new("/m/clip.mkv").with_duration(0))
            .unwrap();
        assert!(player.is_finished());
        assert!(player.has_video());
    }

    #[test]
    fn pause_freezes_clock() {
        let mut player = DummyPlayer::new("PAPlayer", false);
        player
            .open_file(&MediaItem::new("/m/song.mp3").with_start_offset(5_000))
            .unwrap();
        player.pause();
        assert!(player.is_paused());
        let frozen = player.time_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(player.time_ms(), frozen);
        assert!(frozen >= 5_000);
        assert!(!player.has_video());
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let mut player = DummyPlayer::new("VideoPlayer", true);
        player
            .open_file(&MediaItem::new("/m/film.mkv").with_duration(60_000))
            .unwrap();
        player.pause();
        player.seek_time(90_000);
        assert_eq!(player.time_ms(), 60_000);
        assert!(player.is_finished());
    }

    #[test]
    fn empty_path_fails() {
        let mut player = DummyPlayer::new("VideoPlayer", true);
        assert!(player.open_file(&MediaItem::new("")).is_err());
        assert!(!player.is_playing());
    }
}
