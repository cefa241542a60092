//! The playlist player.
//!
//! Owns the music, video and picture playlists and decides which item plays
//! next. Playback itself is requested from the application with a blocking
//! `PlayFile` send, which runs inline when called on the owning thread.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{PlayList, PlaylistId, RepeatMode};
use crate::gui::{GuiMessage, GuiMessageKind};
use crate::media::MediaItem;
use crate::messaging::{
    AppCommand, ApplicationMessenger, Command, MessageTarget, PlaylistCommand, ReplyValue,
    TargetKind, ThreadMessage,
};

struct State {
    playlists: [PlayList; 3],
    repeat: [RepeatMode; 3],
    current_playlist: Option<PlaylistId>,
    current_song: Option<usize>,
}

impl State {
    fn playlist(&self, id: PlaylistId) -> &PlayList {
        &self.playlists[id.slot()]
    }

    fn playlist_mut(&mut self, id: PlaylistId) -> &mut PlayList {
        &mut self.playlists[id.slot()]
    }

    fn is_current(&self, id: PlaylistId) -> bool {
        self.current_playlist == Some(id)
    }
}

pub struct PlaylistPlayer {
    state: Mutex<State>,
    messenger: Arc<ApplicationMessenger>,
}

impl PlaylistPlayer {
    pub fn new(messenger: Arc<ApplicationMessenger>) -> Self {
        Self {
            state: Mutex::new(State {
                playlists: PlaylistId::ALL.map(PlayList::new),
                repeat: [RepeatMode::Off; 3],
                current_playlist: None,
                current_song: None,
            }),
            messenger,
        }
    }

    pub fn current_playlist(&self) -> Option<PlaylistId> {
        self.state.lock().current_playlist
    }

    pub fn set_current_playlist(&self, id: Option<PlaylistId>) {
        let mut state = self.state.lock();
        if state.current_playlist != id {
            state.current_playlist = id;
            state.current_song = None;
        }
    }

    /// Index of the current song in the current playlist.
    pub fn current_song(&self) -> Option<usize> {
        self.state.lock().current_song
    }

    /// Forgets the current playlist and song.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.current_playlist = None;
        state.current_song = None;
    }

    pub fn items(&self, id: PlaylistId) -> Vec<MediaItem> {
        self.state.lock().playlist(id).items()
    }

    pub fn len(&self, id: PlaylistId) -> usize {
        self.state.lock().playlist(id).len()
    }

    pub fn add(&self, id: PlaylistId, items: Vec<MediaItem>) {
        let mut state = self.state.lock();
        let playlist = state.playlist_mut(id);
        for item in items {
            playlist.add(item);
        }
    }

    pub fn insert(&self, id: PlaylistId, index: usize, items: Vec<MediaItem>) {
        let mut state = self.state.lock();
        let count = items.len();
        let playlist = state.playlist_mut(id);
        for (offset, item) in items.into_iter().enumerate() {
            playlist.insert(index + offset, item);
        }
        if state.is_current(id) {
            if let Some(current) = state.current_song {
                if index <= current {
                    state.current_song = Some(current + count);
                }
            }
        }
    }

    pub fn remove(&self, id: PlaylistId, index: usize) -> Option<MediaItem> {
        let mut state = self.state.lock();
        let removed = state.playlist_mut(id).remove(index)?;
        if state.is_current(id) {
            if let Some(current) = state.current_song {
                if current >= index {
                    state.current_song = current.checked_sub(1);
                }
            }
        }
        Some(removed)
    }

    pub fn swap(&self, id: PlaylistId, a: usize, b: usize) -> bool {
        let mut state = self.state.lock();
        if !state.playlist_mut(id).swap(a, b) {
            return false;
        }
        if state.is_current(id) {
            state.current_song = match state.current_song {
                Some(current) if current == a => Some(b),
                Some(current) if current == b => Some(a),
                other => other,
            };
        }
        true
    }

    pub fn clear(&self, id: PlaylistId) {
        let mut state = self.state.lock();
        state.playlist_mut(id).clear();
        if state.is_current(id) {
            state.current_song = None;
        }
    }

    pub fn repeat(&self, id: PlaylistId) -> RepeatMode {
        self.state.lock().repeat[id.slot()]
    }

    pub fn set_repeat(&self, id: PlaylistId, mode: RepeatMode) {
        self.state.lock().repeat[id.slot()] = mode;
        log::debug!("[PlaylistPlayer] Repeat {:?} for {:?}", mode, id);
    }

    pub fn is_shuffled(&self, id: PlaylistId) -> bool {
        self.state.lock().playlist(id).is_shuffled()
    }

    /// Shuffles or unshuffles a playlist.
    ///
    /// The current song keeps its place; only the items after it move.
    pub fn set_shuffle(&self, id: PlaylistId, shuffle: bool) {
        let mut state = self.state.lock();
        let current = state.current_song.filter(|_| state.is_current(id));

        if shuffle {
            if state.playlist(id).is_shuffled() {
                return;
            }
            let from = current.map_or(0, |c| c + 1);
            state.playlist_mut(id).shuffle(from, &mut rand::thread_rng());
        } else {
            if !state.playlist(id).is_shuffled() {
                return;
            }
            let current_path = current
                .and_then(|c| state.playlist(id).get(c))
                .map(|item| item.path.clone());
            state.playlist_mut(id).unshuffle();
            if let Some(path) = current_path {
                state.current_song = state.playlist(id).find(&path);
            }
        }
    }

    /// Plays the item at `index` of the current playlist, or its current song.
    pub fn play(&self, index: Option<usize>) -> bool {
        let item = {
            let mut state = self.state.lock();
            let Some(id) = state.current_playlist else {
                log::debug!("[PlaylistPlayer] Play requested without a current playlist");
                return false;
            };
            let index = index.or(state.current_song).unwrap_or(0);
            let Some(item) = state.playlist(id).get(index).cloned() else {
                log::debug!("[PlaylistPlayer] No item at {} in {:?}", index, id);
                return false;
            };
            state.current_song = Some(index);
            item
        };

        let path = item.path.clone();
        let played = self.messenger.send(
            ThreadMessage::new(AppCommand::PlayFile)
                .with_params(0, 1)
                .with_item(item),
        ) == 1;
        if !played {
            log::warn!("[PlaylistPlayer] Failed to play {}", path);
        }
        played
    }

    /// Plays the item `offset` places after the current one.
    ///
    /// `auto` marks advances at the end of an item, where repeat-one replays
    /// the current song.
    pub fn play_next(&self, offset: usize, auto: bool) -> bool {
        let next = {
            let state = self.state.lock();
            next_index(&state, offset, auto)
        };
        match next {
            Some(index) => self.play(Some(index)),
            None => {
                self.notify_stopped();
                false
            }
        }
    }

    pub fn play_previous(&self) -> bool {
        let previous = {
            let state = self.state.lock();
            previous_index(&state)
        };
        match previous {
            Some(index) => self.play(Some(index)),
            None => false,
        }
    }

    /// Advances after the current item played to its end.
    pub fn on_playback_ended(&self) -> bool {
        if self.current_playlist().is_none() {
            return false;
        }
        self.play_next(1, true)
    }

    /// Replaces the matching playlist with `items` and makes it current.
    pub fn replace_and_select(&self, items: Vec<MediaItem>) -> PlaylistId {
        let id = PlaylistId::for_items(&items);
        self.clear(id);
        self.set_current_playlist(Some(id));
        self.add(id, items);
        id
    }

    fn notify_stopped(&self) {
        self.messenger.send_gui_message(GuiMessage::new(
            GuiMessageKind::PlaylistPlayerStopped,
            0,
            0,
        ));
    }
}

fn next_index(state: &State, offset: usize, auto: bool) -> Option<usize> {
    let id = state.current_playlist?;
    let len = state.playlist(id).len();
    if len == 0 {
        return None;
    }
    let repeat = state.repeat[id.slot()];
    if auto && repeat == RepeatMode::One {
        return Some(state.current_song.unwrap_or(0).min(len - 1));
    }
    let next = state.current_song.map_or(offset.saturating_sub(1), |c| c + offset);
    if next < len {
        Some(next)
    } else if repeat != RepeatMode::Off {
        Some(next % len)
    } else {
        None
    }
}

fn previous_index(state: &State) -> Option<usize> {
    let id = state.current_playlist?;
    let len = state.playlist(id).len();
    if len == 0 {
        return None;
    }
    match state.current_song {
        Some(current) if current > 0 => Some((current - 1).min(len - 1)),
        _ if state.repeat[id.slot()] != RepeatMode::Off => Some(len - 1),
        _ => None,
    }
}

fn take_item_list(message: &mut ThreadMessage) -> Vec<MediaItem> {
    if let Some(items) = message.take_items() {
        return items;
    }
    message.take_item().into_iter().collect()
}

impl MessageTarget for PlaylistPlayer {
    fn target(&self) -> TargetKind {
        TargetKind::PlaylistPlayer
    }

    fn on_application_message(&self, message: &mut ThreadMessage) {
        let Command::Playlist(command) = message.command else {
            log::warn!("[PlaylistPlayer] Unexpected command {}", message.command);
            return;
        };
        let index = usize::try_from(message.param1).ok();

        match command {
            PlaylistCommand::Play => {
                let items = take_item_list(message);
                if !items.is_empty() {
                    self.replace_and_select(items);
                }
                let played = self.play(index);
                message.set_result(i32::from(played));
            }
            PlaylistCommand::Next => {
                let played = self.play_next(1, false);
                message.set_result(i32::from(played));
            }
            PlaylistCommand::Previous => {
                let played = self.play_previous();
                message.set_result(i32::from(played));
            }
            PlaylistCommand::GetItems => {
                if let (Some(id), Some(reply)) =
                    (PlaylistId::from_index(message.param1), message.reply())
                {
                    reply.set(ReplyValue::Items(self.items(id)));
                }
            }
            _ => {
                let Some(id) = PlaylistId::from_index(message.param1) else {
                    log::warn!(
                        "[PlaylistPlayer] {} with invalid playlist {}",
                        message.command,
                        message.param1
                    );
                    return;
                };
                self.edit_playlist(command, id, message);
            }
        }
    }
}

impl PlaylistPlayer {
    fn edit_playlist(&self, command: PlaylistCommand, id: PlaylistId, message: &mut ThreadMessage) {
        let position = usize::try_from(message.param2).ok();
        match command {
            PlaylistCommand::Add => self.add(id, take_item_list(message)),
            PlaylistCommand::Insert => {
                let items = take_item_list(message);
                self.insert(id, position.unwrap_or(0), items);
            }
            PlaylistCommand::Remove => {
                if let Some(position) = position {
                    self.remove(id, position);
                }
            }
            PlaylistCommand::Swap => {
                if let Some(&[a, b]) = message.take_indices().as_deref() {
                    let swapped = self.swap(id, a, b);
                    message.set_result(i32::from(swapped));
                }
            }
            PlaylistCommand::Clear => self.clear(id),
            PlaylistCommand::Shuffle => self.set_shuffle(id, message.param2 != 0),
            PlaylistCommand::Repeat => match RepeatMode::from_index(message.param2) {
                Some(mode) => self.set_repeat(id, mode),
                None => log::warn!("[PlaylistPlayer] Invalid repeat mode {}", message.param2),
            },
            PlaylistCommand::Play
            | PlaylistCommand::Next
            | PlaylistCommand::Previous
            | PlaylistCommand::GetItems => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    /// Application stand-in that records PlayFile requests.
    struct FakeApp {
        played: PlMutex<Vec<String>>,
        fail: Option<String>,
    }

    impl MessageTarget for FakeApp {
        fn target(&self) -> TargetKind {
            TargetKind::Application
        }

        fn on_application_message(&self, message: &mut ThreadMessage) {
            if message.command != Command::App(AppCommand::PlayFile) {
                return;
            }
            let item = message.take_item().unwrap();
            let ok = self.fail.as_deref() != Some(item.path.as_str());
            self.played.lock().push(item.path);
            message.set_result(i32::from(ok));
        }
    }

    fn setup(paths: &[&str]) -> (Arc<PlaylistPlayer>, Arc<FakeApp>) {
        let messenger = Arc::new(ApplicationMessenger::new());
        messenger.set_owning_thread();
        let app = Arc::new(FakeApp {
            played: PlMutex::new(Vec::new()),
            fail: None,
        });
        let target: Arc<dyn MessageTarget> = app.clone();
        messenger.register_receiver(&target);

        let player = Arc::new(PlaylistPlayer::new(messenger));
        player.add(
            PlaylistId::Music,
            paths.iter().map(|p| MediaItem::new(*p)).collect(),
        );
        player.set_current_playlist(Some(PlaylistId::Music));
        (player, app)
    }

    #[test]
    fn next_stops_at_end_without_repeat() {
        let (player, app) = setup(&["/a.mp3", "/b.mp3"]);

        assert!(player.play(None));
        assert!(player.play_next(1, false));
        assert!(!player.play_next(1, false));
        assert_eq!(*app.played.lock(), vec!["/a.mp3", "/b.mp3"]);
        assert_eq!(player.current_song(), Some(1));
    }

    #[test]
    fn repeat_all_wraps_both_ways() {
        let (player, app) = setup(&["/a.mp3", "/b.mp3"]);
        player.set_repeat(PlaylistId::Music, RepeatMode::All);

        assert!(player.play(Some(1)));
        assert!(player.play_next(1, true));
        assert!(player.play_previous());
        assert_eq!(*app.played.lock(), vec!["/b.mp3", "/a.mp3", "/b.mp3"]);
    }

    #[test]
    fn repeat_one_replays_on_auto_advance_only() {
        let (player, app) = setup(&["/a.mp3", "/b.mp3"]);
        player.set_repeat(PlaylistId::Music, RepeatMode::One);

        assert!(player.play(Some(0)));
        assert!(player.on_playback_ended());
        assert!(player.play_next(1, false));
        assert_eq!(*app.played.lock(), vec!["/a.mp3", "/a.mp3", "/b.mp3"]);
    }

    #[test]
    fn previous_at_start_without_repeat_fails() {
        let (player, _app) = setup(&["/a.mp3", "/b.mp3"]);
        assert!(player.play(Some(0)));
        assert!(!player.play_previous());
    }

    #[test]
    fn edits_keep_current_song_pointing_at_same_item() {
        let (player, _app) = setup(&["/a.mp3", "/b.mp3", "/c.mp3"]);
        assert!(player.play(Some(1)));

        player.insert(PlaylistId::Music, 0, vec![MediaItem::new("/z.mp3")]);
        assert_eq!(player.current_song(), Some(2));

        player.remove(PlaylistId::Music, 0);
        assert_eq!(player.current_song(), Some(1));

        assert!(player.swap(PlaylistId::Music, 1, 2));
        assert_eq!(player.current_song(), Some(2));
    }

    #[test]
    fn shuffle_keeps_current_song_in_place() {
        let paths = ["/a.mp3", "/b.mp3", "/c.mp3", "/d.mp3", "/e.mp3", "/f.mp3"];
        let (player, _app) = setup(&paths);
        assert!(player.play(Some(2)));

        player.set_shuffle(PlaylistId::Music, true);
        let items = player.items(PlaylistId::Music);
        assert_eq!(items[2].path, "/c.mp3");
        assert_eq!(items[0].path, "/a.mp3");

        player.set_shuffle(PlaylistId::Music, false);
        assert_eq!(player.current_song(), Some(2));
        let restored: Vec<String> = player
            .items(PlaylistId::Music)
            .into_iter()
            .map(|item| item.path)
            .collect();
        assert_eq!(restored, paths);
    }

    #[test]
    fn play_command_with_items_replaces_playlist() {
        let (player, app) = setup(&["/a.mp3"]);
        let mut message = ThreadMessage::new(PlaylistCommand::Play)
            .with_param1(1)
            .with_items(vec![MediaItem::new("/x.mkv"), MediaItem::new("/y.mkv")]);

        player.on_application_message(&mut message);

        assert_eq!(player.current_playlist(), Some(PlaylistId::Video));
        assert_eq!(*app.played.lock(), vec!["/y.mkv"]);
        assert_eq!(player.len(PlaylistId::Music), 1);
    }

    #[test]
    fn get_items_writes_reply() {
        let (player, _app) = setup(&["/a.mp3", "/b.mp3"]);
        let slot = crate::messaging::ReplySlot::new();
        let mut message = ThreadMessage::new(PlaylistCommand::GetItems)
            .with_param1(PlaylistId::Music as i32)
            .with_reply(slot.clone());

        player.on_application_message(&mut message);
        assert_eq!(slot.take_items().unwrap().len(), 2);
    }

    #[test]
    fn failed_play_reports_false() {
        let messenger = Arc::new(ApplicationMessenger::new());
        messenger.set_owning_thread();
        let app = Arc::new(FakeApp {
            played: PlMutex::new(Vec::new()),
            fail: Some("/bad.mp3".to_string()),
        });
        let target: Arc<dyn MessageTarget> = app.clone();
        messenger.register_receiver(&target);
        let player = PlaylistPlayer::new(messenger);
        player.replace_and_select(vec![MediaItem::new("/bad.mp3")]);

        assert!(!player.play(None));
    }
}
