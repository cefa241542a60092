//! Rule-based player selection.
//!
//! Players and selection rules come from built-in defaults, optionally
//! extended by a `playercorefactory.xml` in the profile folder:
//!
//! ```xml
//! <playercorefactory>
//!   <players>
//!     <player name="Projector" type="dummy" audio="false" video="true"/>
//!   </players>
//!   <rules action="prepend">
//!     <rule filetypes="mkv|avi" player="Projector"/>
//!     <rule internetstream="true" player="PAPlayer"/>
//!   </rules>
//! </playercorefactory>
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::{DummyPlayer, Player, PlayerError};
use crate::constants::PLAYER_CORE_CONFIG_FILE;
use crate::media::MediaItem;
use crate::utils::{self, parse_xml_bool, xml_attr};

/// Builds a player from its configuration.
pub type PlayerCreator = Arc<dyn Fn(&PlayerConfig) -> Box<dyn Player> + Send + Sync>;

/// A configured player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub name: String,
    /// Implementation kind, resolved through the registered creators.
    pub kind: String,
    pub audio: bool,
    pub video: bool,
}

/// A selection rule. Every condition that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRule {
    pub name: Option<String>,
    pub protocols: Vec<String>,
    pub filetypes: Vec<String>,
    pub video: Option<bool>,
    pub audio: Option<bool>,
    pub internet_stream: Option<bool>,
    pub player: String,
}

impl PlayerRule {
    pub fn matches(&self, item: &MediaItem) -> bool {
        if !self.protocols.is_empty() {
            match utils::protocol(&item.path) {
                Some(protocol) if self.protocols.contains(&protocol) => {}
                _ => return false,
            }
        }
        if !self.filetypes.is_empty() {
            match item.extension() {
                Some(ext) if self.filetypes.contains(&ext) => {}
                _ => return false,
            }
        }
        if self.video.is_some_and(|video| video != item.is_video()) {
            return false;
        }
        if self.audio.is_some_and(|audio| audio != item.is_audio()) {
            return false;
        }
        if self
            .internet_stream
            .is_some_and(|stream| stream != item.is_internet_stream())
        {
            return false;
        }
        true
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split('|')
                .map(|part| part.trim().to_ascii_lowercase())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Parsed contents of a player configuration document.
#[derive(Debug, Default)]
struct ParsedConfig {
    players: Vec<PlayerConfig>,
    rules: Vec<PlayerRule>,
    append_rules: bool,
}

fn parse_config(xml: &str) -> Result<ParsedConfig, PlayerError> {
    let mut parsed = ParsedConfig::default();
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"playercorefactory" => saw_root = true,
                b"player" => {
                    let Some(name) = xml_attr(e, b"name") else {
                        return Err(PlayerError::InvalidConfig(
                            "player without a name".to_string(),
                        ));
                    };
                    parsed.players.push(PlayerConfig {
                        name,
                        kind: xml_attr(e, b"type").unwrap_or_else(|| "dummy".to_string()),
                        audio: xml_attr(e, b"audio")
                            .and_then(|v| parse_xml_bool(&v))
                            .unwrap_or(false),
                        video: xml_attr(e, b"video")
                            .and_then(|v| parse_xml_bool(&v))
                            .unwrap_or(false),
                    });
                }
                b"rules" => {
                    parsed.append_rules = xml_attr(e, b"action").as_deref() == Some("append");
                }
                b"rule" => {
                    let Some(player) = xml_attr(e, b"player") else {
                        return Err(PlayerError::InvalidConfig(
                            "rule without a player".to_string(),
                        ));
                    };
                    parsed.rules.push(PlayerRule {
                        name: xml_attr(e, b"name"),
                        protocols: split_list(xml_attr(e, b"protocols")),
                        filetypes: split_list(xml_attr(e, b"filetypes")),
                        video: xml_attr(e, b"video").and_then(|v| parse_xml_bool(&v)),
                        audio: xml_attr(e, b"audio").and_then(|v| parse_xml_bool(&v)),
                        internet_stream: xml_attr(e, b"internetstream")
                            .and_then(|v| parse_xml_bool(&v)),
                        player,
                    });
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(PlayerError::InvalidConfig(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(PlayerError::InvalidConfig(
            "missing <playercorefactory> root".to_string(),
        ));
    }
    Ok(parsed)
}

/// Chooses and creates players for media items.
pub struct PlayerCoreFactory {
    players: RwLock<Vec<PlayerConfig>>,
    rules: RwLock<Vec<PlayerRule>>,
    creators: RwLock<HashMap<String, PlayerCreator>>,
}

impl PlayerCoreFactory {
    /// Creates a factory with the built-in players: `VideoPlayer` for
    /// everything and `PAPlayer` for audio.
    pub fn with_defaults() -> Self {
        let players = vec![
            PlayerConfig {
                name: "VideoPlayer".to_string(),
                kind: "dummy".to_string(),
                audio: true,
                video: true,
            },
            PlayerConfig {
                name: "PAPlayer".to_string(),
                kind: "dummy".to_string(),
                audio: true,
                video: false,
            },
        ];
        let rules = vec![PlayerRule {
            name: Some("audio".to_string()),
            audio: Some(true),
            player: "PAPlayer".to_string(),
            ..PlayerRule::default()
        }];

        let mut creators: HashMap<String, PlayerCreator> = HashMap::new();
        creators.insert(
            "dummy".to_string(),
            Arc::new(|config: &PlayerConfig| {
                Box::new(DummyPlayer::new(config.name.clone(), config.video)) as Box<dyn Player>
            }),
        );

        Self {
            players: RwLock::new(players),
            rules: RwLock::new(rules),
            creators: RwLock::new(creators),
        }
    }

    /// Creates a factory from the defaults plus the profile's configuration file.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(profile_folder: &Path) -> Result<Self, PlayerError> {
        let factory = Self::with_defaults();
        let path = profile_folder.join(PLAYER_CORE_CONFIG_FILE);
        if path.is_file() {
            let xml = std::fs::read_to_string(&path)
                .map_err(|e| PlayerError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
            factory.apply_config(&xml)?;
            log::info!("[PlayerCoreFactory] Loaded {}", path.display());
        }
        Ok(factory)
    }

    /// Merges a configuration document into the factory.
    ///
    /// Players replace same-named ones. Rules are prepended unless the
    /// document says `action="append"`.
    pub fn apply_config(&self, xml: &str) -> Result<(), PlayerError> {
        let parsed = parse_config(xml)?;

        {
            let mut players = self.players.write();
            for config in parsed.players {
                match players.iter_mut().find(|p| p.name == config.name) {
                    Some(existing) => *existing = config,
                    None => players.push(config),
                }
            }
        }

        let mut rules = self.rules.write();
        if parsed.append_rules {
            rules.extend(parsed.rules);
        } else {
            let mut merged = parsed.rules;
            merged.append(&mut rules);
            *rules = merged;
        }
        Ok(())
    }

    /// Registers a creator for a player `type`.
    pub fn register_creator(&self, kind: impl Into<String>, creator: PlayerCreator) {
        self.creators.write().insert(kind.into(), creator);
    }

    pub fn players(&self) -> Vec<PlayerConfig> {
        self.players.read().clone()
    }

    /// Candidate players for an item, best first.
    ///
    /// Rule matches come first, in rule order, followed by every player able
    /// to handle the item's media type.
    pub fn player_names_for(&self, item: &MediaItem) -> Vec<String> {
        let players = self.players.read();
        let known = |name: &str| players.iter().any(|p| p.name == name);

        let mut names: Vec<String> = Vec::new();
        for rule in self.rules.read().iter() {
            if rule.matches(item) && known(&rule.player) && !names.contains(&rule.player) {
                names.push(rule.player.clone());
            }
        }
        for player in players.iter() {
            let capable = if item.is_video() {
                player.video
            } else {
                player.audio || player.video
            };
            if capable && !names.contains(&player.name) {
                names.push(player.name.clone());
            }
        }
        names
    }

    pub fn default_player_for(&self, item: &MediaItem) -> Option<String> {
        self.player_names_for(item).into_iter().next()
    }

    pub fn create_player(&self, name: &str) -> Result<Box<dyn Player>, PlayerError> {
        let config = self
            .players
            .read()
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| PlayerError::UnknownPlayer(name.to_string()))?;
        let creator = self
            .creators
            .read()
            .get(&config.kind)
            .cloned()
            .ok_or_else(|| {
                PlayerError::InvalidConfig(format!(
                    "player {} has unknown type {}",
                    config.name, config.kind
                ))
            })?;
        Ok(creator(&config))
    }

    /// Creates the preferred player for an item.
    pub fn create_player_for(&self, item: &MediaItem) -> Result<Box<dyn Player>, PlayerError> {
        let name = self
            .default_player_for(item)
            .ok_or_else(|| PlayerError::NoPlayerFor(item.path.clone()))?;
        self.create_player(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        <playercorefactory>
          <players>
            <player name="Projector" type="dummy" audio="false" video="true"/>
          </players>
          <rules action="prepend">
            <rule name="mkv" filetypes="mkv|avi" player="Projector"/>
            <rule name="orphan" filetypes="mp3" player="Missing"/>
          </rules>
        </playercorefactory>"#;

    #[test]
    fn defaults_prefer_paplayer_for_audio() {
        let factory = PlayerCoreFactory::with_defaults();
        assert_eq!(
            factory.default_player_for(&MediaItem::new("/m/a.flac")).as_deref(),
            Some("PAPlayer")
        );
        assert_eq!(
            factory.player_names_for(&MediaItem::new("/m/film.mkv")),
            vec!["VideoPlayer".to_string()]
        );
    }

    #[test]
    fn prepended_rules_win() {
        let factory = PlayerCoreFactory::with_defaults();
        factory.apply_config(CONFIG).unwrap();

        assert_eq!(
            factory.player_names_for(&MediaItem::new("/m/film.mkv")),
            vec!["Projector".to_string(), "VideoPlayer".to_string()]
        );
        // rules naming unknown players are ignored
        assert_eq!(
            factory.default_player_for(&MediaItem::new("/m/a.mp3")).as_deref(),
            Some("PAPlayer")
        );
    }

    #[test]
    fn rejects_rule_without_player() {
        let factory = PlayerCoreFactory::with_defaults();
        let err = factory
            .apply_config("<playercorefactory><rules><rule filetypes=\"mkv\"/></rules></playercorefactory>")
            .unwrap_err();
        assert!(matches!(err, PlayerError::InvalidConfig(_)));
    }

    #[test]
    fn load_reads_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PLAYER_CORE_CONFIG_FILE), CONFIG).unwrap();

        let factory = PlayerCoreFactory::load(dir.path()).unwrap();
        assert_eq!(factory.players().len(), 3);
        let player = factory.create_player("Projector").unwrap();
        assert_eq!(player.name(), "Projector");
    }

    #[test]
    fn unknown_player_type_fails() {
        let factory = PlayerCoreFactory::with_defaults();
        factory
            .apply_config(
                r#"<playercorefactory><players><player name="Ext" type="external" video="true"/></players></playercorefactory>"#,
            )
            .unwrap();
        assert!(matches!(
            factory.create_player("Ext"),
            Err(PlayerError::InvalidConfig(_))
        ));
        assert!(matches!(
            factory.create_player("Nope"),
            Err(PlayerError::UnknownPlayer(_))
        ));
    }
}
