//! Reference table of characters and the names accepted for them

use crate::types::CharaId;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Alt name used when an entry only carries its canonical name
pub const UNKNOWN_ALT_NAME: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum AnswerKeyError {
    #[error("failed to read answer key {path}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("invalid answer key json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("answer key has no entries")]
    Empty,

    #[error("entry {0} has no names")]
    NamelessEntry(CharaId),
}

/// (id, canonical name, alternate name, extra aliases)
const BUILTIN: &[(CharaId, &str, &str, &[&str])] = &[
    (1, "妙蛙种子", "Bulbasaur", &[]),
    (2, "妙蛙草", "Ivysaur", &[]),
    (3, "妙蛙花", "Venusaur", &[]),
    (4, "小火龙", "Charmander", &["小火龍"]),
    (5, "火恐龙", "Charmeleon", &[]),
    (6, "喷火龙", "Charizard", &[]),
    (7, "杰尼龟", "Squirtle", &[]),
    (8, "卡咪龟", "Wartortle", &[]),
    (9, "水箭龟", "Blastoise", &[]),
    (10, "绿毛虫", "Caterpie", &[]),
    (16, "波波", "Pidgey", &[]),
    (19, "小拉达", "Rattata", &[]),
    (25, "皮卡丘", "Pikachu", &["比卡超"]),
    (26, "雷丘", "Raichu", &[]),
    (35, "皮皮", "Clefairy", &[]),
    (39, "胖丁", "Jigglypuff", &[]),
    (52, "喵喵", "Meowth", &[]),
    (54, "可达鸭", "Psyduck", &[]),
    (94, "耿鬼", "Gengar", &[]),
    (129, "鲤鱼王", "Magikarp", &[]),
    (130, "暴鲤龙", "Gyarados", &[]),
    (131, "拉普拉斯", "Lapras", &[]),
    (133, "伊布", "Eevee", &[]),
    (143, "卡比兽", "Snorlax", &[]),
    (150, "超梦", "Mewtwo", &["超夢"]),
    (151, "梦幻", "Mew", &[]),
];

/// A drawn answer for a new round
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: CharaId,
    pub name: String,
    pub alt_name: String,
}

/// Static mapping from character id to accepted names.
/// The first name of an entry is canonical, the second its alternate name.
#[derive(Debug, Clone)]
pub struct AnswerKey {
    entries: BTreeMap<CharaId, Vec<String>>,
}

impl AnswerKey {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(id, name, alt, aliases)| {
                let names = [*name, *alt]
                    .iter()
                    .chain(aliases.iter())
                    .map(|s| s.to_string())
                    .collect();
                (*id, names)
            })
            .collect();

        Self { entries }
    }

    pub fn from_entries(entries: BTreeMap<CharaId, Vec<String>>) -> Result<Self, AnswerKeyError> {
        if entries.is_empty() {
            return Err(AnswerKeyError::Empty);
        }
        if let Some((id, _)) = entries.iter().find(|(_, names)| names.is_empty()) {
            return Err(AnswerKeyError::NamelessEntry(*id));
        }
        Ok(Self { entries })
    }

    /// Parse `{"25": ["皮卡丘", "Pikachu", ...], ...}`
    pub fn from_json(json: &str) -> Result<Self, AnswerKeyError> {
        let entries: BTreeMap<CharaId, Vec<String>> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    pub fn from_file(path: &Path) -> Result<Self, AnswerKeyError> {
        let json = std::fs::read_to_string(path).map_err(|source| AnswerKeyError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_json(&json)
    }

    /// Load the configured key, or the built-in table when none is configured
    pub fn load(path: Option<&Path>) -> Result<Self, AnswerKeyError> {
        match path {
            Some(path) => {
                let key = Self::from_file(path)?;
                tracing::info!("Loaded {} answers from {}", key.len(), path.display());
                Ok(key)
            }
            None => Ok(Self::builtin()),
        }
    }

    /// All accepted names for an id, canonical first
    pub fn names(&self, id: CharaId) -> &[String] {
        self.entries.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn answer(&self, id: CharaId) -> Option<Answer> {
        let names = self.entries.get(&id)?;
        let name = names.first()?.clone();
        let alt_name = names
            .get(1)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_ALT_NAME.to_string());

        Some(Answer { id, name, alt_name })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Answer> {
        let id = *self.entries.keys().choose(rng)?;
        self.answer(id)
    }

    pub fn pick_random(&self) -> Option<Answer> {
        self.pick(&mut rand::rng())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnswerKey {
    fn default() -> Self {
        Self::builtin()
    }
}
