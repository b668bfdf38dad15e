use std::fmt;

use serde::{Deserialize, Serialize};

/// Enemies placed in every chapter.
pub const ENEMY_SLOTS: usize = 3;
/// Resources placed in every chapter.
pub const RESOURCE_SLOTS: usize = 3;

/// What kind of interactable object an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A monster to fight.
    Enemy,
    /// A block to mine.
    Resource,
    /// The quest giver.
    Npc,
}

impl EntityKind {
    /// Parse a kind from its wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enemy" => Some(Self::Enemy),
            "resource" => Some(Self::Resource),
            "npc" => Some(Self::Npc),
            _ => None,
        }
    }

    /// Verb shown to the player when interacting with this kind.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Enemy => "Fight Enemy",
            Self::Resource => "Mine Resource",
            Self::Npc => "Quest",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enemy => write!(f, "enemy"),
            Self::Resource => write!(f, "resource"),
            Self::Npc => write!(f, "npc"),
        }
    }
}

/// Stable per-chapter identifier of an interactable object,
/// e.g. `3-enemy-0` or `default-npc-teacher`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Id of the `index`-th enemy or resource of a chapter.
    pub fn slot(prefix: &str, kind: EntityKind, index: usize) -> Self {
        match kind {
            EntityKind::Npc => Self::quest_giver(prefix),
            _ => Self(format!("{prefix}-{kind}-{index}")),
        }
    }

    /// Id of the chapter's quest giver.
    pub fn quest_giver(prefix: &str) -> Self {
        Self(format!("{prefix}-npc-teacher"))
    }

    /// Wrap an arbitrary id string.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An interactable object in the current chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable id.
    pub id: EntityId,
    /// Kind of object.
    pub kind: EntityKind,
    /// Display name.
    pub name: String,
}

/// Named enemies and resources of a subject world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRoster {
    /// Name of the world.
    pub world_name: String,
    /// Enemy names, one per enemy slot.
    pub enemies: Vec<String>,
    /// Resource names, one per resource slot.
    pub resources: Vec<String>,
}

impl Default for ChapterRoster {
    fn default() -> Self {
        Self::new(
            "Number Fields",
            ["Math Monster", "Number Ninja", "Equation Dragon"],
            ["Gold Block", "XP Crystal", "Star Gem"],
        )
    }
}

impl ChapterRoster {
    fn new(world: &str, enemies: [&str; ENEMY_SLOTS], resources: [&str; RESOURCE_SLOTS]) -> Self {
        Self {
            world_name: world.to_string(),
            enemies: enemies.iter().map(|s| s.to_string()).collect(),
            resources: resources.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// The built-in world for a subject. Unknown subjects get the math world.
    pub fn for_subject(subject: &str) -> Self {
        match subject {
            "Science" => Self::new(
                "Neon Lab Zone",
                ["Battery Bot", "Molecule Monster", "Gravity Golem"],
                ["Energy Cell", "Atom Fragment", "DNA Strand"],
            ),
            "History" => Self::new(
                "Ancient Ruins",
                ["Pharaoh's Curse", "Viking Raider", "Knight Specter"],
                ["Gold Coin", "Ancient Artifact", "Scroll of Wisdom"],
            ),
            "Geography" => Self::new(
                "Terra Nova",
                ["Storm Sprite", "Volcano Giant", "Tornado Spirit"],
                ["Map Fragment", "Compass Crystal", "Landmark Stone"],
            ),
            "English" => Self::new(
                "Storybook Library",
                ["Grammar Goblin", "Spelling Spider", "Punctuation Poltergeist"],
                ["Word Gem", "Story Page", "Magic Quill"],
            ),
            _ => Self::new(
                "Crystal Peaks",
                ["Subtraction Slime", "Division Dragon", "Fraction Phantom"],
                ["Number Block", "Shape Crystal", "Equation Ore"],
            ),
        }
    }

    /// All interactable entities of a chapter, enemies first, quest giver last.
    pub fn entities(&self, prefix: &str) -> Vec<Entity> {
        let mut out = Vec::with_capacity(ENEMY_SLOTS + RESOURCE_SLOTS + 1);
        for index in 0..ENEMY_SLOTS {
            out.push(Entity {
                id: EntityId::slot(prefix, EntityKind::Enemy, index),
                kind: EntityKind::Enemy,
                name: slot_name(&self.enemies, index, "Enemy"),
            });
        }
        for index in 0..RESOURCE_SLOTS {
            out.push(Entity {
                id: EntityId::slot(prefix, EntityKind::Resource, index),
                kind: EntityKind::Resource,
                name: slot_name(&self.resources, index, "Resource"),
            });
        }
        out.push(Entity {
            id: EntityId::quest_giver(prefix),
            kind: EntityKind::Npc,
            name: "Teacher".to_string(),
        });
        out
    }

    /// Ids that must all be attempted before the chapter is complete.
    pub fn required_ids(&self, prefix: &str) -> Vec<EntityId> {
        self.entities(prefix).into_iter().map(|e| e.id).collect()
    }

    /// Map an interaction on a named object to its entity. Names that are not
    /// on the roster map to slot 0 of their kind.
    pub fn resolve(&self, prefix: &str, kind: EntityKind, name: &str) -> Entity {
        let index = match kind {
            EntityKind::Enemy => self.enemies.iter().position(|n| n == name),
            EntityKind::Resource => self.resources.iter().position(|n| n == name),
            EntityKind::Npc => None,
        }
        .unwrap_or(0);
        Entity {
            id: EntityId::slot(prefix, kind, index),
            kind,
            name: name.to_string(),
        }
    }
}

fn slot_name(names: &[String], index: usize, fallback: &str) -> String {
    names
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("{fallback} {}", index + 1))
}
