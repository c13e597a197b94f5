use bitflags::bitflags;

/// Host-supplied classification of an attribute owner.
///
/// The host decides which category an entity falls in; the core only uses it
/// to gate reads and writes against [`CategorySet`]s.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityCategory {
    /// Human-controlled owner
    Player,
    /// Hostile creature
    Monster,
    /// Passive creature
    Animal,
    /// Non-hostile scripted character
    Npc,
    /// Anything the host does not classify
    #[default]
    Other,
}

impl EntityCategory {
    /// The single-bit set for this category.
    pub const fn as_set(self) -> CategorySet {
        match self {
            Self::Player => CategorySet::PLAYER,
            Self::Monster => CategorySet::MONSTER,
            Self::Animal => CategorySet::ANIMAL,
            Self::Npc => CategorySet::NPC,
            Self::Other => CategorySet::OTHER,
        }
    }

    pub const fn is_player(self) -> bool {
        matches!(self, Self::Player)
    }
}

bitflags! {
    /// Set of categories an attribute definition applies to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CategorySet: u8 {
        const PLAYER  = 1 << 0;
        const MONSTER = 1 << 1;
        const ANIMAL  = 1 << 2;
        const NPC     = 1 << 3;
        const OTHER   = 1 << 4;

        /// Players and monsters.
        const COMBAT     = Self::PLAYER.bits() | Self::MONSTER.bits();
        /// Every category except players.
        const NON_PLAYER = Self::MONSTER.bits()
            | Self::ANIMAL.bits()
            | Self::NPC.bits()
            | Self::OTHER.bits();
    }
}

impl CategorySet {
    pub const fn contains_category(self, category: EntityCategory) -> bool {
        self.contains(category.as_set())
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

impl From<EntityCategory> for CategorySet {
    fn from(category: EntityCategory) -> Self {
        category.as_set()
    }
}
