//! Card database, deck lists and Commander deck validation.
//!
//! The database is a JSON file holding either an array of card records or an
//! object whose values are card records. Records without an id or a name are
//! skipped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::card::{CardBuilder, PowerToughness, PtValue};
use crate::color::ColorSet;
use crate::error::CardDbError;
use crate::game::PlayerDeck;
use crate::ids::CardId;

/// Basic land names exempt from the singleton rule.
pub const BASIC_LAND_NAMES: &[&str] = &["Plains", "Island", "Swamp", "Mountain", "Forest", "Wastes"];

/// Cards not allowed in Commander.
pub const COMMANDER_BANLIST: &[&str] = &[
    "Ancestral Recall",
    "Balance",
    "Biorhythm",
    "Black Lotus",
    "Channel",
    "Dockside Extortionist",
    "Emrakul, the Aeons Torn",
    "Erayo, Soratami Ascendant",
    "Fastbond",
    "Flash",
    "Golos, Tireless Pilgrim",
    "Griselbrand",
    "Hullbreacher",
    "Iona, Shield of Emeria",
    "Jeweled Lotus",
    "Karakas",
    "Leovold, Emissary of Trest",
    "Library of Alexandria",
    "Limited Resources",
    "Lutri, the Spellchaser",
    "Mana Crypt",
    "Mox Emerald",
    "Mox Jet",
    "Mox Pearl",
    "Mox Ruby",
    "Mox Sapphire",
    "Nadu, Winged Wisdom",
    "Paradox Engine",
    "Primeval Titan",
    "Prophet of Kruphix",
    "Recurring Nightmare",
    "Rofellos, Llanowar Emissary",
    "Sundering Titan",
    "Sylvan Primordial",
    "Time Vault",
    "Time Walk",
    "Tinker",
    "Tolarian Academy",
    "Trade Secrets",
    "Upheaval",
    "Yawgmoth's Bargain",
];

/// Cards in a legal Commander deck, commander included.
pub const COMMANDER_DECK_SIZE: usize = 100;

/// One card record as stored in the database file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub type_line: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default, alias = "text")]
    pub oracle_text: String,
    #[serde(default, deserialize_with = "stat_text")]
    pub power: Option<String>,
    #[serde(default, deserialize_with = "stat_text")]
    pub toughness: Option<String>,
    #[serde(default, deserialize_with = "stat_text")]
    pub loyalty: Option<String>,
    /// Color letters ("W", "U", ...). Empty means computed from cost and text.
    #[serde(default)]
    pub color_identity: Vec<String>,
}

impl CardRecord {
    /// A builder for one copy of this card.
    pub fn to_builder(&self) -> CardBuilder {
        let mut builder = CardBuilder::new(self.name.clone())
            .card_id(CardId::new(self.id.clone()))
            .cost(&self.mana_cost)
            .type_line(&self.type_line)
            .oracle_text(self.oracle_text.clone());

        let power = self.power.as_deref().and_then(PtValue::parse);
        let toughness = self.toughness.as_deref().and_then(PtValue::parse);
        if let (Some(power), Some(toughness)) = (power, toughness) {
            builder = builder.printed_pt(PowerToughness { power, toughness });
        }
        if let Some(loyalty) = self.loyalty.as_deref().and_then(|l| l.trim().parse().ok()) {
            builder = builder.loyalty(loyalty);
        }
        if !self.color_identity.is_empty() {
            builder = builder.color_identity(ColorSet::from_letters(&self.color_identity.concat()));
        }
        builder
    }

    /// Color identity from the record, or computed from cost and text.
    pub fn identity(&self) -> ColorSet {
        self.to_builder().computed_identity()
    }

    pub fn is_basic_land(&self) -> bool {
        BASIC_LAND_NAMES
            .iter()
            .any(|basic| basic.eq_ignore_ascii_case(self.name.trim()))
    }
}

/// Power, toughness and loyalty appear as numbers or as strings ("*").
fn stat_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Lowercases and collapses every run of non-alphanumerics to one space.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut gap = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if gap && !out.is_empty() {
                out.push(' ');
            }
            gap = false;
            out.extend(c.to_lowercase());
        } else {
            gap = true;
        }
    }
    out
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDatabase {
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    records: Vec<CardRecord>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
}

impl CardDatabase {
    pub fn new(records: Vec<CardRecord>) -> Self {
        let mut db = Self::default();
        for record in records {
            db.insert(record);
        }
        db
    }

    pub fn from_json_str(json: &str) -> Result<Self, CardDbError> {
        let raw: RawDatabase = serde_json::from_str(json)?;
        let values: Vec<Value> = match raw {
            RawDatabase::List(values) => values,
            RawDatabase::Map(map) => map.into_values().collect(),
        };
        let mut skipped = 0;
        let records = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<CardRecord>(value) {
                Ok(record) => Some(record),
                Err(_) => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        let db = Self::new(records);
        tracing::debug!(cards = db.len(), skipped, "card database loaded");
        Ok(db)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CardDbError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Adds a record. A later record with the same id or name shadows the
    /// earlier one in lookups.
    pub fn insert(&mut self, record: CardRecord) {
        let index = self.records.len();
        self.by_id.insert(record.id.clone(), index);
        self.by_name.insert(record.name.to_lowercase(), index);
        self.by_normalized.insert(normalize_name(&record.name), index);
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&CardRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    /// Case-insensitive name lookup, falling back to the normalized name.
    pub fn by_name(&self, name: &str) -> Option<&CardRecord> {
        let name = name.trim();
        self.by_name
            .get(&name.to_lowercase())
            .or_else(|| self.by_normalized.get(&normalize_name(name)))
            .map(|&i| &self.records[i])
    }

    pub fn builder(&self, name: &str) -> Result<CardBuilder, CardDbError> {
        self.by_name(name)
            .map(CardRecord::to_builder)
            .ok_or_else(|| CardDbError::UnknownCard(name.to_string()))
    }

    /// Builds a player's deck from a list. Every name must be known.
    pub fn deck_for(&self, player_name: &str, list: &DeckList) -> Result<PlayerDeck, CardDbError> {
        let mut deck = PlayerDeck::new(player_name);
        for entry in &list.entries {
            let builder = self.builder(&entry.name)?;
            for _ in 0..entry.count {
                deck.cards.push(builder.clone());
            }
        }
        if let Some(commander) = &list.commander {
            deck.commander = Some(self.builder(commander)?);
        }
        Ok(deck)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub count: u32,
    pub name: String,
}

/// A parsed plain-text deck list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub commander: Option<String>,
    pub entries: Vec<DeckEntry>,
}

impl DeckList {
    /// Parses one entry per line: an optional count ("4", "4x") then the
    /// card name. Blank lines and `#` comments are skipped; a line starting
    /// with `Commander:` names the commander.
    pub fn parse(text: &str) -> Self {
        let mut list = DeckList::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = strip_prefix_ignore_case(line, "commander:") {
                let (_, name) = split_count(rest.trim());
                if !name.is_empty() {
                    list.commander = Some(name.to_string());
                }
                continue;
            }
            let (count, name) = split_count(line);
            if count == 0 || name.is_empty() {
                continue;
            }
            list.entries.push(DeckEntry {
                count,
                name: name.to_string(),
            });
        }
        list
    }

    /// Cards in the list, commander included.
    pub fn total_cards(&self) -> usize {
        let main: usize = self.entries.iter().map(|e| e.count as usize).sum();
        main + usize::from(self.commander.is_some())
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &line[prefix.len()..])
}

fn split_count(line: &str) -> (u32, &str) {
    let Some((first, rest)) = line.split_once(char::is_whitespace) else {
        return (1, line);
    };
    let digits = first.strip_suffix(['x', 'X']).unwrap_or(first);
    match digits.parse::<u32>() {
        Ok(count) => (count, rest.trim()),
        Err(_) => (1, line),
    }
}

/// One problem found by [`validate_commander_deck`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckIssue {
    MissingCommander,
    UnknownCard(String),
    WrongSize { found: usize },
    NotSingleton(Vec<String>),
    Banned(Vec<String>),
    OffColor(Vec<String>),
}

impl std::fmt::Display for DeckIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckIssue::MissingCommander => write!(f, "missing commander"),
            DeckIssue::UnknownCard(name) => write!(f, "card not in database: {name}"),
            DeckIssue::WrongSize { found } => write!(
                f,
                "deck size {found} (expected {COMMANDER_DECK_SIZE} incl. commander)"
            ),
            DeckIssue::NotSingleton(names) => write!(f, "non-singleton: {}", names.join(", ")),
            DeckIssue::Banned(names) => write!(f, "banned: {}", names.join(", ")),
            DeckIssue::OffColor(names) => write!(f, "off-color: {}", names.join(", ")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckReport {
    pub issues: Vec<DeckIssue>,
}

impl DeckReport {
    pub fn is_legal(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks a deck against the Commander construction rules: a commander,
/// exactly 100 cards, singleton except basic lands, nothing banned, and
/// every card within the commander's color identity.
///
/// The check is advisory; a match can still be started with the deck.
pub fn validate_commander_deck(db: &CardDatabase, list: &DeckList, banned: &[&str]) -> DeckReport {
    let mut issues = Vec::new();
    let banned: HashSet<String> = banned.iter().map(|name| name.to_lowercase()).collect();
    let is_banned = |record: &CardRecord| banned.contains(&record.name.to_lowercase());

    let commander = match &list.commander {
        None => {
            issues.push(DeckIssue::MissingCommander);
            None
        }
        Some(name) => {
            let record = db.by_name(name);
            if record.is_none() {
                issues.push(DeckIssue::UnknownCard(name.clone()));
            }
            record
        }
    };

    let total = list.total_cards();
    if total != COMMANDER_DECK_SIZE {
        issues.push(DeckIssue::WrongSize { found: total });
    }

    let mut banned_hits: Vec<String> = commander
        .filter(|record| is_banned(record))
        .map(|record| record.name.clone())
        .into_iter()
        .collect();
    let mut copies: BTreeMap<String, u32> = BTreeMap::new();
    let mut off_color = Vec::new();
    let identity = commander.map(CardRecord::identity);

    for entry in &list.entries {
        let Some(record) = db.by_name(&entry.name) else {
            issues.push(DeckIssue::UnknownCard(entry.name.clone()));
            continue;
        };
        if is_banned(record) {
            banned_hits.push(record.name.clone());
        }
        if !record.is_basic_land() {
            *copies.entry(record.name.clone()).or_default() += entry.count;
        }
        if let Some(identity) = identity
            && !identity.contains_all(record.identity())
        {
            off_color.push(record.name.clone());
        }
    }
    if let Some(commander) = commander
        && copies.contains_key(&commander.name)
    {
        *copies.entry(commander.name.clone()).or_default() += 1;
    }

    let duplicates: Vec<String> = copies
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    if !duplicates.is_empty() {
        issues.push(DeckIssue::NotSingleton(duplicates));
    }
    if !banned_hits.is_empty() {
        banned_hits.sort();
        banned_hits.dedup();
        issues.push(DeckIssue::Banned(banned_hits));
    }
    if !off_color.is_empty() {
        off_color.sort();
        off_color.dedup();
        issues.push(DeckIssue::OffColor(off_color));
    }

    tracing::debug!(issues = issues.len(), "deck validated");
    DeckReport { issues }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, type_line: &str, cost: &str) -> CardRecord {
        CardRecord {
            id: id.to_string(),
            name: name.to_string(),
            type_line: type_line.to_string(),
            mana_cost: cost.to_string(),
            oracle_text: String::new(),
            power: None,
            toughness: None,
            loyalty: None,
            color_identity: Vec::new(),
        }
    }

    fn test_db() -> CardDatabase {
        CardDatabase::new(vec![
            record("c1", "Marwyn, the Nurturer", "Legendary Creature — Elf Druid", "{2}{G}"),
            record("l1", "Forest", "Basic Land — Forest", ""),
            record("g1", "Llanowar Elves", "Creature — Elf Druid", "{G}"),
            record("r1", "Lightning Bolt", "Instant", "{R}"),
            record("b1", "Tinker", "Sorcery", "{2}{U}"),
        ])
    }

    #[test]
    fn test_normalize_name_collapses_punctuation() {
        assert_eq!(normalize_name("Marwyn, the  Nurturer"), "marwyn the nurturer");
        assert_eq!(normalize_name("  Yawgmoth's Bargain "), "yawgmoth s bargain");
    }

    #[test]
    fn test_lookup_by_id_name_and_normalized_name() {
        let db = test_db();
        assert_eq!(db.get("g1").map(|r| r.name.as_str()), Some("Llanowar Elves"));
        assert!(db.by_name("llanowar elves").is_some());
        assert!(db.by_name("Marwyn the Nurturer").is_some());
        assert!(db.by_name("Grizzly Bears").is_none());
    }

    #[test]
    fn test_deck_list_parses_counts_comments_and_commander() {
        let list = DeckList::parse(
            "# ramp\nCommander: Marwyn, the Nurturer\n\n98 Forest\n1x Llanowar Elves\nSol Ring\n",
        );
        assert_eq!(list.commander.as_deref(), Some("Marwyn, the Nurturer"));
        assert_eq!(
            list.entries,
            vec![
                DeckEntry { count: 98, name: "Forest".into() },
                DeckEntry { count: 1, name: "Llanowar Elves".into() },
                DeckEntry { count: 1, name: "Sol Ring".into() },
            ]
        );
        assert_eq!(list.total_cards(), 101);
    }

    #[test]
    fn test_legal_deck_has_no_issues() {
        let db = test_db();
        let list = DeckList::parse("Commander: Marwyn, the Nurturer\n98 Forest\n1 Llanowar Elves");
        let report = validate_commander_deck(&db, &list, COMMANDER_BANLIST);
        assert!(report.is_legal(), "{:?}", report.issues);
    }

    #[test]
    fn test_deck_issues_are_all_reported() {
        let db = test_db();
        let list = DeckList::parse(
            "Commander: Marwyn, the Nurturer\n90 Forest\n2 Llanowar Elves\n1 Lightning Bolt\n1 Tinker",
        );
        let report = validate_commander_deck(&db, &list, COMMANDER_BANLIST);

        assert!(report.issues.contains(&DeckIssue::WrongSize { found: 95 }));
        assert!(report.issues.contains(&DeckIssue::NotSingleton(vec!["Llanowar Elves".into()])));
        assert!(report.issues.contains(&DeckIssue::Banned(vec!["Tinker".into()])));
        assert!(report.issues.contains(&DeckIssue::OffColor(vec![
            "Lightning Bolt".into(),
            "Tinker".into()
        ])));
    }

    #[test]
    fn test_missing_commander_reported() {
        let db = test_db();
        let report = validate_commander_deck(&db, &DeckList::parse("99 Forest"), &[]);
        assert_eq!(report.issues.first(), Some(&DeckIssue::MissingCommander));
    }

    #[test]
    fn test_record_builder_carries_stats() {
        let mut elf = record("g1", "Llanowar Elves", "Creature — Elf Druid", "{G}");
        elf.power = Some("1".into());
        elf.toughness = Some("1".into());
        let card = elf.to_builder().build();
        assert_eq!(card.base_power(), Some(1));
        assert_eq!(card.base_toughness(), Some(1));
        assert_eq!(card.card_id.as_str(), "g1");
        assert!(card.is_creature());
    }
}
