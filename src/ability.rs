//! Best-effort classification of rules text into ability descriptors.
//!
//! Each sentence of a card's rules text is matched against a small set of
//! patterns, in order:
//!
//! 1. triggered abilities ("When ... enters the battlefield, ...")
//! 2. activated abilities ("{2}, {T}: ...", loyalty and equip costs)
//! 3. static abilities (P/T buffs, keyword grants, bare keyword lines)
//!
//! Anything else becomes [`Ability::Unmodeled`], which keeps the raw text so
//! diagnostics can tell "parsed, does nothing" apart from "not understood".

use crate::mana::{ManaCost, ManaSymbol};

/// Keywords the engine recognizes as standalone static abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Flying,
    Trample,
    Deathtouch,
    Vigilance,
    Haste,
    Reach,
    Lifelink,
    Menace,
    FirstStrike,
    DoubleStrike,
    Flash,
    Defender,
}

impl Keyword {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "flying" => Some(Keyword::Flying),
            "trample" => Some(Keyword::Trample),
            "deathtouch" => Some(Keyword::Deathtouch),
            "vigilance" => Some(Keyword::Vigilance),
            "haste" => Some(Keyword::Haste),
            "reach" => Some(Keyword::Reach),
            "lifelink" => Some(Keyword::Lifelink),
            "menace" => Some(Keyword::Menace),
            "first strike" => Some(Keyword::FirstStrike),
            "double strike" => Some(Keyword::DoubleStrike),
            "flash" => Some(Keyword::Flash),
            "defender" => Some(Keyword::Defender),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Flying => "Flying",
            Keyword::Trample => "Trample",
            Keyword::Deathtouch => "Deathtouch",
            Keyword::Vigilance => "Vigilance",
            Keyword::Haste => "Haste",
            Keyword::Reach => "Reach",
            Keyword::Lifelink => "Lifelink",
            Keyword::Menace => "Menace",
            Keyword::FirstStrike => "First strike",
            Keyword::DoubleStrike => "Double strike",
            Keyword::Flash => "Flash",
            Keyword::Defender => "Defender",
        }
    }
}

/// What kind of game event a triggered ability listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerCategory {
    /// The source itself enters the battlefield.
    EntersBattlefield,
    /// The source attacks.
    Attacks,
    /// The source dies.
    Dies,
    /// Beginning of an upkeep step.
    BeginningOfUpkeep,
    /// A creature enters the battlefield under the source controller's control.
    CreatureEntersUnderYourControl,
}

impl TriggerCategory {
    /// Leaves-the-battlefield triggers fire after the source is gone.
    pub fn is_leaves_battlefield(&self) -> bool {
        matches!(self, TriggerCategory::Dies)
    }
}

/// Target-type hint inferred from effect text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetHint {
    Creature,
    Player,
    Permanent,
    /// "any target": a creature, planeswalker or player.
    Any,
}

impl TargetHint {
    pub fn infer(effect_text: &str) -> Option<Self> {
        let lower = effect_text.to_ascii_lowercase();
        if lower.contains("any target") {
            Some(TargetHint::Any)
        } else if lower.contains("target creature") {
            Some(TargetHint::Creature)
        } else if lower.contains("target player") || lower.contains("target opponent") {
            Some(TargetHint::Player)
        } else if lower.contains("target permanent")
            || lower.contains("target artifact")
            || lower.contains("target enchantment")
            || lower.contains("target land")
        {
            Some(TargetHint::Permanent)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredAbility {
    pub category: TriggerCategory,
    pub effect_text: String,
    pub raw_text: String,
}

impl TriggeredAbility {
    /// "Whenever another creature ..." excludes the source itself.
    pub fn excludes_source(&self) -> bool {
        self.raw_text.to_ascii_lowercase().contains("another")
    }

    /// "At the beginning of each upkeep" fires on every player's upkeep.
    pub fn any_player_upkeep(&self) -> bool {
        self.raw_text.to_ascii_lowercase().contains("each upkeep")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedAbility {
    /// Cost text left of the colon.
    pub raw_cost: String,
    pub tap_cost: bool,
    pub mana_cost: ManaCost,
    /// Loyalty change for planeswalker abilities (+1, -3, 0).
    pub loyalty_cost: Option<i32>,
    /// Non-mana costs the engine records but does not pay ("Sacrifice a creature").
    pub other_costs: Vec<String>,
    pub effect_text: String,
    pub target_hint: Option<TargetHint>,
    /// Equip and loyalty abilities, or "Activate only as a sorcery."
    pub sorcery_speed: bool,
    pub raw_text: String,
}

impl ActivatedAbility {
    pub fn needs_target(&self) -> bool {
        self.target_hint.is_some()
    }

    /// Mana abilities produce mana, don't target, and resolve immediately.
    pub fn is_mana_ability(&self) -> bool {
        self.target_hint.is_none()
            && self.loyalty_cost.is_none()
            && self.effect_text.to_ascii_lowercase().starts_with("add ")
    }

    /// Mana this ability can produce, as alternative bundles.
    ///
    /// `Add {G} or {W}` is `[[G], [W]]`, `Add {C}{C}` is `[[C, C]]`.
    pub fn mana_output(&self) -> Vec<Vec<ManaSymbol>> {
        parse_mana_output(&self.effect_text)
    }
}

/// Which permanents a static buff affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffScope {
    /// Creatures the source's controller controls.
    CreaturesYouControl { other_only: bool },
    /// The creature the source (aura or equipment) is attached to.
    AttachedCreature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticBuff {
    pub scope: BuffScope,
    pub power: i32,
    pub toughness: i32,
    pub keywords: Vec<Keyword>,
}

impl StaticBuff {
    pub fn other_only(&self) -> bool {
        matches!(
            self.scope,
            BuffScope::CreaturesYouControl { other_only: true }
        )
    }
}

/// A parsed ability descriptor. Immutable and shared by every instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ability {
    Keyword(Keyword),
    Triggered(TriggeredAbility),
    Activated(ActivatedAbility),
    StaticBuff(StaticBuff),
    /// Text no pattern matched; carries no executable effect.
    Unmodeled(String),
}

impl Ability {
    pub fn as_activated(&self) -> Option<&ActivatedAbility> {
        match self {
            Ability::Activated(ability) => Some(ability),
            _ => None,
        }
    }

    pub fn as_triggered(&self) -> Option<&TriggeredAbility> {
        match self {
            Ability::Triggered(ability) => Some(ability),
            _ => None,
        }
    }

    pub fn is_unmodeled(&self) -> bool {
        matches!(self, Ability::Unmodeled(_))
    }
}

/// Parses rules text into ability descriptors, one or more per sentence.
pub fn parse_abilities(text: &str) -> Vec<Ability> {
    let mut abilities: Vec<Ability> = Vec::new();

    for sentence in split_sentences(text) {
        let lower = sentence.to_ascii_lowercase();

        if lower.starts_with("activate only as a sorcery") {
            if let Some(Ability::Activated(previous)) = abilities.last_mut() {
                previous.sorcery_speed = true;
                continue;
            }
        }

        if let Some(triggered) = parse_triggered(&sentence) {
            abilities.push(Ability::Triggered(triggered));
        } else if let Some(activated) = parse_activated(&sentence) {
            abilities.push(Ability::Activated(activated));
        } else if let Some(buff) = parse_static_buff(&sentence) {
            abilities.push(Ability::StaticBuff(buff));
        } else if let Some(keywords) = parse_keyword_line(&sentence) {
            abilities.extend(keywords.into_iter().map(Ability::Keyword));
        } else {
            tracing::debug!(text = %sentence, "unmodeled ability text");
            abilities.push(Ability::Unmodeled(sentence));
        }
    }

    abilities
}

/// Splits on newlines and ". ", dropping parenthesized reminder text.
fn split_sentences(text: &str) -> Vec<String> {
    let mut stripped = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    let mut sentences = Vec::new();
    for line in stripped.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(". ").collect();
        let last = parts.len() - 1;
        for (i, part) in parts.into_iter().enumerate() {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            // Only the final sentence on a line keeps its period.
            if i == last {
                sentences.push(part.to_string());
            } else {
                sentences.push(part.trim_end_matches('.').to_string());
            }
        }
    }
    sentences
}

/// Text after the first comma following `marker_end`, if any.
fn effect_after(sentence: &str, marker_end: usize) -> Option<String> {
    let comma = sentence[marker_end..].find(',')? + marker_end;
    let effect = sentence[comma + 1..].trim();
    (!effect.is_empty()).then(|| effect.to_string())
}

fn parse_triggered(sentence: &str) -> Option<TriggeredAbility> {
    let lower = sentence.to_ascii_lowercase();
    let make = |category, effect_text| TriggeredAbility {
        category,
        effect_text,
        raw_text: sentence.to_string(),
    };

    let starts_when = lower.starts_with("when ") || lower.starts_with("whenever ");

    // Checked before the generic enters pattern.
    if (lower.starts_with("whenever a creature") || lower.starts_with("whenever another creature"))
        && (lower.contains("under your control") || lower.contains("creature you control"))
    {
        if let Some(pos) = lower.find(" enters") {
            let effect = effect_after(sentence, pos)?;
            return Some(make(TriggerCategory::CreatureEntersUnderYourControl, effect));
        }
    }

    if starts_when {
        if let Some(pos) = lower.find(" enters") {
            let effect = effect_after(sentence, pos)?;
            return Some(make(TriggerCategory::EntersBattlefield, effect));
        }
        if lower.starts_with("whenever ") {
            if let Some(pos) = lower.find(" attacks") {
                let effect = effect_after(sentence, pos)?;
                return Some(make(TriggerCategory::Attacks, effect));
            }
        }
        if let Some(pos) = lower.find(" dies") {
            let effect = effect_after(sentence, pos)?;
            return Some(make(TriggerCategory::Dies, effect));
        }
    }

    if lower.starts_with("at the beginning of") {
        if let Some(pos) = lower.find("upkeep") {
            let effect = effect_after(sentence, pos)?;
            return Some(make(TriggerCategory::BeginningOfUpkeep, effect));
        }
    }

    None
}

fn parse_activated(sentence: &str) -> Option<ActivatedAbility> {
    let lower = sentence.to_ascii_lowercase();

    // "Equip {2}" has no colon.
    if let Some(rest) = lower.strip_prefix("equip") {
        let rest = rest.trim_start_matches(':').trim();
        if rest.starts_with('{') {
            let cost_text = &sentence[sentence.len() - rest.len()..];
            let cost_text = cost_text.trim_end_matches('.').trim();
            return Some(ActivatedAbility {
                raw_cost: cost_text.to_string(),
                tap_cost: false,
                mana_cost: ManaCost::parse(cost_text),
                loyalty_cost: None,
                other_costs: Vec::new(),
                effect_text: "Attach to target creature you control.".to_string(),
                target_hint: Some(TargetHint::Creature),
                sorcery_speed: true,
                raw_text: sentence.to_string(),
            });
        }
    }

    let (cost, effect) = sentence.split_once(':')?;
    let cost = cost.trim();
    let effect = effect.trim();
    if cost.is_empty() || effect.is_empty() {
        return None;
    }

    let mut tap_cost = false;
    let mut mana_text = String::new();
    let mut loyalty_cost = None;
    let mut other_costs = Vec::new();

    for token in cost.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let upper = token.to_ascii_uppercase();
        if upper == "{T}" || upper == "T" {
            tap_cost = true;
        } else if token.starts_with('{') {
            let mut rest = token;
            // "{T}" may share a token with mana symbols
            while let Some(start) = rest.find('{') {
                let Some(end) = rest[start..].find('}') else {
                    break;
                };
                let symbol = &rest[start..start + end + 1];
                if symbol.eq_ignore_ascii_case("{T}") {
                    tap_cost = true;
                } else {
                    mana_text.push_str(symbol);
                }
                rest = &rest[start + end + 1..];
            }
        } else if let Some(loyalty) = parse_loyalty(token) {
            loyalty_cost = Some(loyalty);
        } else if is_cost_phrase(token) {
            other_costs.push(token.to_string());
        } else {
            return None;
        }
    }

    Some(ActivatedAbility {
        raw_cost: cost.to_string(),
        tap_cost,
        mana_cost: ManaCost::parse(&mana_text),
        sorcery_speed: loyalty_cost.is_some(),
        loyalty_cost,
        other_costs,
        effect_text: effect.to_string(),
        target_hint: TargetHint::infer(effect),
        raw_text: sentence.to_string(),
    })
}

/// "+1", "−2", "-X" style loyalty costs ("X" is treated as 0).
fn parse_loyalty(token: &str) -> Option<i32> {
    let normalized = token.replace('−', "-");
    let token = normalized.trim();
    if token == "0" {
        return Some(0);
    }
    let (sign, digits) = if let Some(rest) = token.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    if digits.eq_ignore_ascii_case("x") {
        return Some(0);
    }
    digits.parse::<i32>().ok().map(|n| sign * n)
}

fn is_cost_phrase(token: &str) -> bool {
    const VERBS: [&str; 7] = [
        "sacrifice",
        "discard",
        "pay",
        "exile",
        "remove",
        "tap",
        "return",
    ];
    let lower = token.to_ascii_lowercase();
    VERBS.iter().any(|verb| lower.starts_with(verb))
}

fn parse_static_buff(sentence: &str) -> Option<StaticBuff> {
    let lower = sentence.to_ascii_lowercase();
    let lower = lower.trim_end_matches('.');

    let (scope, rest) = if let Some(rest) = lower.strip_prefix("other creatures you control ") {
        (BuffScope::CreaturesYouControl { other_only: true }, rest)
    } else if let Some(rest) = lower.strip_prefix("creatures you control ") {
        (BuffScope::CreaturesYouControl { other_only: false }, rest)
    } else if let Some(rest) = lower
        .strip_prefix("equipped creature ")
        .or_else(|| lower.strip_prefix("enchanted creature "))
    {
        (BuffScope::AttachedCreature, rest)
    } else {
        return None;
    };

    // Temporary pumps are effects, not static abilities.
    if rest.contains("until end of turn") {
        return None;
    }

    let (power, toughness, keyword_text) =
        if let Some(after) = rest.strip_prefix("get ").or_else(|| rest.strip_prefix("gets ")) {
            let (delta, tail) = after.split_once(' ').unwrap_or((after, ""));
            let (power, toughness) = parse_pt_delta(delta)?;
            let keyword_text = tail
                .strip_prefix("and have ")
                .or_else(|| tail.strip_prefix("and has "))
                .unwrap_or("");
            if !tail.is_empty() && keyword_text.is_empty() {
                return None;
            }
            (power, toughness, keyword_text)
        } else if let Some(after) = rest.strip_prefix("have ").or_else(|| rest.strip_prefix("has ")) {
            (0, 0, after)
        } else {
            return None;
        };

    let keywords = if keyword_text.is_empty() {
        Vec::new()
    } else {
        parse_keyword_list(keyword_text)?
    };

    Some(StaticBuff {
        scope,
        power,
        toughness,
        keywords,
    })
}

/// "+1/+1", "-2/-0", "+2/-1".
pub(crate) fn parse_pt_delta(text: &str) -> Option<(i32, i32)> {
    let normalized = text.replace('−', "-");
    let (power, toughness) = normalized.split_once('/')?;
    Some((parse_signed(power)?, parse_signed(toughness)?))
}

fn parse_signed(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('+') {
        rest.parse().ok()
    } else if let Some(rest) = text.strip_prefix('-') {
        rest.parse::<i32>().ok().map(|n| -n)
    } else {
        None
    }
}

/// "flying", "flying and vigilance", "flying, trample, and haste".
pub(crate) fn parse_keyword_list(text: &str) -> Option<Vec<Keyword>> {
    let mut keywords = Vec::new();
    for chunk in text.split(',') {
        for word in chunk.split(" and ") {
            let word = word.trim().trim_start_matches("and ").trim();
            if word.is_empty() {
                continue;
            }
            keywords.push(Keyword::parse(word)?);
        }
    }
    (!keywords.is_empty()).then_some(keywords)
}

fn parse_keyword_line(sentence: &str) -> Option<Vec<Keyword>> {
    parse_keyword_list(sentence.trim_end_matches('.'))
}

/// Parses the mana an "Add ..." effect produces.
pub fn parse_mana_output(effect_text: &str) -> Vec<Vec<ManaSymbol>> {
    let lower = effect_text.to_ascii_lowercase();
    let Some(start) = lower.find("add ") else {
        return Vec::new();
    };
    let rest = &effect_text[start + 4..];
    let rest_lower = &lower[start + 4..];

    if rest_lower.contains("mana of any color") {
        let count = if rest_lower.starts_with("two") { 2 } else { 1 };
        return ManaSymbol::COLORED
            .iter()
            .map(|symbol| vec![*symbol; count])
            .collect();
    }

    rest.split(" or ")
        .map(|option| {
            let mut bundle = Vec::new();
            for pip in ManaCost::parse(option).pips() {
                match pip.first() {
                    Some(ManaSymbol::Generic(n)) => {
                        bundle.extend(std::iter::repeat_n(ManaSymbol::Colorless, *n as usize));
                    }
                    Some(symbol) if symbol.is_pool_kind() => bundle.push(*symbol),
                    _ => {}
                }
            }
            bundle
        })
        .filter(|bundle| !bundle.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(text: &str) -> Ability {
        let abilities = parse_abilities(text);
        assert_eq!(abilities.len(), 1, "{abilities:?}");
        abilities.into_iter().next().unwrap()
    }

    #[test]
    fn test_etb_draw_trigger() {
        // Elvish Visionary style
        let ability = single("When this creature enters the battlefield, draw a card.");
        let Ability::Triggered(triggered) = ability else {
            panic!("expected triggered ability");
        };
        assert_eq!(triggered.category, TriggerCategory::EntersBattlefield);
        assert_eq!(triggered.effect_text, "draw a card.");
    }

    #[test]
    fn test_modern_enters_wording() {
        let ability = single("When Wall of Omens enters, draw a card.");
        assert_eq!(
            ability.as_triggered().map(|t| t.category),
            Some(TriggerCategory::EntersBattlefield)
        );
    }

    #[test]
    fn test_creature_enters_under_your_control_beats_generic_etb() {
        // Soul Warden style wording narrowed to your creatures
        let ability =
            single("Whenever another creature enters the battlefield under your control, you gain 1 life.");
        let triggered = ability.as_triggered().unwrap();
        assert_eq!(
            triggered.category,
            TriggerCategory::CreatureEntersUnderYourControl
        );
        assert!(triggered.excludes_source());
        assert_eq!(triggered.effect_text, "you gain 1 life.");
    }

    #[test]
    fn test_attack_dies_and_upkeep_triggers() {
        let abilities = parse_abilities(
            "Whenever this creature attacks, you gain 2 life.\n\
             When this creature dies, draw a card.\n\
             At the beginning of your upkeep, you lose 1 life.",
        );
        let categories: Vec<_> = abilities
            .iter()
            .filter_map(|a| a.as_triggered().map(|t| t.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                TriggerCategory::Attacks,
                TriggerCategory::Dies,
                TriggerCategory::BeginningOfUpkeep
            ]
        );
    }

    #[test]
    fn test_tap_mana_ability() {
        let ability = single("{T}: Add {G}.");
        let activated = ability.as_activated().unwrap();
        assert!(activated.tap_cost);
        assert!(activated.mana_cost.is_empty());
        assert!(activated.is_mana_ability());
        assert_eq!(activated.mana_output(), vec![vec![ManaSymbol::Green]]);
    }

    #[test]
    fn test_activated_with_mana_and_target() {
        // Prodigal Pyromancer with an extra mana cost
        let ability = single("{1}{R}, {T}: This creature deals 1 damage to any target.");
        let activated = ability.as_activated().unwrap();
        assert!(activated.tap_cost);
        assert_eq!(activated.mana_cost.to_oracle(), "{1}{R}");
        assert_eq!(activated.target_hint, Some(TargetHint::Any));
        assert!(activated.needs_target());
        assert!(!activated.is_mana_ability());
    }

    #[test]
    fn test_target_creature_hint() {
        let ability = single("{2}: Target creature gets +1/+1 until end of turn.");
        assert_eq!(
            ability.as_activated().unwrap().target_hint,
            Some(TargetHint::Creature)
        );
    }

    #[test]
    fn test_loyalty_and_sorcery_speed() {
        let abilities = parse_abilities("+1: You gain 2 life.\n−3: Draw two cards.");
        let first = abilities[0].as_activated().unwrap();
        let second = abilities[1].as_activated().unwrap();
        assert_eq!(first.loyalty_cost, Some(1));
        assert_eq!(second.loyalty_cost, Some(-3));
        assert!(first.sorcery_speed);
    }

    #[test]
    fn test_activate_only_as_sorcery_marks_previous() {
        let abilities = parse_abilities("{3}: Draw a card. Activate only as a sorcery.");
        assert_eq!(abilities.len(), 1);
        assert!(abilities[0].as_activated().unwrap().sorcery_speed);
    }

    #[test]
    fn test_equip() {
        let ability = single("Equip {2}");
        let activated = ability.as_activated().unwrap();
        assert_eq!(activated.mana_cost.mana_value(), 2);
        assert_eq!(activated.target_hint, Some(TargetHint::Creature));
        assert!(activated.sorcery_speed);
    }

    #[test]
    fn test_static_buff_other_only_with_keywords() {
        let ability = single("Other creatures you control get +1/+1 and have vigilance.");
        let Ability::StaticBuff(buff) = ability else {
            panic!("expected buff");
        };
        assert!(buff.other_only());
        assert_eq!((buff.power, buff.toughness), (1, 1));
        assert_eq!(buff.keywords, vec![Keyword::Vigilance]);
    }

    #[test]
    fn test_anthem_includes_self() {
        let ability = single("Creatures you control get +1/+1.");
        let Ability::StaticBuff(buff) = ability else {
            panic!("expected buff");
        };
        assert!(!buff.other_only());
    }

    #[test]
    fn test_equipment_buff() {
        let ability = single("Equipped creature gets +2/+0.");
        let Ability::StaticBuff(buff) = ability else {
            panic!("expected buff");
        };
        assert_eq!(buff.scope, BuffScope::AttachedCreature);
        assert_eq!((buff.power, buff.toughness), (2, 0));
    }

    #[test]
    fn test_keyword_line_with_reminder_text() {
        let abilities = parse_abilities(
            "Flying (This creature can't be blocked except by creatures with flying or reach.)\nFirst strike, lifelink",
        );
        assert_eq!(
            abilities,
            vec![
                Ability::Keyword(Keyword::Flying),
                Ability::Keyword(Keyword::FirstStrike),
                Ability::Keyword(Keyword::Lifelink),
            ]
        );
    }

    #[test]
    fn test_unrecognized_text_is_unmodeled() {
        let ability = single("Counter target spell.");
        assert_eq!(ability, Ability::Unmodeled("Counter target spell.".to_string()));
        assert!(parse_abilities("").is_empty());
    }

    #[test]
    fn test_mana_output_variants() {
        assert_eq!(
            parse_mana_output("Add {C}{C}."),
            vec![vec![ManaSymbol::Colorless, ManaSymbol::Colorless]]
        );
        assert_eq!(
            parse_mana_output("Add {G} or {W}."),
            vec![vec![ManaSymbol::Green], vec![ManaSymbol::White]]
        );
        assert_eq!(parse_mana_output("Add one mana of any color.").len(), 5);
    }
}
