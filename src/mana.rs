use crate::color::Color;
use crate::error::PaymentError;
use crate::ids::ObjectId;
use crate::permanent::Permanent;

/// Atomic mana payment options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManaSymbol {
    /// White mana {W}
    White,
    /// Blue mana {U}
    Blue,
    /// Black mana {B}
    Black,
    /// Red mana {R}
    Red,
    /// Green mana {G}
    Green,
    /// Colorless mana {C}
    Colorless,
    /// Generic mana {1}, {2}, etc.
    Generic(u8),
    /// Snow mana {S}, paid as generic (snow sources are not tracked)
    Snow,
    /// Life payment for Phyrexian costs
    Life(u8),
    /// Variable mana {X}
    X,
}

impl ManaSymbol {
    pub const COLORED: [ManaSymbol; 5] = [
        ManaSymbol::White,
        ManaSymbol::Blue,
        ManaSymbol::Black,
        ManaSymbol::Red,
        ManaSymbol::Green,
    ];

    /// Returns the mana value contribution of this symbol.
    pub fn mana_value(&self) -> u32 {
        match self {
            ManaSymbol::Generic(n) => *n as u32,
            ManaSymbol::Life(_) => 0, // Life payment doesn't contribute to mana value
            ManaSymbol::X => 0,       // X is 0 except on the stack
            _ => 1,
        }
    }

    pub fn from_color(color: Color) -> Self {
        match color {
            Color::White => ManaSymbol::White,
            Color::Blue => ManaSymbol::Blue,
            Color::Black => ManaSymbol::Black,
            Color::Red => ManaSymbol::Red,
            Color::Green => ManaSymbol::Green,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            ManaSymbol::White => Some(Color::White),
            ManaSymbol::Blue => Some(Color::Blue),
            ManaSymbol::Black => Some(Color::Black),
            ManaSymbol::Red => Some(Color::Red),
            ManaSymbol::Green => Some(Color::Green),
            _ => None,
        }
    }

    /// True for the symbols a pool can actually hold (WUBRG and {C}).
    pub fn is_pool_kind(&self) -> bool {
        self.color().is_some() || matches!(self, ManaSymbol::Colorless)
    }

    /// Parses the inside of one `{...}` group that has no `/`.
    fn parse_single(token: &str) -> Option<Self> {
        let upper = token.trim().to_ascii_uppercase();
        if let Ok(n) = upper.parse::<u8>() {
            return Some(ManaSymbol::Generic(n));
        }
        match upper.as_str() {
            "W" => Some(ManaSymbol::White),
            "U" => Some(ManaSymbol::Blue),
            "B" => Some(ManaSymbol::Black),
            "R" => Some(ManaSymbol::Red),
            "G" => Some(ManaSymbol::Green),
            "C" => Some(ManaSymbol::Colorless),
            "S" => Some(ManaSymbol::Snow),
            "X" | "Y" | "Z" => Some(ManaSymbol::X),
            "P" => Some(ManaSymbol::Life(2)),
            _ => None,
        }
    }

    fn oracle_text(&self) -> String {
        match self {
            ManaSymbol::White => "W".to_string(),
            ManaSymbol::Blue => "U".to_string(),
            ManaSymbol::Black => "B".to_string(),
            ManaSymbol::Red => "R".to_string(),
            ManaSymbol::Green => "G".to_string(),
            ManaSymbol::Colorless => "C".to_string(),
            ManaSymbol::Generic(n) => n.to_string(),
            ManaSymbol::Snow => "S".to_string(),
            ManaSymbol::Life(_) => "P".to_string(),
            ManaSymbol::X => "X".to_string(),
        }
    }
}

/// Represents a mana cost as a sequence of pips, where each pip is a list of
/// alternative payment options (disjunction).
///
/// The outer vector represents pips that must ALL be paid (conjunction).
/// Each inner vector represents alternative ways to pay that pip (disjunction).
///
/// Examples:
/// - `{2}{W}{W}` = `[[Generic(2)], [White], [White]]`
/// - `{W/U}` (hybrid) = `[[White, Blue]]`
/// - `{2/W}` (twobrid) = `[[Generic(2), White]]`
/// - `{W/P}` (phyrexian) = `[[White, Life(2)]]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManaCost {
    pips: Vec<Vec<ManaSymbol>>,
}

impl ManaCost {
    pub fn new() -> Self {
        Self { pips: Vec::new() }
    }

    pub fn from_pips(pips: Vec<Vec<ManaSymbol>>) -> Self {
        Self { pips }
    }

    /// Creates a mana cost from a simple list of symbols (each becomes one pip).
    pub fn from_symbols(symbols: Vec<ManaSymbol>) -> Self {
        Self {
            pips: symbols.into_iter().map(|s| vec![s]).collect(),
        }
    }

    /// Parses a cost string such as `{2}{G}{G}`, `{X}{R}`, `{W/U}` or `{G/P}`.
    ///
    /// Unrecognized symbols fall back to one generic mana. `{0}` and empty
    /// text produce an empty cost.
    pub fn parse(text: &str) -> Self {
        let mut cost = ManaCost::new();
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let token = &after[..close];
            rest = &after[close + 1..];

            if token.contains('/') {
                let options: Vec<ManaSymbol> = token
                    .split('/')
                    .filter_map(ManaSymbol::parse_single)
                    .collect();
                if options.is_empty() {
                    cost.push(ManaSymbol::Generic(1));
                } else {
                    cost.push_alternatives(options);
                }
                continue;
            }

            match ManaSymbol::parse_single(token) {
                Some(ManaSymbol::Generic(0)) => {}
                Some(symbol) => cost.push(symbol),
                None => cost.push(ManaSymbol::Generic(1)),
            }
        }
        cost
    }

    /// Returns the mana value (formerly converted mana cost) of this cost.
    ///
    /// For each pip, uses the maximum mana value among its alternatives.
    pub fn mana_value(&self) -> u32 {
        self.pips
            .iter()
            .map(|pip| pip.iter().map(|s| s.mana_value()).max().unwrap_or(0))
            .sum()
    }

    pub fn pips(&self) -> &[Vec<ManaSymbol>] {
        &self.pips
    }

    /// Format the mana cost in oracle-style syntax (e.g., "{2}{W}{W}").
    pub fn to_oracle(&self) -> String {
        let mut out = String::new();
        for pip in &self.pips {
            let parts: Vec<String> = pip.iter().map(ManaSymbol::oracle_text).collect();
            out.push('{');
            out.push_str(&parts.join("/"));
            out.push('}');
        }
        out
    }

    pub fn push(&mut self, symbol: ManaSymbol) {
        self.pips.push(vec![symbol]);
    }

    pub fn push_alternatives(&mut self, alternatives: Vec<ManaSymbol>) {
        self.pips.push(alternatives);
    }

    pub fn is_empty(&self) -> bool {
        self.pips.is_empty()
    }

    pub fn has_x(&self) -> bool {
        self.pips
            .iter()
            .any(|pip| pip.iter().any(|s| matches!(s, ManaSymbol::X)))
    }

    /// Colors appearing anywhere in the cost.
    pub fn colors(&self) -> crate::color::ColorSet {
        self.pips
            .iter()
            .flatten()
            .filter_map(ManaSymbol::color)
            .collect()
    }

    /// Returns a copy with `amount` additional generic mana (commander tax).
    pub fn with_additional_generic(&self, amount: u32) -> ManaCost {
        let mut cost = self.clone();
        let mut remaining = amount;
        while remaining > 0 {
            let chunk = remaining.min(u8::MAX as u32);
            cost.push(ManaSymbol::Generic(chunk as u8));
            remaining -= chunk;
        }
        cost
    }
}

impl std::fmt::Display for ManaCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_oracle())
    }
}

/// Shorthand for [`ManaCost::parse`].
pub fn parse_cost(text: &str) -> ManaCost {
    ManaCost::parse(text)
}

/// One unit of mana in a pool, remembering which permanent produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManaUnit {
    pub symbol: ManaSymbol,
    pub source: Option<ObjectId>,
}

/// What a successful payment consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payment {
    pub spent: Vec<ManaUnit>,
    /// Life owed for Phyrexian pips paid with life; the caller deducts it.
    pub life_paid: u32,
}

impl Payment {
    pub fn mana_spent(&self) -> u32 {
        self.spent.len() as u32
    }
}

/// Per-player mana pool.
///
/// Amounts are never negative; the pool is emptied whenever a step or
/// phase ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManaPool {
    units: Vec<ManaUnit>,
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds mana of the specified type. Generic, X, Snow and Life don't add
    /// anything; numeric generic output is stored as colorless.
    pub fn add(&mut self, symbol: ManaSymbol, amount: u32, source: Option<ObjectId>) {
        let symbol = match symbol {
            ManaSymbol::Generic(_) => ManaSymbol::Colorless,
            s if s.is_pool_kind() => s,
            _ => return,
        };
        for _ in 0..amount {
            self.units.push(ManaUnit { symbol, source });
        }
    }

    /// Removes one unit of the given kind, most recent first.
    fn take(&mut self, symbol: ManaSymbol) -> Option<ManaUnit> {
        let index = self.units.iter().rposition(|u| u.symbol == symbol)?;
        Some(self.units.remove(index))
    }

    pub fn amount(&self, symbol: ManaSymbol) -> u32 {
        self.units.iter().filter(|u| u.symbol == symbol).count() as u32
    }

    pub fn total(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[ManaUnit] {
        &self.units
    }

    /// Units that a given permanent produced and are still unspent.
    pub fn produced_by(&self, source: ObjectId) -> u32 {
        self.units
            .iter()
            .filter(|u| u.source == Some(source))
            .count() as u32
    }

    /// Empties the pool, returning the number of units lost.
    pub fn empty(&mut self) -> u32 {
        let lost = self.total();
        self.units.clear();
        lost
    }

    /// Removes every unit a permanent produced (undoing a tap).
    pub fn remove_from_source(&mut self, source: ObjectId) {
        self.units.retain(|u| u.source != Some(source));
    }

    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        self.can_pay_with(cost, 0, 0)
    }

    /// Checks payability with an X value and the life available for
    /// Phyrexian pips.
    pub fn can_pay_with(&self, cost: &ManaCost, x_value: u32, life_budget: u32) -> bool {
        let mut pool = self.clone();
        pool.try_pay(cost, x_value, life_budget).is_some()
    }

    pub fn pay(&mut self, cost: &ManaCost) -> Result<Payment, PaymentError> {
        self.pay_with(cost, 0, 0)
    }

    /// Pays a cost atomically: either the whole cost is deducted or the pool
    /// is left untouched.
    pub fn pay_with(
        &mut self,
        cost: &ManaCost,
        x_value: u32,
        life_budget: u32,
    ) -> Result<Payment, PaymentError> {
        let mut pool = self.clone();
        match pool.try_pay(cost, x_value, life_budget) {
            Some(payment) => {
                *self = pool;
                Ok(payment)
            }
            None => Err(PaymentError::Insufficient {
                cost: cost.to_oracle(),
            }),
        }
    }

    /// Greedy payment on `self`. Pips with only colored options go first so
    /// generic never eats mana a colored pip needed.
    fn try_pay(&mut self, cost: &ManaCost, x_value: u32, life_budget: u32) -> Option<Payment> {
        let mut pips: Vec<&Vec<ManaSymbol>> = cost.pips().iter().collect();
        pips.sort_by_key(|pip| pip_priority(pip));

        let mut payment = Payment::default();
        let mut life_left = life_budget;

        for pip in pips {
            let mut options = pip.clone();
            options.sort_by_key(option_priority);

            let mut paid = false;
            for option in options {
                match option {
                    ManaSymbol::Colorless => {
                        if let Some(unit) = self.take(ManaSymbol::Colorless) {
                            payment.spent.push(unit);
                            paid = true;
                        }
                    }
                    ManaSymbol::Generic(n) => {
                        if let Some(units) = self.pay_generic(n as u32) {
                            payment.spent.extend(units);
                            paid = true;
                        }
                    }
                    ManaSymbol::Snow => {
                        if let Some(units) = self.pay_generic(1) {
                            payment.spent.extend(units);
                            paid = true;
                        }
                    }
                    ManaSymbol::X => {
                        if let Some(units) = self.pay_generic(x_value) {
                            payment.spent.extend(units);
                            paid = true;
                        }
                    }
                    ManaSymbol::Life(n) => {
                        if life_left >= n as u32 {
                            life_left -= n as u32;
                            payment.life_paid += n as u32;
                            paid = true;
                        }
                    }
                    colored => {
                        if let Some(unit) = self.take(colored) {
                            payment.spent.push(unit);
                            paid = true;
                        }
                    }
                }
                if paid {
                    break;
                }
            }

            if !paid {
                return None;
            }
        }

        Some(payment)
    }

    /// Pays generic mana: colorless first, then WUBRG in order.
    fn pay_generic(&mut self, amount: u32) -> Option<Vec<ManaUnit>> {
        if self.total() < amount {
            return None;
        }
        let mut spent = Vec::with_capacity(amount as usize);
        let order = [
            ManaSymbol::Colorless,
            ManaSymbol::White,
            ManaSymbol::Blue,
            ManaSymbol::Black,
            ManaSymbol::Red,
            ManaSymbol::Green,
        ];
        for symbol in order {
            while (spent.len() as u32) < amount {
                match self.take(symbol) {
                    Some(unit) => spent.push(unit),
                    None => break,
                }
            }
        }
        Some(spent)
    }
}

/// Single-color pips, then hybrid/Phyrexian, then anything generic.
fn pip_priority(pip: &[ManaSymbol]) -> u8 {
    let generic_like = |s: &ManaSymbol| {
        matches!(
            s,
            ManaSymbol::Generic(_) | ManaSymbol::X | ManaSymbol::Snow
        )
    };
    if pip.iter().all(generic_like) {
        2
    } else if pip.len() == 1 {
        0
    } else {
        1
    }
}

/// Within a pip, exact colors are tried before generic, life last.
fn option_priority(symbol: &ManaSymbol) -> u8 {
    match symbol {
        ManaSymbol::Life(_) => 2,
        ManaSymbol::Generic(_) | ManaSymbol::X | ManaSymbol::Snow => 1,
        _ => 0,
    }
}

/// Taps untapped lands until `pool` can pay `cost`, then leaves the payment
/// itself to the caller.
///
/// Colored requirements are sourced first, then generic. Phyrexian pips no
/// land can cover count as paid when `life_budget` allows it. If the lands
/// on `battlefield` cannot cover the cost, every land tapped here is
/// untapped again and its mana removed, and an error is returned.
pub fn auto_tap_for(
    pool: &mut ManaPool,
    cost: &ManaCost,
    x_value: u32,
    life_budget: u32,
    battlefield: &mut [Permanent],
) -> Result<Vec<ObjectId>, PaymentError> {
    let mut tapped = Vec::new();

    if pool.can_pay_with(cost, x_value, life_budget) {
        return Ok(tapped);
    }

    // Colored pips the pool can't already cover.
    let mut needed: Vec<Vec<ManaSymbol>> = Vec::new();
    {
        let mut scratch = pool.clone();
        for pip in cost.pips() {
            let colors: Vec<ManaSymbol> = pip
                .iter()
                .copied()
                .filter(|s| s.color().is_some())
                .collect();
            let generic_ok = pip.iter().any(|s| {
                matches!(
                    s,
                    ManaSymbol::Generic(_) | ManaSymbol::X | ManaSymbol::Snow
                )
            });
            if colors.is_empty() || generic_ok {
                continue;
            }
            if colors.iter().any(|c| scratch.take(*c).is_some()) {
                continue;
            }
            needed.push(colors);
        }
    }

    for colors in needed {
        let source = battlefield.iter_mut().find_map(|perm| {
            if !perm.can_tap_for_mana() {
                return None;
            }
            perm.mana_options()
                .into_iter()
                .find(|bundle| bundle.iter().any(|s| colors.contains(s)))
                .map(|bundle| (perm, bundle))
        });
        if let Some((perm, bundle)) = source {
            perm.tap();
            for symbol in &bundle {
                pool.add(*symbol, 1, Some(perm.card.id));
            }
            tapped.push(perm.card.id);
        }
    }

    // Generic: any remaining land, colorless producers first.
    while !pool.can_pay_with(cost, x_value, life_budget) {
        let mut candidates: Vec<&mut Permanent> = battlefield
            .iter_mut()
            .filter(|perm| perm.can_tap_for_mana())
            .collect();
        candidates.sort_by_key(|perm| {
            let produces_color = perm
                .mana_options()
                .iter()
                .flatten()
                .any(|s| s.color().is_some());
            produces_color
        });
        let Some(perm) = candidates.into_iter().next() else {
            break;
        };
        let bundle = perm.mana_options().into_iter().next().unwrap_or_default();
        perm.tap();
        for symbol in &bundle {
            pool.add(*symbol, 1, Some(perm.card.id));
        }
        tapped.push(perm.card.id);
    }

    if pool.can_pay_with(cost, x_value, life_budget) {
        return Ok(tapped);
    }

    for id in &tapped {
        pool.remove_from_source(*id);
        if let Some(perm) = battlefield.iter_mut().find(|p| p.card.id == *id) {
            perm.untap();
        }
    }
    Err(PaymentError::NoSources {
        cost: cost.to_oracle(),
    })
}
