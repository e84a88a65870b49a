//! Fake profile data for synthetic customers.
//!
//! The customer generator only needs a name, a postal address and a
//! birthdate for each record. Anything implementing ProfileSource can
//! supply them; CuratedProfiles draws from built-in lists so that the
//! same RNG stream always yields the same profiles.

use crate::rng::StageRng;
use chrono::NaiveDate;

/// Personal data attached to a lifecycle record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeProfile {
    pub name:      String,
    pub address:   String,
    pub birthdate: NaiveDate,
}

/// Pluggable source of fake personal data.
pub trait ProfileSource {
    /// Produce one profile. `today` bounds the birthdate.
    fn next_profile(&mut self, rng: &mut StageRng, today: NaiveDate) -> FakeProfile;
}

/// Deterministic profile source backed by curated word lists.
///
/// Names are unique within one source: a repeated draw gets a
/// numeric suffix so the base table never holds two identical names.
#[derive(Debug, Default)]
pub struct CuratedProfiles {
    issued: std::collections::HashMap<String, u32>,
}

impl CuratedProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    fn pick(rng: &mut StageRng, items: &'static [&'static str]) -> &'static str {
        items[rng.next_u64_below(items.len() as u64) as usize]
    }

    fn unique_name(&mut self, rng: &mut StageRng) -> String {
        let name = format!(
            "{} {}",
            Self::pick(rng, FIRST_NAMES),
            Self::pick(rng, LAST_NAMES)
        );
        let seen = self.issued.entry(name.clone()).or_insert(0);
        *seen += 1;
        match *seen {
            1 => name,
            n => format!("{name} {}", roman(n)),
        }
    }

    fn address(rng: &mut StageRng) -> String {
        let number = 1 + rng.next_u64_below(9899);
        let street = Self::pick(rng, STREET_NAMES);
        let suffix = Self::pick(rng, STREET_SUFFIXES);
        let (city, state, zip_prefix) = CITIES[rng.next_u64_below(CITIES.len() as u64) as usize];
        let zip = format!("{zip_prefix}{:02}", rng.next_u64_below(100));
        if rng.chance(0.2) {
            let unit = 1 + rng.next_u64_below(400);
            format!("{number} {street} {suffix} Apt. {unit}\n{city}, {state} {zip}")
        } else {
            format!("{number} {street} {suffix}\n{city}, {state} {zip}")
        }
    }
}

impl ProfileSource for CuratedProfiles {
    fn next_profile(&mut self, rng: &mut StageRng, today: NaiveDate) -> FakeProfile {
        let century_start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(today);
        FakeProfile {
            name:      self.unique_name(rng),
            address:   Self::address(rng),
            birthdate: rng.date_between(century_start, today),
        }
    }
}

fn roman(n: u32) -> String {
    const TABLE: [(u32, &str); 9] = [
        (100, "C"), (90, "XC"), (50, "L"), (40, "XL"),
        (10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I"),
    ];
    let mut n = n;
    let mut out = String::new();
    for (value, glyph) in TABLE {
        while n >= value {
            out.push_str(glyph);
            n -= value;
        }
    }
    out
}

const FIRST_NAMES: &[&str] = &[
    "Aaron", "Abigail", "Adrian", "Alice", "Andre", "Angela", "Beatriz", "Bruno",
    "Camila", "Carlos", "Chloe", "Daniel", "Diana", "Eduardo", "Elena", "Ethan",
    "Fatima", "Felipe", "Gabriel", "Grace", "Hannah", "Hugo", "Isabel", "Ivan",
    "Jasmine", "Joao", "Julia", "Kevin", "Laura", "Leonardo", "Lucas", "Marina",
    "Mateus", "Mia", "Nathan", "Nina", "Olivia", "Oscar", "Paula", "Pedro",
    "Rafael", "Rebecca", "Samuel", "Sofia", "Thiago", "Valentina", "Victor", "Yara",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Anderson", "Barbosa", "Bennett", "Cardoso", "Carter", "Costa", "Cruz",
    "Dias", "Edwards", "Ferreira", "Fischer", "Gomes", "Griffin", "Hughes", "Ito",
    "Jensen", "Khan", "Lima", "Lopez", "Martins", "Mendes", "Moreau", "Nakamura",
    "Nunes", "Oliveira", "Park", "Pereira", "Quinn", "Ramos", "Ribeiro", "Rocha",
    "Santos", "Silva", "Souza", "Sullivan", "Teixeira", "Tran", "Vieira", "Walsh",
];

const STREET_NAMES: &[&str] = &[
    "Maple", "Oak", "Cedar", "Pine", "Willow", "Birch", "Lake", "Hill",
    "Sunset", "Park", "River", "Meadow", "Church", "Mill", "Highland", "Forest",
];

const STREET_SUFFIXES: &[&str] = &[
    "St.", "Ave.", "Rd.", "Blvd.", "Ln.", "Dr.", "Ct.", "Way",
];

/// (city, state, zip prefix)
const CITIES: &[(&str, &str, &str)] = &[
    ("Austin", "TX", "787"),
    ("Denver", "CO", "802"),
    ("Portland", "OR", "972"),
    ("Columbus", "OH", "432"),
    ("Raleigh", "NC", "276"),
    ("Madison", "WI", "537"),
    ("Tucson", "AZ", "857"),
    ("Boise", "ID", "837"),
    ("Richmond", "VA", "232"),
    ("Albany", "NY", "122"),
];
