//! Evocative encounter table names ("The Cursed Crypts", "Halls of Bone")

const ADJECTIVES: &[&str] = &[
    "Cursed", "Forgotten", "Burning", "Frozen", "Bleeding", "Twisted", "Haunted", "Shattered",
    "Whispering", "Dread", "Endless", "Rotting", "Vengeful", "Sunken", "Screaming", "Blighted",
    "Wretched", "Nameless", "Hungry", "Creeping",
];

const NOUNS: &[&str] = &[
    "Crypts", "Vale", "Depths", "Halls", "Tombs", "Wastes", "Ruins", "Shadows", "Cairns",
    "Barrows", "Spire", "Chambers", "Labyrinth", "Chasm", "Maw", "Ossuary", "Catacombs",
    "Sanctum", "Threshold", "Abyss",
];

const PREFIXES: &[&str] = &[
    "Beyond the", "Beneath the", "Within the", "Through the", "Into the", "From the",
    "Above the", "Of the", "Across the", "Among the", "Below the", "Inside the", "Toward the",
    "At the", "Near the",
];

const INTENSIFIERS: &[&str] = &[
    "of Darkness", "of Blood", "of Bone", "of Sorrow", "of Death", "of Despair", "of Ruin",
    "of Silence", "of Flame", "of Shadow",
];

const PATTERN_COUNT: usize = 6;

/// Build a table name from an injected index generator (`pick(n)` in `0..n`).
pub fn generate_table_name(mut pick: impl FnMut(usize) -> usize) -> String {
    let pattern = pick(PATTERN_COUNT) % PATTERN_COUNT;
    let mut word = |list: &[&'static str]| list[pick(list.len()) % list.len()];
    match pattern {
        0 => format!("The {} {}", word(ADJECTIVES), word(NOUNS)),
        1 => format!("{} {}", word(ADJECTIVES), word(NOUNS)),
        2 => format!("{} {}", word(NOUNS), word(INTENSIFIERS)),
        3 => format!(
            "The {} {} {}",
            word(ADJECTIVES),
            word(NOUNS),
            word(INTENSIFIERS)
        ),
        4 => format!("{} {} {}", word(PREFIXES), word(ADJECTIVES), word(NOUNS)),
        _ => format!("{} {} {}", word(PREFIXES), word(NOUNS), word(INTENSIFIERS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::TableName;

    fn scripted(values: Vec<usize>) -> impl FnMut(usize) -> usize {
        let mut it = values.into_iter();
        move |_| it.next().unwrap_or(0)
    }

    #[test]
    fn each_pattern_shape() {
        assert_eq!(generate_table_name(scripted(vec![0, 0, 0])), "The Cursed Crypts");
        assert_eq!(generate_table_name(scripted(vec![1, 4, 3])), "Bleeding Halls");
        assert_eq!(generate_table_name(scripted(vec![2, 3, 2])), "Halls of Bone");
        assert_eq!(
            generate_table_name(scripted(vec![5, 0, 0, 0])),
            "Beyond the Crypts of Darkness"
        );
    }

    #[test]
    fn every_combination_is_a_valid_table_name() {
        for pattern in 0..PATTERN_COUNT {
            for i in 0..20 {
                let name = generate_table_name(scripted(vec![pattern, i, i, i]));
                assert!(TableName::new(name.as_str()).is_ok(), "{}", name);
            }
        }
    }
}
