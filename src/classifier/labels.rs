/// ImageNet classes that are fruit, with the name we report for them.
const FRUIT_LABELS: &[(&str, &str)] = &[
    ("granny_smith", "Apple"),
    ("banana", "Banana"),
    ("orange", "Orange"),
    ("lemon", "Lemon"),
    ("pineapple", "Pineapple"),
    ("strawberry", "Strawberry"),
    ("fig", "Fig"),
    ("pomegranate", "Pomegranate"),
    ("jackfruit", "Jackfruit"),
    ("custard_apple", "Custard Apple"),
];

/// Maps a raw model label (`Granny_Smith`, `custard apple`, ...) to a fruit name.
pub fn canonical_fruit(raw: &str) -> Option<&'static str> {
    let key = raw.trim().to_lowercase().replace([' ', '-'], "_");
    FRUIT_LABELS
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, name)| *name)
}
