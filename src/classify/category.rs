use serde::{Deserialize, Serialize};

/// Pantry-side semantic category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Produce,
    Meat,
    Dairy,
    Grains,
    Canned,
    Frozen,
    Spices,
    Condiments,
    Beverages,
    Snacks,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Produce,
        Category::Meat,
        Category::Dairy,
        Category::Grains,
        Category::Canned,
        Category::Frozen,
        Category::Spices,
        Category::Condiments,
        Category::Beverages,
        Category::Snacks,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "produce",
            Category::Meat => "meat",
            Category::Dairy => "dairy",
            Category::Grains => "grains",
            Category::Canned => "canned",
            Category::Frozen => "frozen",
            Category::Spices => "spices",
            Category::Condiments => "condiments",
            Category::Beverages => "beverages",
            Category::Snacks => "snacks",
            Category::Other => "other",
        }
    }

    /// Aisle a pantry category lands in when it is bought.
    pub fn shopping_category(&self) -> ShoppingCategory {
        match self {
            Category::Produce => ShoppingCategory::Produce,
            Category::Meat => ShoppingCategory::Meat,
            Category::Dairy => ShoppingCategory::Dairy,
            Category::Frozen => ShoppingCategory::Frozen,
            Category::Beverages => ShoppingCategory::Beverages,
            Category::Grains
            | Category::Canned
            | Category::Spices
            | Category::Condiments
            | Category::Snacks => ShoppingCategory::Pantry,
            Category::Other => ShoppingCategory::Other,
        }
    }
}

/// Shopping-list aisle grouping; not the same enumeration as [`Category`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShoppingCategory {
    Produce,
    Meat,
    Dairy,
    Bakery,
    Frozen,
    Pantry,
    Beverages,
    Household,
    #[default]
    Other,
}

/// Curated name table. Order is the tie-break for substring and per-word matches.
const NAME_TABLE: &[(&str, Category)] = &[
    // produce
    ("eggplant", Category::Produce),
    ("butternut squash", Category::Produce),
    ("apple", Category::Produce),
    ("banana", Category::Produce),
    ("orange", Category::Produce),
    ("lemon", Category::Produce),
    ("lime", Category::Produce),
    ("strawberry", Category::Produce),
    ("blueberry", Category::Produce),
    ("grape", Category::Produce),
    ("avocado", Category::Produce),
    ("tomato", Category::Produce),
    ("potato", Category::Produce),
    ("onion", Category::Produce),
    ("garlic", Category::Produce),
    ("carrot", Category::Produce),
    ("celery", Category::Produce),
    ("lettuce", Category::Produce),
    ("spinach", Category::Produce),
    ("kale", Category::Produce),
    ("broccoli", Category::Produce),
    ("cauliflower", Category::Produce),
    ("cucumber", Category::Produce),
    ("zucchini", Category::Produce),
    ("squash", Category::Produce),
    ("pepper", Category::Produce),
    ("mushroom", Category::Produce),
    ("corn", Category::Produce),
    ("cabbage", Category::Produce),
    ("ginger", Category::Produce),
    ("cilantro", Category::Produce),
    ("parsley", Category::Produce),
    ("basil", Category::Produce),
    // meat
    ("chicken", Category::Meat),
    ("beef", Category::Meat),
    ("steak", Category::Meat),
    ("pork", Category::Meat),
    ("bacon", Category::Meat),
    ("sausage", Category::Meat),
    ("ham", Category::Meat),
    ("turkey", Category::Meat),
    ("lamb", Category::Meat),
    ("ground beef", Category::Meat),
    ("salmon", Category::Meat),
    ("tuna steak", Category::Meat),
    ("shrimp", Category::Meat),
    ("fish", Category::Meat),
    ("tofu", Category::Meat),
    // dairy
    ("milk", Category::Dairy),
    ("cheese", Category::Dairy),
    ("butter", Category::Dairy),
    ("yogurt", Category::Dairy),
    ("cream", Category::Dairy),
    ("sour cream", Category::Dairy),
    ("egg", Category::Dairy),
    ("mozzarella", Category::Dairy),
    ("cheddar", Category::Dairy),
    ("parmesan", Category::Dairy),
    // grains
    ("bread", Category::Grains),
    ("rice", Category::Grains),
    ("pasta", Category::Grains),
    ("spaghetti", Category::Grains),
    ("noodle", Category::Grains),
    ("flour", Category::Grains),
    ("oats", Category::Grains),
    ("cereal", Category::Grains),
    ("tortilla", Category::Grains),
    ("quinoa", Category::Grains),
    ("bagel", Category::Grains),
    // canned
    ("canned", Category::Canned),
    ("beans", Category::Canned),
    ("broth", Category::Canned),
    ("stock", Category::Canned),
    ("soup", Category::Canned),
    ("tuna", Category::Canned),
    ("tomato sauce", Category::Canned),
    ("tomato paste", Category::Canned),
    ("chickpeas", Category::Canned),
    // frozen
    ("frozen", Category::Frozen),
    ("ice cream", Category::Frozen),
    ("pizza", Category::Frozen),
    ("peas", Category::Frozen),
    // spices
    ("salt", Category::Spices),
    ("black pepper", Category::Spices),
    ("cumin", Category::Spices),
    ("paprika", Category::Spices),
    ("cinnamon", Category::Spices),
    ("oregano", Category::Spices),
    ("thyme", Category::Spices),
    ("chili powder", Category::Spices),
    ("nutmeg", Category::Spices),
    ("vanilla", Category::Spices),
    ("sugar", Category::Spices),
    // condiments
    ("ketchup", Category::Condiments),
    ("mustard", Category::Condiments),
    ("mayo", Category::Condiments),
    ("mayonnaise", Category::Condiments),
    ("soy sauce", Category::Condiments),
    ("hot sauce", Category::Condiments),
    ("vinegar", Category::Condiments),
    ("olive oil", Category::Condiments),
    ("oil", Category::Condiments),
    ("honey", Category::Condiments),
    ("jam", Category::Condiments),
    ("peanut butter", Category::Condiments),
    ("salsa", Category::Condiments),
    ("dressing", Category::Condiments),
    // beverages
    ("juice", Category::Beverages),
    ("coffee", Category::Beverages),
    ("tea", Category::Beverages),
    ("soda", Category::Beverages),
    ("water", Category::Beverages),
    ("wine", Category::Beverages),
    ("beer", Category::Beverages),
    // snacks
    ("chips", Category::Snacks),
    ("crackers", Category::Snacks),
    ("cookies", Category::Snacks),
    ("popcorn", Category::Snacks),
    ("pretzels", Category::Snacks),
    ("nuts", Category::Snacks),
    ("chocolate", Category::Snacks),
    ("granola", Category::Snacks),
];

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Maps a free-text item name to a [`Category`]. Always returns a value.
pub fn classify(name: &str) -> Category {
    let lower = normalize(name);
    if lower.is_empty() {
        return Category::Other;
    }

    if let Some((_, cat)) = NAME_TABLE.iter().find(|(key, _)| *key == lower) {
        return *cat;
    }

    if let Some((_, cat)) = NAME_TABLE
        .iter()
        .find(|(key, _)| lower.contains(key) || key.contains(lower.as_str()))
    {
        return *cat;
    }

    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3)
        .collect();
    for word in &words {
        if let Some((_, cat)) = NAME_TABLE
            .iter()
            .find(|(key, _)| key.split(' ').any(|k| k == *word) || key.starts_with(word))
        {
            return *cat;
        }
    }

    Category::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_beats_substring_order() {
        assert_eq!(classify("Peanut Butter"), Category::Condiments);
        assert_eq!(classify("TUNA"), Category::Canned);
        assert_eq!(classify("eggplant"), Category::Produce);
    }

    #[test]
    fn substring_either_direction() {
        assert_eq!(classify("chicken breast"), Category::Meat);
        assert_eq!(classify("milk, 2%"), Category::Dairy);
        assert_eq!(classify("Bananas"), Category::Produce);
        // key contains the name
        assert_eq!(classify("mozz"), Category::Dairy);
    }

    #[test]
    fn unknown_and_empty_fall_back_to_other() {
        assert_eq!(classify(""), Category::Other);
        assert_eq!(classify("   "), Category::Other);
        assert_eq!(classify("zzqx"), Category::Other);
    }

    #[test]
    fn repeated_calls_agree() {
        for name in ["Greek yogurt", "bag of frozen peas", "sparkling water", "xyzzy"] {
            assert_eq!(classify(name), classify(name));
        }
    }

    #[test]
    fn shopping_aisle_mapping() {
        assert_eq!(Category::Spices.shopping_category(), ShoppingCategory::Pantry);
        assert_eq!(Category::Dairy.shopping_category(), ShoppingCategory::Dairy);
        assert_eq!(Category::Other.shopping_category(), ShoppingCategory::Other);
    }
}
