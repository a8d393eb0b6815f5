use super::category::Category;

/// Name fragments whose unit overrides the category default.
const UNIT_SPECIAL_CASES: &[(&str, &str)] = &[
    ("egg", "unit"),
    ("milk", "gal"),
    ("juice", "gal"),
    ("broth", "carton"),
    ("flour", "bag"),
    ("sugar", "bag"),
    ("rice", "bag"),
    ("bread", "unit"),
    ("cereal", "box"),
    ("pasta", "box"),
    ("butter", "stick"),
    ("cheese", "pack"),
    ("water", "pack"),
    ("soda", "pack"),
];

fn default_unit(category: Category) -> Option<&'static str> {
    let unit = match category {
        Category::Produce => "lb",
        Category::Meat => "lb",
        Category::Dairy => "unit",
        Category::Grains => "bag",
        Category::Canned => "can",
        Category::Frozen => "bag",
        Category::Spices => "jar",
        Category::Condiments => "bottle",
        Category::Beverages => "bottle",
        Category::Snacks => "bag",
        Category::Other => return None,
    };
    Some(unit)
}

pub fn suggest_unit(name: &str, category: Category) -> String {
    let lower = name.trim().to_lowercase();
    if let Some((_, unit)) = UNIT_SPECIAL_CASES
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
    {
        return (*unit).to_string();
    }
    default_unit(category).unwrap_or("unit").to_string()
}

/// Candidate units offered for a category, most likely first.
pub fn units_for_category(category: Category) -> &'static [&'static str] {
    match category {
        Category::Produce => &["lb", "kg", "unit", "bunch", "bag"],
        Category::Meat => &["lb", "kg", "pack"],
        Category::Dairy => &["unit", "gal", "oz", "pack", "stick"],
        Category::Grains => &["bag", "box", "lb", "unit"],
        Category::Canned => &["can", "carton", "jar"],
        Category::Frozen => &["bag", "box", "unit"],
        Category::Spices => &["jar", "oz", "g"],
        Category::Condiments => &["bottle", "jar", "oz"],
        Category::Beverages => &["bottle", "gal", "pack", "can"],
        Category::Snacks => &["bag", "box", "pack"],
        Category::Other => &["unit", "pack"],
    }
}
