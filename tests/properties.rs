use pantrysync::classify::expiry::{self, FreshnessStatus};
use pantrysync::classify::{classify, Category};
use pantrysync::coordinator;
use pantrysync::ingest::receipt;
use pantrysync::pantry::{Ingredient, NewIngredient};
use pantrysync::recipes::{Recipe, RecipeIngredient, RecipeSource};
use pantrysync::shopping::NewShoppingItem;
use pantrysync::Stores;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[test]
fn classifier_is_deterministic() {
    for name in ["chicken breast", "milk, 2%", "", "  Frozen Peas ", "mystery box", "SALSA"] {
        let first = classify(name);
        for _ in 0..5 {
            assert_eq!(classify(name), first, "classify({:?}) changed", name);
        }
    }
}

#[test]
fn smart_add_defaults_unit_and_category() {
    let mut stores = Stores::default();
    let item = stores
        .pantry
        .add_smart("chicken breast", None, None, None)
        .expect("smart add");
    assert_eq!(item.category, Category::Meat);
    assert!(!item.unit.is_empty());
}

#[test]
fn buying_milk_checks_the_shopping_item() {
    let mut stores = Stores::default();
    let list = stores.shopping.create_list("Groceries").expect("list");
    let milk = stores
        .shopping
        .add_item(list, NewShoppingItem::named("Milk"))
        .expect("item");
    stores
        .shopping
        .add_item(list, NewShoppingItem::named("Bread"))
        .expect("item");

    let outcome = coordinator::add_pantry_item_smart(&mut stores, "milk, 2%", None, None, None)
        .expect("coordinated add");

    assert_eq!(outcome.checked_shopping_item, Some(milk.id));
    assert_eq!(stores.pantry.len(), 1);
    let active = stores.shopping.active_list().expect("active list");
    assert!(active.items.iter().find(|i| i.id == milk.id).expect("milk").checked);
    assert!(!active.items.iter().find(|i| i.name == "Bread").expect("bread").checked);
}

#[test]
fn cooking_partially_deducts() {
    let mut stores = Stores::default();
    stores
        .pantry
        .add(NewIngredient::new("Eggs", Category::Dairy, 12.0, "unit"))
        .expect("add eggs");
    let deducted = coordinator::cook_recipe(
        &mut stores.pantry,
        &[RecipeIngredient::new("eggs", "4")],
    );
    assert_eq!(deducted, 1);
    assert_eq!(stores.pantry.len(), 1);
    assert_eq!(stores.pantry.items()[0].quantity, 8.0);
}

#[test]
fn cooking_exhausts_and_removes() {
    let mut stores = Stores::default();
    stores
        .pantry
        .add(NewIngredient::new("Butter", Category::Dairy, 1.0, "stick"))
        .expect("add butter");
    let deducted = coordinator::cook_recipe(
        &mut stores.pantry,
        &[RecipeIngredient::new("butter", "2")],
    );
    assert_eq!(deducted, 1);
    assert!(stores.pantry.is_empty());
}

#[test]
fn cooking_without_match_changes_nothing() {
    let mut stores = Stores::default();
    stores
        .pantry
        .add(NewIngredient::new("Rice", Category::Grains, 2.0, "bag"))
        .expect("add rice");
    let before = stores.pantry.items().to_vec();
    let deducted = coordinator::cook_recipe(
        &mut stores.pantry,
        &[RecipeIngredient::new("saffron", "1 pinch")],
    );
    assert_eq!(deducted, 0);
    assert_eq!(stores.pantry.items(), before.as_slice());
}

fn expiring_in(days: i64, now: OffsetDateTime) -> Ingredient {
    Ingredient {
        id: Uuid::new_v4(),
        name: "Spinach".into(),
        category: Category::Produce,
        quantity: 1.0,
        unit: "bag".into(),
        expiration_date: Some((now + Duration::days(days)).date()),
        added_at: now - Duration::days(1),
    }
}

#[test]
fn expiry_status_boundaries() {
    let now = time::macros::datetime!(2026-05-10 00:00 UTC);
    let cases = [
        (0, FreshnessStatus::Critical),
        (3, FreshnessStatus::Warning),
        (6, FreshnessStatus::Good),
        (-1, FreshnessStatus::Expired),
    ];
    for (days, expected) in cases {
        let info = expiry::status_at(&expiring_in(days, now), now);
        assert_eq!(info.days_left, days);
        assert_eq!(info.status, expected, "days_left = {}", days);
        assert!(!info.is_estimated);
    }
}

#[test]
fn receipt_stopwords_and_codes() {
    assert!(receipt::extract_items("SUBTOTAL 23.45", 20).is_empty());
    assert_eq!(receipt::extract_items("4011 BANANAS 0.59 T", 20), vec!["Bananas".to_string()]);
}

#[test]
fn removing_a_favorite_recipe_drops_the_favorite_id() {
    let mut stores = Stores::default();
    stores
        .recipes
        .upsert(Recipe::new("52772", "Teriyaki Chicken", RecipeSource::Catalog))
        .expect("upsert");
    stores
        .recipes
        .upsert(Recipe::new("52773", "Salmon", RecipeSource::Catalog))
        .expect("upsert");
    assert!(stores.recipes.toggle_favorite("52772").expect("favorite"));
    assert!(stores.recipes.toggle_favorite("52773").expect("favorite"));

    stores.recipes.remove("52772").expect("remove");
    assert_eq!(stores.recipes.favorite_ids(), ["52773".to_string()]);
    assert!(stores
        .recipes
        .favorite_ids()
        .iter()
        .all(|id| stores.recipes.get(id).is_some()));
}
