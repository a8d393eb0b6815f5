//! Actions spanning more than one collection. Each step is applied in order and
//! none is rolled back when a later one fails.

use lazy_static::lazy_static;
use regex::Regex;
use time::Date;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::{VoiceIntent, VoiceItem};
use crate::classify::{classify, suggest_unit};
use crate::error::{AppError, Result};
use crate::pantry::{Ingredient, IngredientPatch, NewIngredient, PantryStore};
use crate::recipes::{Recipe, RecipeIngredient};
use crate::shopping::{NewShoppingItem, ShoppingItem};
use crate::state::Stores;

#[derive(Debug, Clone, PartialEq)]
pub struct SmartAddOutcome {
    pub ingredient: Ingredient,
    /// Shopping item ticked off by this add, if one matched.
    pub checked_shopping_item: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceOutcome {
    PantryAdded(Vec<SmartAddOutcome>),
    ShoppingAdded(Vec<ShoppingItem>),
    /// Left to the caller.
    Navigate(String),
    Chat(String),
}

fn finish_add(
    stores: &mut Stores,
    name: &str,
    added: Result<Ingredient>,
) -> Result<SmartAddOutcome> {
    let checked_shopping_item = stores.shopping.check_item_if_exists(name);
    match added {
        Ok(ingredient) => Ok(SmartAddOutcome {
            ingredient,
            checked_shopping_item,
        }),
        Err(e) => {
            let shopping_checked = checked_shopping_item.is_some();
            warn!(name, error = %e, shopping_checked, "pantry add failed");
            Err(e)
        }
    }
}

/// Adds to the pantry, then ticks off a matching item on the active shopping list.
pub fn add_pantry_item(stores: &mut Stores, new: NewIngredient) -> Result<SmartAddOutcome> {
    let name = new.name.clone();
    let added = stores.pantry.add(new);
    finish_add(stores, &name, added)
}

pub fn add_pantry_item_smart(
    stores: &mut Stores,
    name: &str,
    quantity: Option<f64>,
    unit: Option<&str>,
    expiration_date: Option<Date>,
) -> Result<SmartAddOutcome> {
    let added = stores.pantry.add_smart(name, quantity, unit, expiration_date);
    finish_add(stores, name, added)
}

/// Leading decimal amount and optional unit word of a free-text quantity.
/// Text without a leading number counts as one.
pub fn parse_quantity(text: &str) -> (f64, Option<String>) {
    lazy_static! {
        static ref AMOUNT_RE: Regex =
            Regex::new(r"^\s*(\d+(?:\.\d+)?|\.\d+)\s*([A-Za-z]+)?").unwrap();
    }
    let Some(caps) = AMOUNT_RE.captures(text) else {
        return (1.0, None);
    };
    let amount = caps[1].parse::<f64>().unwrap_or(1.0);
    let unit = caps.get(2).map(|m| m.as_str().to_lowercase());
    (amount, unit)
}

/// Deducts a cooked recipe's ingredients from the pantry and returns how many were
/// deducted. Ingredients with no pantry match are skipped; entries that reach zero are removed.
pub fn cook_recipe(pantry: &mut PantryStore, ingredients: &[RecipeIngredient]) -> usize {
    let mut deducted = 0;
    for ingredient in ingredients {
        let Some(item) = pantry.find_loose(&ingredient.name) else {
            debug!(ingredient = %ingredient.name, "not tracked in pantry; skipped");
            continue;
        };
        let (id, on_hand) = (item.id, item.quantity);
        let (needed, _) = parse_quantity(&ingredient.quantity);
        let remaining = if on_hand >= needed { on_hand - needed } else { 0.0 };

        let applied = if remaining <= 0.0 {
            pantry.remove(id).map(|_| ())
        } else {
            pantry.update(id, IngredientPatch::quantity(remaining)).map(|_| ())
        };
        match applied {
            Ok(()) => deducted += 1,
            Err(e) => warn!(%id, error = %e, "pantry deduction failed"),
        }
    }
    info!(deducted, total = ingredients.len(), "recipe cooked");
    deducted
}

/// Puts the recipe's ingredients that the pantry lacks on the active list, skipping
/// ones already waiting there. Returns how many were added.
pub fn add_recipe_gaps_to_shopping(stores: &mut Stores, recipe_id: &str) -> Result<usize> {
    let recipe = stores
        .recipes
        .get(recipe_id)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("recipe {}", recipe_id)))?;
    let mut added = 0;
    for ingredient in &recipe.ingredients {
        if stores.pantry.find_loose(&ingredient.name).is_some() {
            continue;
        }
        let already_listed = stores.shopping.active_list().is_some_and(|list| {
            list.items
                .iter()
                .any(|i| !i.checked && crate::matching::loose_match(&i.name, &ingredient.name))
        });
        if already_listed {
            continue;
        }
        let (quantity, parsed_unit) = parse_quantity(&ingredient.quantity);
        let category = classify(&ingredient.name);
        let unit = ingredient
            .unit
            .clone()
            .or(parsed_unit)
            .unwrap_or_else(|| suggest_unit(&ingredient.name, category));
        stores.shopping.add_to_active(
            NewShoppingItem::named(ingredient.name.as_str())
                .with_category(category.shopping_category())
                .with_quantity(quantity, unit)
                .from_recipe(recipe.id.as_str()),
        )?;
        added += 1;
    }
    info!(recipe_id, added, "recipe gaps added to shopping list");
    Ok(added)
}

fn voice_shopping_item(item: &VoiceItem) -> NewShoppingItem {
    let category = classify(&item.name);
    let unit = item
        .unit
        .clone()
        .unwrap_or_else(|| suggest_unit(&item.name, category));
    NewShoppingItem::named(item.name.as_str())
        .with_category(category.shopping_category())
        .with_quantity(item.quantity.unwrap_or(1.0), unit)
}

/// Carries out the collection side of a voice command. Items that fail validation are
/// logged and skipped.
pub fn apply_voice_intent(stores: &mut Stores, intent: VoiceIntent) -> VoiceOutcome {
    match intent {
        VoiceIntent::AddPantry { items } => VoiceOutcome::PantryAdded(
            items
                .iter()
                .filter_map(|item| {
                    let unit = item.unit.as_deref();
                    add_pantry_item_smart(stores, &item.name, item.quantity, unit, None).ok()
                })
                .collect(),
        ),
        VoiceIntent::AddShopping { items } => VoiceOutcome::ShoppingAdded(
            items
                .iter()
                .filter_map(|item| match stores.shopping.add_to_active(voice_shopping_item(item)) {
                    Ok(added) => Some(added),
                    Err(e) => {
                        warn!(name = %item.name, error = %e, "voice shopping add skipped");
                        None
                    }
                })
                .collect(),
        ),
        VoiceIntent::Navigate { route } => VoiceOutcome::Navigate(route),
        VoiceIntent::Chat { message } => VoiceOutcome::Chat(message),
    }
}

/// Removes a recipe along with its favorite mark and every meal-plan entry using it.
pub fn delete_recipe(stores: &mut Stores, recipe_id: &str) -> Result<Recipe> {
    let removed = stores.recipes.remove(recipe_id)?;
    let unplanned = stores.meal_plans.remove_recipe(recipe_id);
    info!(recipe_id, unplanned, "recipe deleted");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use crate::meal_plans::MealType;
    use crate::recipes::RecipeSource;
    use time::macros::date;

    fn stores() -> Stores {
        Stores::default()
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("2 cups"), (2.0, Some("cups".into())));
        assert_eq!(parse_quantity("1.5"), (1.5, None));
        assert_eq!(parse_quantity(" .5 lb"), (0.5, Some("lb".into())));
        assert_eq!(parse_quantity("a pinch"), (1.0, None));
        assert_eq!(parse_quantity(""), (1.0, None));
    }

    #[test]
    fn smart_add_checks_matching_shopping_item() {
        let mut stores = stores();
        let list = stores.shopping.create_list("Weekly").unwrap();
        let milk = stores
            .shopping
            .add_item(list, NewShoppingItem::named("Milk"))
            .unwrap();

        let outcome =
            add_pantry_item_smart(&mut stores, "whole milk", Some(1.0), None, None).unwrap();
        assert_eq!(outcome.checked_shopping_item, Some(milk.id));
        assert_eq!(stores.pantry.len(), 1);
        assert!(stores.shopping.active_list().unwrap().items[0].checked);
    }

    #[test]
    fn pantry_add_stands_without_a_shopping_list() {
        let mut stores = stores();
        let outcome = add_pantry_item(
            &mut stores,
            NewIngredient::new("Rice", Category::Grains, 1.0, "bag"),
        )
        .unwrap();
        assert_eq!(outcome.checked_shopping_item, None);
        assert_eq!(stores.pantry.len(), 1);
    }

    #[test]
    fn failed_pantry_add_still_reports_error() {
        let mut stores = stores();
        let draft = NewIngredient::new("eggs", Category::Dairy, -2.0, "unit");
        let err = add_pantry_item(&mut stores, draft).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(stores.pantry.is_empty());
    }

    #[test]
    fn cooking_deducts_clamps_and_removes() {
        let mut stores = stores();
        stores.pantry.add(NewIngredient::new("Eggs", Category::Dairy, 6.0, "unit")).unwrap();
        stores.pantry.add(NewIngredient::new("Butter", Category::Dairy, 1.0, "stick")).unwrap();
        stores.pantry.add(NewIngredient::new("Flour", Category::Grains, 2.0, "cup")).unwrap();

        let deducted = cook_recipe(
            &mut stores.pantry,
            &[
                RecipeIngredient::new("eggs", "2"),
                RecipeIngredient::new("butter", "3 tbsp"),
                RecipeIngredient::new("flour", "2 cups"),
                RecipeIngredient::new("salt", "a pinch"),
            ],
        );
        assert_eq!(deducted, 3);
        assert_eq!(stores.pantry.len(), 1);
        let eggs = stores.pantry.find_loose("eggs").unwrap();
        assert_eq!(eggs.quantity, 4.0);
        assert!(stores.pantry.find_loose("butter").is_none());
    }

    #[test]
    fn recipe_gaps_skip_stocked_and_listed() {
        let mut stores = stores();
        stores.pantry.add_smart("Onion", Some(2.0), None, None).unwrap();
        stores.shopping.add_to_active(NewShoppingItem::named("Garlic")).unwrap();
        let recipe = Recipe::new("r1", "Soup", RecipeSource::Catalog).with_ingredients(vec![
            RecipeIngredient::new("onion", "1"),
            RecipeIngredient::new("garlic", "2 cloves"),
            RecipeIngredient::new("carrots", "3"),
        ]);
        stores.recipes.upsert(recipe).unwrap();

        assert_eq!(add_recipe_gaps_to_shopping(&mut stores, "r1").unwrap(), 1);
        let list = stores.shopping.active_list().unwrap();
        let carrots = list.items.iter().find(|i| i.name == "carrots").unwrap();
        assert_eq!(carrots.recipe_id.as_deref(), Some("r1"));
        assert_eq!(carrots.quantity, 3.0);
        assert!(matches!(
            add_recipe_gaps_to_shopping(&mut stores, "missing"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn voice_intents_route_to_collections() {
        let mut stores = stores();
        let outcome = apply_voice_intent(
            &mut stores,
            VoiceIntent::AddShopping {
                items: vec![VoiceItem { name: "bread".into(), quantity: None, unit: None }],
            },
        );
        assert!(matches!(outcome, VoiceOutcome::ShoppingAdded(ref items) if items.len() == 1));

        let outcome = apply_voice_intent(
            &mut stores,
            VoiceIntent::AddPantry {
                items: vec![
                    VoiceItem { name: "bread".into(), quantity: Some(1.0), unit: None },
                    VoiceItem { name: " ".into(), quantity: None, unit: None },
                ],
            },
        );
        match outcome {
            VoiceOutcome::PantryAdded(added) => {
                assert_eq!(added.len(), 1);
                assert!(added[0].checked_shopping_item.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            apply_voice_intent(&mut stores, VoiceIntent::Navigate { route: "/pantry".into() }),
            VoiceOutcome::Navigate("/pantry".into())
        );
    }

    #[test]
    fn deleting_recipe_clears_favorite_and_plans() {
        let mut stores = stores();
        let recipe = stores
            .recipes
            .upsert(Recipe::new("r1", "Tacos", RecipeSource::Catalog))
            .unwrap();
        stores.recipes.toggle_favorite("r1").unwrap();
        stores.meal_plans.add(date!(2026 - 03 - 02), MealType::Dinner, &recipe).unwrap();

        delete_recipe(&mut stores, "r1").unwrap();
        assert!(stores.recipes.favorite_ids().is_empty());
        assert!(stores.meal_plans.entries().is_empty());
    }
}
