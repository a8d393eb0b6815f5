use std::io::Read;

use pantrysync::coordinator;
use pantrysync::ingest::receipt;
use pantrysync::AppState;

/// Reads receipt text on stdin and stocks the pantry with what it recognizes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "pantrysync=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    if let Some(user_id) = app_state.config.device_user_id {
        let report = app_state.start_session(user_id).await;
        if report.remote_unavailable {
            tracing::warn!("remote store unreachable; working from local state");
        }
    }

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    let candidates = receipt::extract_candidates(&raw, app_state.config.receipt_max_items);
    tracing::info!(found = candidates.len(), "receipt parsed");

    let (added, checked) = app_state.with_stores(|stores| {
        let mut added = 0;
        let mut checked = 0;
        for candidate in &candidates {
            match coordinator::add_pantry_item(stores, candidate.to_new_ingredient()) {
                Ok(outcome) => {
                    added += 1;
                    if outcome.checked_shopping_item.is_some() {
                        checked += 1;
                    }
                    let item = &outcome.ingredient;
                    println!("+ {} ({} {})", item.name, item.quantity, item.unit);
                }
                Err(e) => {
                    tracing::warn!(name = %candidate.name, error = %e, "skipped receipt line")
                }
            }
        }
        (added, checked)
    });

    if let Err(e) = app_state.save_all_now().await {
        tracing::warn!(error = %e, "final save failed; changes kept on this device");
    }
    tracing::info!(added, checked, "receipt import finished");
    app_state.logout();
    Ok(())
}
