//! Walkthrough of a Brewstand session against an in-memory backend.
//!
//! Run with `cargo run -p brewstand --example demo`. Set
//! `RUST_LOG=brewstand=debug` to see the subscription lifecycle.

use anyhow::Context;
use brewstand::{BrewClient, BrewConfig, BrewState, Ingredient, Temperature};
use brewstand_core::identity::SessionUser;
use brewstand_testing::{InMemoryDocumentStore, InMemoryIdentityProvider};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brewstand=info")),
        )
        .init();

    println!("=== Brewstand ===\n");

    let documents = InMemoryDocumentStore::new();
    documents.seed(
        "bases",
        [
            json!({ "name": "Espresso", "color": "#3b2f2f" }),
            json!({ "name": "Cold Brew", "color": "#1e1410" }),
        ],
    );
    documents.seed(
        "creamers",
        [
            json!({ "name": "Whole Milk", "color": "#fdfff5" }),
            json!({ "name": "Oat Milk", "color": "#f5f0e1" }),
        ],
    );
    documents.seed(
        "syrups",
        [
            json!({ "name": "Vanilla", "color": "#f3e5ab" }),
            json!({ "name": "Caramel", "color": "#c68e17" }),
        ],
    );

    let client = BrewClient::new(Arc::new(documents), BrewConfig::default());
    client.load_ingredients().await?;
    print_catalogs(&client.snapshot().await);

    // Not signed in yet
    let status = client.make_beverage().await?;
    println!("\nWithout a user: {status}");

    let auth = Arc::new(InMemoryIdentityProvider::new());
    let binding = client.bind_identity(auth.clone());
    auth.sign_in(SessionUser::new("barista-1").with_display_name("Barista"));

    let mut updates = client.subscribe_state();
    updates
        .wait_for(BrewState::is_signed_in)
        .await
        .context("client stopped before sign-in")?;

    let syrups = client.state(|s| s.syrups.clone()).await;
    client.select_syrup(syrups.last().cloned()).await?;
    client.select_temp(Temperature::Cold).await?;
    client.set_beverage_name("Iced Caramel Latte").await?;

    let status = client.make_beverage().await?;
    println!("\n{status}");

    let mut updates = client.subscribe_state();
    tokio::time::timeout(
        Duration::from_secs(5),
        updates.wait_for(|state| !state.beverages.is_empty()),
    )
    .await
    .context("beverage never arrived")?
    .context("client stopped before the beverage arrived")?;

    println!("\nYour beverages:");
    for beverage in client.state(|s| s.beverages.clone()).await {
        println!(
            "  {} ({} + {} + {}, {})",
            beverage.name, beverage.base.name, beverage.creamer.name, beverage.syrup.name, beverage.temp
        );
    }

    auth.sign_out();
    let mut updates = client.subscribe_state();
    updates
        .wait_for(|state| !state.is_signed_in())
        .await
        .context("client stopped before sign-out")?;
    println!(
        "\nSigned out, {} beverages visible",
        client.state(|s| s.beverages.len()).await
    );

    binding.abort();
    client.shutdown().await?;

    println!("\n=== Done ===");
    Ok(())
}

fn names(ingredients: &[Ingredient]) -> String {
    ingredients
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_catalogs(state: &BrewState) {
    println!("Bases:    {}", names(&state.bases));
    println!("Creamers: {}", names(&state.creamers));
    println!("Syrups:   {}", names(&state.syrups));
    println!(
        "Draft:    {} / {} / {} ({})",
        state.current_base.as_ref().map_or("-", |i| i.name.as_str()),
        state.current_creamer.as_ref().map_or("-", |i| i.name.as_str()),
        state.current_syrup.as_ref().map_or("-", |i| i.name.as_str()),
        state.current_temp,
    );
}
