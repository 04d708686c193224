use anyhow::Result;
use ktc_scraper::{KtcScraper, RankingPage};
use std::fs;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let page = match std::env::args().nth(1).as_deref() {
        Some("redraft") => RankingPage::Redraft,
        _ => RankingPage::Dynasty,
    };

    info!("Starting KTC {:?} rankings scrape...", page);

    let scraper = KtcScraper::new()?;
    let rankings = scraper.scrape_rankings(page).await?;

    fs::create_dir_all("data/rankings")?;
    let kind = match page {
        RankingPage::Dynasty => "dynasty",
        RankingPage::Redraft => "redraft",
    };
    let json_path = format!(
        "data/rankings/ktc_{}_{}.json",
        kind,
        rankings.fetched_at.format("%Y%m%d_%H%M%S")
    );
    fs::write(&json_path, serde_json::to_string_pretty(&rankings)?)?;

    info!("Saved {} players to {}", rankings.players.len(), json_path);

    println!("\nTop 10 KTC players ({:?}):", page);
    println!("{:<24} {:<4} {:<4} {:<8} {:<8}", "Name", "Pos", "Team", "1QB", "SF");
    println!("{}", "-".repeat(52));
    for player in rankings.top_players(10) {
        println!(
            "{:<24} {:<4} {:<4} {:<8} {:<8}",
            player.player_name.as_deref().unwrap_or("?"),
            player.position.as_deref().unwrap_or("?"),
            player.team.as_deref().unwrap_or(""),
            player.one_qb_values.as_ref().and_then(|v| v.value).unwrap_or(0),
            player.superflex_values.as_ref().and_then(|v| v.value).unwrap_or(0),
        );
    }

    Ok(())
}
