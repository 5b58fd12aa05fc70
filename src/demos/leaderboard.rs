//! Leaderboard demo on sorted sets and sets.

use redis::AsyncCommands;
use tracing::info;

use crate::error::Result;
use crate::store::Store;

const LEADERBOARD: &str = "leaderboard";
const RED_TEAM: &str = "team:red";
const BLUE_TEAM: &str = "team:blue";

const PLAYERS: [(f64, &str); 4] = [
    (1500.0, "alice"),
    (1200.0, "bob"),
    (1800.0, "carol"),
    (2000.0, "dave"),
];

/// Render members as a sorted list.
pub fn members_list(mut members: Vec<String>) -> String {
    members.sort();
    format!("{:?}", members)
}

/// Render `(member, score)` pairs in store order.
pub fn scores_list(scores: &[(String, f64)]) -> String {
    let rendered: Vec<String> = scores
        .iter()
        .map(|(member, score)| format!("({:?}, {:?})", member, score))
        .collect();
    format!("[{}]", rendered.join(", "))
}

/// Run the demo against the store.
pub async fn run(store: Store) -> Result<()> {
    let mut conn = store.connection();
    info!("Running leaderboard demo");

    let _: () = conn.zadd_multiple(LEADERBOARD, &PLAYERS[..]).await?;

    let alice: Option<f64> = conn.zscore(LEADERBOARD, "alice").await?;
    match alice {
        Some(score) => println!("Alice's score: {:?}", score),
        None => println!("Alice's score: None"),
    }

    let top = store.zrange_by_score(LEADERBOARD, 1200.0, 2000.0).await?;
    println!("Top players:");
    for (name, score) in top.iter().rev() {
        println!("  {}: {:?}", name, score);
    }

    let _: () = conn.sadd(RED_TEAM, &["alice", "bob"][..]).await?;
    let _: () = conn.sadd(BLUE_TEAM, &["carol", "dave"][..]).await?;

    let red: Vec<String> = conn.smembers(RED_TEAM).await?;
    println!("Red team members: {}", members_list(red));
    let blue: Vec<String> = conn.smembers(BLUE_TEAM).await?;
    println!("Blue team members: {}", members_list(blue));

    let red_size: u64 = conn.scard(RED_TEAM).await?;
    println!("Red team size: {}", red_size);

    let bob_in_red: bool = conn.sismember(RED_TEAM, "bob").await?;
    println!("Is Bob in Red team? {}", bob_in_red);

    let both: Vec<String> = conn.sinter(&[RED_TEAM, BLUE_TEAM][..]).await?;
    println!("Players in both teams: {}", members_list(both));
    let any: Vec<String> = conn.sunion(&[RED_TEAM, BLUE_TEAM][..]).await?;
    println!("All players in any team: {}", members_list(any));

    let _: () = conn.srem(RED_TEAM, "bob").await?;
    let red: Vec<String> = conn.smembers(RED_TEAM).await?;
    println!("Red team after removing Bob: {}", members_list(red));

    let _: () = conn.del("player:alice").await?;
    let _: () = conn.zrem(LEADERBOARD, "alice").await?;
    println!(
        "Leaderboard after removing Alice: {}",
        scores_list(&store.zrange_all(LEADERBOARD).await?)
    );

    let _: () = conn.zrembyscore(LEADERBOARD, 0, 1300).await?;
    println!(
        "Leaderboard after removing low scores: {}",
        scores_list(&store.zrange_all(LEADERBOARD).await?)
    );

    let board_exists: bool = conn.exists(LEADERBOARD).await?;
    println!("Leaderboard exists? {}", board_exists);
    let red_exists: bool = conn.exists(RED_TEAM).await?;
    println!("Red team exists? {}", red_exists);

    let team_keys: Vec<String> = conn.keys("team:*").await?;
    println!("All team keys: {}", members_list(team_keys));
    let all_keys: Vec<String> = conn.keys("*").await?;
    println!("All keys: {}", members_list(all_keys));

    Ok(())
}
