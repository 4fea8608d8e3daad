use anyhow::Context;
use serde_json::{json, Value};

use domain::{Comment, Post, UserNotification, VoteResult};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

async fn check(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("request failed with {}: {}", status, body)
}

async fn register(client: &reqwest::Client, base: &str, name: &str) -> anyhow::Result<(String, String)> {
    let suffix = format!("{:x}", rand::random::<u32>());
    let resp = client
        .post(format!("{}/api/users", base))
        .json(&json!({
            "email": format!("{}+{}@example.org", name, suffix),
            "display_name": name,
        }))
        .send()
        .await?;
    let body: Value = check(resp).await?.json().await?;
    let id = body["user"]["id"].as_str().context("missing user id")?;
    let token = body["token"].as_str().context("missing token")?;
    Ok((id.to_string(), token.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let client = reqwest::Client::new();
    println!("Starting Tumindig demo client against {}...", base);

    println!("\n[1/6] Registering two users...");
    let (_, organiser) = register(&client, &base, "Organiser").await?;
    let (_, volunteer) = register(&client, &base, "Volunteer").await?;
    println!("   -> Done");

    println!("\n[2/6] Creating a community...");
    let community = format!("cleanup_{:x}", rand::random::<u16>());
    let resp = client
        .post(format!("{}/api/communities", base))
        .bearer_auth(&organiser)
        .json(&json!({
            "name": community,
            "privacy_type": "public",
            "category": "Environment",
            "description": "Weekend beach and river cleanups",
        }))
        .send()
        .await?;
    check(resp).await?;
    println!("   -> Created {}", community);

    println!("\n[3/6] Posting a volunteer event...");
    let event_date = chrono::Utc::now().date_naive() + chrono::Duration::days(7);
    let resp = client
        .post(format!("{}/api/communities/{}/posts", base, community))
        .bearer_auth(&organiser)
        .json(&json!({
            "title": "Coastal cleanup",
            "body": "Bring gloves, we supply the bags.",
            "is_volunteer": true,
            "event": {
                "event_date": event_date,
                "event_time": "07:00",
                "event_location": "North pier",
                "volunteers_needed": 25,
            },
        }))
        .send()
        .await?;
    let post: Post = check(resp).await?.json().await?;
    println!("   -> Post {} on {}", post.id, event_date);

    println!("\n[4/6] Volunteer joins and upvotes...");
    let resp = client
        .post(format!("{}/api/communities/{}/members", base, community))
        .bearer_auth(&volunteer)
        .send()
        .await?;
    check(resp).await?;
    let resp = client
        .post(format!("{}/api/posts/{}/vote", base, post.id))
        .bearer_auth(&volunteer)
        .json(&json!({ "direction": "up" }))
        .send()
        .await?;
    let vote: VoteResult = check(resp).await?.json().await?;
    println!("   -> Vote {} / tally {}", vote.user_vote, vote.vote_status);

    println!("\n[5/6] Volunteer comments...");
    let resp = client
        .post(format!("{}/api/posts/{}/comments", base, post.id))
        .bearer_auth(&volunteer)
        .json(&json!({ "text": "Count me in!" }))
        .send()
        .await?;
    let comment: Comment = check(resp).await?.json().await?;
    println!("   -> Comment {}", comment.id);

    println!("\n[6/6] Waiting 1 second, then reading the organiser's inbox...");
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    let resp = client
        .get(format!("{}/api/notifications", base))
        .bearer_auth(&organiser)
        .send()
        .await?;
    let inbox: Vec<UserNotification> = check(resp).await?.json().await?;
    println!("   -> {} notification(s):", inbox.len());
    for n in inbox {
        println!("      - [{}] {}", n.kind, n.message);
    }

    Ok(())
}
