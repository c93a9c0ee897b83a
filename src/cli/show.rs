//! show / snapshot / whois commands

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::batch::read_batch;
use crate::fetch::{user_profile, FeedClient};
use crate::story::{MediaType, Story};

pub fn show(path: &Path) -> Result<()> {
    let story = Story::load_json(path)?;
    print_story(&story);
    Ok(())
}

/// Pull one record out of a batch file into its own snapshot
pub fn snapshot(batch: &Path, media_id: &str, out: &Path) -> Result<()> {
    let story = read_batch(batch)?
        .into_iter()
        .find(|s| s.media_id == media_id)
        .ok_or_else(|| anyhow!("Story {} not found in {}", media_id, batch.display()))?;

    story.save_json(out)?;
    println!("Wrote {} to {}", story.media_id, out.display());
    Ok(())
}

pub fn whois(client: &dyn FeedClient, user_id: &str) -> Result<()> {
    match user_profile(client, user_id)? {
        Some(p) => println!(
            "{} ({}) - {} followers, {} following",
            p.username, p.full_name, p.follower_count, p.following_count
        ),
        None => println!("No profile found for {}.", user_id),
    }
    Ok(())
}

fn print_story(story: &Story) {
    println!("\n{}", "-".repeat(40));
    println!("ID: {}", story.media_id);
    println!(
        "USR ID {} NK {} - FN {}",
        story.user_id, story.nickname, story.fullname
    );
    match story.media_type {
        MediaType::Video => println!("Video URL:\n{}", story.url),
        _ => println!("Photo URL:\n{}", story.url),
    }
    println!("TIMESTAMP:\n{}", story.timestamp);

    if !story.caption.is_empty() {
        println!("CAPTION:\n{}", story.caption);
    }
    if !story.mentions.is_empty() {
        println!("MENTIONS:");
        for (idx, m) in story.mentions.iter().enumerate() {
            println!("{} - USR ID {} NK {} - FN {}", idx + 1, m.user_id, m.nickname, m.fullname);
        }
    }
    if !story.locations.is_empty() {
        println!("GEOTAGGED:");
        for g in &story.locations {
            println!("NAME: {} LAT: {} LNG: {}", g.name, g.lat, g.lng);
        }
    }
    if !story.hashtags.is_empty() {
        println!("HASHTAGS:");
        for tag in &story.hashtags {
            println!("# {}", tag);
        }
    }
    if !story.ctas.is_empty() {
        println!("CTA:");
        for (idx, cta) in story.ctas.iter().enumerate() {
            println!("{} | Link: {}", idx + 1, cta);
        }
    }
}
