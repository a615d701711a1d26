//! Two participants sharing one in-process signaling hub
//!
//! Run with: cargo run --example two_participants
//!
//! Walks through presence convergence, a remote screen share, an edit
//! session with debounced updates, and the inactivity auto-release.
//! Delays are shortened so the whole scenario finishes in a few seconds.
//!
//! Set RUST_LOG=huddle_sync=trace to see every message on the wire.

use std::time::Duration;

use huddle_sync::channel::MemoryHub;
use huddle_sync::media::{MediaEvent, TrackHandle};
use huddle_sync::{SessionConfig, SessionHandle, SessionSnapshot};

fn print_snapshot(who: &str, snapshot: &SessionSnapshot) -> Result<(), serde_json::Error> {
    println!("--- {} ---", who);
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("huddle_sync=info".parse()?)
                .add_directive("two_participants=info".parse()?),
        )
        .init();

    let config = SessionConfig::default()
        .note_debounce(Duration::from_millis(200))
        .lock_idle_timeout(Duration::from_secs(1));

    let hub = MemoryHub::new();
    let (alice, alice_task) = SessionHandle::spawn(config.clone(), hub.endpoint());
    let (bob, bob_task) = SessionHandle::spawn(config, hub.endpoint());

    alice.join("alice", "Alice").await?;
    bob.join("bob", "Bob").await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let members = hub.member_count().await;
    tracing::info!(members, "Both participants joined");

    // The media layer reports camera off/on for Bob; Alice infers a screen share
    for event in [
        MediaEvent::VideoPublished {
            participant: "bob".into(),
            track: TrackHandle(1),
        },
        MediaEvent::VideoUnpublished("bob".into()),
        MediaEvent::VideoPublished {
            participant: "bob".into(),
            track: TrackHandle(2),
        },
    ] {
        alice.media_event(event).await?;
    }

    alice.request_lock().await?;
    for draft in ["Agenda", "Agenda:\n- demo", "Agenda:\n- demo\n- retro"] {
        alice.edit_document(draft).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    print_snapshot("alice while editing", &alice.snapshot())?;
    print_snapshot("bob while alice edits", &bob.snapshot())?;

    if let Err(e) = bob.edit_document("overwrite").await {
        tracing::info!(error = %e, "Bob cannot edit while Alice holds the lock");
    }

    tokio::time::sleep(Duration::from_millis(1200)).await;
    print_snapshot("bob after alice went idle", &bob.snapshot())?;

    alice.leave().await?;
    bob.leave().await?;
    drop(alice);
    drop(bob);
    alice_task.await?;
    bob_task.await?;

    Ok(())
}
