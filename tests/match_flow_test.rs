//! Integration tests for the lobby and match endpoints.
//!
//! Requires the server to be running on localhost:8000.

mod common;

use common::Player;
use serde_json::{json, Value};

async fn challenge(client: &reqwest::Client, from: &Player, to: &Player) -> reqwest::Response {
    client
        .post(common::url("/api/challenges"))
        .bearer_auth(&from.token)
        .json(&json!({ "opponent": to.id }))
        .send()
        .await
        .expect("Failed to send challenge")
}

async fn play(client: &reqwest::Client, player: &Player, match_id: i64, uci: &str) -> reqwest::Response {
    client
        .post(common::url(&format!("/api/matches/{match_id}/move")))
        .bearer_auth(&player.token)
        .json(&json!({ "uci_move": uci }))
        .send()
        .await
        .expect("Failed to send move")
}

async fn get_json(client: &reqwest::Client, player: &Player, path: &str) -> Value {
    let resp = client
        .get(common::url(path))
        .bearer_auth(&player.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "GET {path} should succeed");
    resp.json().await.unwrap()
}

/// Two fresh players in a new match, white first.
async fn new_match(client: &reqwest::Client) -> (Player, Player, i64) {
    let white = common::new_player(client, "white").await;
    let black = common::new_player(client, "black").await;
    let resp = challenge(client, &white, &black).await;
    assert_eq!(resp.status(), 200, "challenge should succeed");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    (white, black, body["match_id"].as_i64().unwrap())
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn online_list_excludes_viewer() {
    let client = common::client();
    let a = common::new_player(&client, "online_a").await;
    let b = common::new_player(&client, "online_b").await;

    let body = get_json(&client, &a, "/api/users/online").await;
    let names: Vec<&str> = body["online_users"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["username"].as_str())
        .collect();
    assert!(names.contains(&b.username.as_str()));
    assert!(!names.contains(&a.username.as_str()));
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn challenge_creates_pending_match() {
    let client = common::client();
    let (white, black, match_id) = new_match(&client).await;

    let body = get_json(&client, &black, "/api/challenges/pending").await;
    assert_eq!(body["challenge_received"], true);
    let body = get_json(&client, &white, "/api/challenges/pending").await;
    assert_eq!(body["challenge_received"], false);

    let body = get_json(&client, &black, "/api/matches/current").await;
    assert_eq!(body["current_game_id"], match_id);
    assert_eq!(body["current_turn"], "white");
    assert_eq!(body["player1"], white.username);
    assert_eq!(body["moves"], 0);
    assert_eq!(body["page_data"]["rows"][7]["e1"], "&#9812;");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn busy_players_cannot_be_challenged() {
    let client = common::client();
    let (white, black, _) = new_match(&client).await;
    let third = common::new_player(&client, "third").await;

    let resp = challenge(&client, &third, &black).await;
    assert_eq!(resp.status(), 409);
    let resp = challenge(&client, &white, &third).await;
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn cannot_challenge_self_or_unknown() {
    let client = common::client();
    let me = common::new_player(&client, "lonely").await;

    let resp = challenge(&client, &me, &me).await;
    assert_eq!(resp.status(), 400);

    let ghost = Player { id: i64::MAX, username: "ghost".into(), token: String::new() };
    let resp = challenge(&client, &me, &ghost).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn offline_opponent_cannot_be_challenged() {
    let client = common::client();
    let challenger = common::new_player(&client, "eager").await;
    let sleeper = common::new_player(&client, "sleeper").await;

    let resp = client
        .post(common::url("/api/auth/logout"))
        .bearer_auth(&sleeper.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = challenge(&client, &challenger, &sleeper).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Opponent is not online.");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn illegal_move_leaves_match_unchanged() {
    let client = common::client();
    let (white, _black, match_id) = new_match(&client).await;

    let resp = play(&client, &white, match_id, "e2e5").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid move!");

    let body = get_json(&client, &white, &format!("/api/matches/{match_id}")).await;
    assert_eq!(body["moves"], 0);
    assert_eq!(body["current_turn"], "white");
    assert_eq!(body["active"], true);
    assert_eq!(body["page_data"]["rows"][6]["e2"], "&#9817;");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn concurrent_moves_only_one_lands() {
    let client = common::client();
    let (white, _black, match_id) = new_match(&client).await;

    let (first, second) = tokio::join!(
        play(&client, &white, match_id, "e2e4"),
        play(&client, &white, match_id, "e2e4"),
    );
    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses[0], 200, "one submission should land");
    // The loser either lost the write race (409) or read the updated
    // position and found it was no longer white's turn (400).
    assert!(
        statuses[1] == 409 || statuses[1] == 400,
        "the other submission should be rejected, got {}",
        statuses[1]
    );

    let body = get_json(&client, &white, &format!("/api/matches/{match_id}")).await;
    assert_eq!(body["moves"], 1);
    assert_eq!(body["current_turn"], "black");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn moves_alternate_and_are_validated() {
    let client = common::client();
    let (white, black, match_id) = new_match(&client).await;

    // Black can't open, and can't touch white's pieces.
    let resp = play(&client, &black, match_id, "e7e5").await;
    assert_eq!(resp.status(), 400);
    let resp = play(&client, &white, match_id, "e7e5").await;
    assert_eq!(resp.status(), 400);

    let resp = play(&client, &white, match_id, "e2e5").await;
    assert_eq!(resp.status(), 400, "illegal move");
    let resp = play(&client, &white, match_id, "e2-e4").await;
    assert_eq!(resp.status(), 400, "bad format");
    let resp = play(&client, &white, match_id, "  ").await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "You must enter a move.");

    let resp = play(&client, &white, match_id, "e2e4").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["current_turn"], "black");
    assert_eq!(body["moves"], 1);
    assert_eq!(body["page_data"]["rows"][4]["e4"], "&#9817;");

    let resp = play(&client, &black, match_id, "e7e5").await;
    assert_eq!(resp.status(), 200);

    // Spectators see the state but cannot move.
    let spectator = common::new_player(&client, "spectator").await;
    let body = get_json(&client, &spectator, &format!("/api/matches/{match_id}")).await;
    assert_eq!(body["moves"], 2);
    let resp = play(&client, &spectator, match_id, "g1f3").await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn fools_mate_ends_match() {
    let client = common::client();
    let (white, black, match_id) = new_match(&client).await;

    for (player, uci) in [(&white, "f2f3"), (&black, "e7e5"), (&white, "g2g4")] {
        assert_eq!(play(&client, player, match_id, uci).await.status(), 200);
    }
    let resp = play(&client, &black, match_id, "d8h4").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["active"], false);
    assert_eq!(body["outcome"], format!("{} wins by checkmate", black.username));

    let resp = play(&client, &white, match_id, "a2a3").await;
    assert_eq!(resp.status(), 409);

    let body = get_json(&client, &black, "/api/matches").await;
    assert_eq!(body["games"][0]["id"], match_id);
    assert_eq!(body["games"][0]["result"], "Win");
    let body = get_json(&client, &white, "/api/matches").await;
    assert_eq!(body["games"][0]["result"], "Loss");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn resign_journal_and_hide() {
    let client = common::client();
    let (white, black, match_id) = new_match(&client).await;

    let resp = client
        .post(common::url(&format!("/api/matches/{match_id}/resign")))
        .bearer_auth(&white.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["outcome"], format!("{} wins by resignation", black.username));

    let journal = common::url(&format!("/api/matches/{match_id}/journal"));
    let resp = client
        .put(&journal)
        .bearer_auth(&white.token)
        .json(&json!({ "description": "Resigned early", "notes": "Too tired." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = get_json(&client, &white, "/api/matches").await;
    assert_eq!(body["games"][0]["journal"]["description"], "Resigned early");

    let resp = client
        .put(&journal)
        .bearer_auth(&white.token)
        .json(&json!({ "description": "x".repeat(201) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(common::url(&format!("/api/matches/{match_id}/hide")))
        .bearer_auth(&white.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body = get_json(&client, &white, "/api/matches").await;
    assert_eq!(body["total"], 0);
    let body = get_json(&client, &black, "/api/matches").await;
    assert_eq!(body["total"], 1, "opponent still sees the match");
}

#[tokio::test]
#[ignore = "requires a running server on localhost:8000"]
async fn deleting_journal_keeps_match() {
    let client = common::client();
    let (white, _black, match_id) = new_match(&client).await;
    let journal = common::url(&format!("/api/matches/{match_id}/journal"));

    let resp = client
        .put(&journal)
        .bearer_auth(&white.token)
        .json(&json!({ "description": "Italian game", "notes": "Play c3 next time." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client.delete(&journal).bearer_auth(&white.token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let body = get_json(&client, &white, &format!("/api/matches/{match_id}/journal")).await;
    assert!(body["description"].is_null());
    assert!(body["notes"].is_null());

    let body = get_json(&client, &white, "/api/matches").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["games"][0]["id"], match_id);
    assert!(body["games"][0]["journal"].is_null());

    let body = get_json(&client, &white, &format!("/api/matches/{match_id}")).await;
    assert_eq!(body["active"], true);
}
