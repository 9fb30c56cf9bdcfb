use std::process::ExitCode;

use clap::Parser;
use common::games::snake::{GameSnapshot, RemoteAction};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "remote_control",
    about = "Send an admin action to a running token snake server"
)]
struct Args {
    /// Base URL of the running server.
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,

    /// suicide (alias kill) or shrink.
    action: RemoteAction,
}

#[derive(Serialize)]
struct RemoteControlRequest {
    action: RemoteAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteControlResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    deaths: u64,
    game_state: Option<GameSnapshot>,
}

fn describe(response: &RemoteControlResponse) -> Vec<String> {
    if !response.success {
        return vec![format!("Action failed: {}", response.message)];
    }

    let mut lines = vec![
        format!("Action succeeded: {}", response.message),
        format!("Deaths: {}", response.deaths),
    ];
    if let Some(game_state) = &response.game_state {
        lines.push(format!("Snake length: {}", game_state.snake.len()));
    }
    lines
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let url = format!("{}/api/remote-control", args.server.trim_end_matches('/'));

    println!("Sending '{}' to {}", args.action, url);

    let response: RemoteControlResponse = reqwest::Client::new()
        .post(&url)
        .json(&RemoteControlRequest {
            action: args.action,
        })
        .send()
        .await?
        .json()
        .await?;

    for line in describe(&response) {
        println!("{}", line);
    }

    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
