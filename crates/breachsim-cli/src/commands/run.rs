//! `breachsim run`: drive one session and narrate it on stdout.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use breachsim_client::{ClientConfig, SessionController};
use breachsim_core::agent::{AgentId, PipelineStage, Team};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;

/// Display poll period. Decoupled from the simulator tick so live sessions
/// read the same way as mock ones.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const STAGES: [PipelineStage; 5] = [
    PipelineStage::Scanner,
    PipelineStage::Infrastructure,
    PipelineStage::Data,
    PipelineStage::Weaponizer,
    PipelineStage::Commander,
];

pub async fn execute(
    mission: String,
    base_url: Option<String>,
    mock: bool,
    auto_approve: bool,
) -> Result<()> {
    let mut config = ClientConfig::from_env();
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    let controller = SessionController::new(config);

    if !mock {
        controller.connect().await;
    }
    controller.start(&mission).await;
    println!(
        "mission {mission} started ({})",
        if controller.is_live().await { "live" } else { "local" }
    );

    let mut seen: HashMap<AgentId, String> = HashMap::new();
    let mut last_health = controller.snapshot().await.health;

    loop {
        sleep(POLL_INTERVAL).await;
        let state = controller.snapshot().await;

        for team in [Team::Red, Team::Blue] {
            for stage in STAGES {
                let agent = AgentId::new(team, stage);
                let Some(line) = state.transcripts.get(&agent) else {
                    continue;
                };
                if seen.get(&agent) != Some(line) {
                    println!("[{agent}] {line}");
                    seen.insert(agent, line.clone());
                }
            }
        }

        if state.health != last_health {
            println!("** asset health {} -> {}", last_health, state.health);
            last_health = state.health;
        }

        if let Some(proposal) = &state.proposal {
            println!();
            println!("{} proposes: {}", proposal.team, proposal.action);
            println!("  {}", proposal.description);
            let approved = auto_approve || prompt_decision().await?;
            println!(
                "decision: {}",
                if approved { "approved" } else { "rejected" }
            );
            controller.submit_decision(approved).await;
        }

        if state.mitigation_score > 0 && !state.defense_description.is_empty() {
            println!();
            println!(
                "defense in place (mitigation {}): {}",
                state.mitigation_score, state.defense_description
            );
            break;
        }
    }

    controller.reset().await;
    Ok(())
}

/// Reads an approve/reject answer from stdin. Anything that is not an
/// explicit no counts as approval.
async fn prompt_decision() -> Result<bool> {
    println!("approve? [Y/n] ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(!matches!(answer.as_str(), "n" | "no"))
}
