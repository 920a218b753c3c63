//! Desk startup and the interactive loop.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::shell::{self, describe, Command, Reply};
use crate::state::DeskState;

const PROMPT: &str = "desk> ";

/// Opens the desk at `/`, as a freshly loaded page would.
async fn land(state: &DeskState) -> String {
    match state.navigator.push("/").await {
        Ok(navigation) => describe(&navigation),
        Err(e) => format!("error: {}", e),
    }
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    if !text.ends_with('\n') {
        output.write_all(b"\n").await?;
    }
    Ok(())
}

/// Runs the command loop over `input` until it ends or `quit` is read.
///
/// After any command that asked for a full reload, the desk is rebuilt from
/// configuration and the persisted token, then opened at `/` again.
pub async fn run_with<R, W>(
    mut state: DeskState,
    input: R,
    output: &mut W,
) -> Result<DeskState, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    say(output, &land(&state).await).await?;
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<Command>() {
            Ok(command) => shell::execute(&state, command).await,
            Err(usage) => Ok(Reply::Text(usage)),
        };
        match reply {
            Ok(Reply::Quit) => break,
            Ok(Reply::Text(text)) => say(output, &text).await?,
            Err(e) => {
                warn!("Command '{}' failed: {}", line.trim(), e);
                say(output, &format!("error: {}", e)).await?;
            }
        }

        if state.reload.take() {
            info!(
                event_name = "desk.reloaded",
                event_domain = "desk",
                "rebuilding desk state"
            );
            state = state.rebuild().await;
            say(output, &format!("reloaded; {}", land(&state).await)).await?;
        }
    }

    output.flush().await?;
    Ok(state)
}

/// Builds the desk from `config` and serves stdin/stdout.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = DeskState::build(config, Metrics::new()).await;
    info!(
        "Starting desk with {} identity service '{}'",
        state.identity.get_type(),
        state.identity.get_name()
    );
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    run_with(state, input, &mut output).await?;
    Ok(())
}
