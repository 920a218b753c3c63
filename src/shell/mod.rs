//! The desk's line-oriented front end.

mod command;

pub use command::{Command, HELP};

use std::fmt::Write as _;

use tracing::info;

use crate::error::{DeskError, DeskResult};
use crate::models::ClinicalRecordForm;
use crate::navigation::Navigation;
use crate::routing::MenuItem;
use crate::state::DeskState;

/// Route the intake form lives on.
const INTAKE_ROUTE: &str = "PatientCollect";
const INTAKE_PATH: &str = "/patient/index";

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub fn describe(navigation: &Navigation) -> String {
    let mut line = format!(
        "at {} ({})",
        navigation.location,
        navigation.matched.name.as_deref().unwrap_or("unnamed")
    );
    if let Some(from) = &navigation.redirected_from {
        let _ = write!(line, ", redirected from {}", from);
    }
    if navigation.replaced {
        line.push_str(", replaced");
    }
    line
}

fn render_menu(items: &[MenuItem], depth: usize, out: &mut String) {
    for item in items {
        let _ = writeln!(
            out,
            "{}{} [{}]",
            "  ".repeat(depth),
            item.title,
            item.path
        );
        render_menu(&item.children, depth + 1, out);
    }
}

fn whoami(state: &DeskState) -> String {
    let session = state.session.snapshot();
    if !session.is_authenticated() {
        return "not signed in".to_string();
    }
    let name = if session.username.is_empty() {
        "(profile not loaded)"
    } else {
        session.username.as_str()
    };
    let roles: Vec<&str> = session.roles.iter().map(String::as_str).collect();
    format!("{} roles=[{}]", name, roles.join(", "))
}

fn routes(state: &DeskState) -> String {
    let mut out = String::new();
    for record in state.router.get_routes() {
        let _ = write!(out, "{}", record.path);
        if let Some(name) = &record.name {
            let _ = write!(out, " {}", name);
        }
        if let Some(target) = &record.redirect {
            let _ = write!(out, " -> {}", target);
        }
        if record.meta.requires_roles() {
            let _ = write!(out, " roles=[{}]", record.meta.roles.join(", "));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn history(state: &DeskState) -> String {
    let entries = state.navigator.history();
    if entries.is_empty() {
        return "no history".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, n)| format!("{:>2}. {}", i + 1, n.location))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn intake(state: &DeskState, file: &str) -> DeskResult<String> {
    let navigation = state.navigator.push(INTAKE_PATH).await?;
    if navigation.matched.name.as_deref() != Some(INTAKE_ROUTE) {
        return Ok(format!(
            "patient intake is not available here; {}",
            describe(&navigation)
        ));
    }

    let raw = tokio::fs::read_to_string(file).await?;
    let form: ClinicalRecordForm = serde_json::from_str(&raw)
        .map_err(|e| DeskError::Io(format!("'{}' is not an intake record: {}", file, e)))?;

    match form.finalize() {
        Ok(record) => {
            let score = record.symptoms.osdi_total_score.unwrap_or_default();
            info!(
                event_name = "intake.accepted",
                event_domain = "clinical",
                patient_id = record.patient_id.as_str(),
                osdi = score,
                "intake record accepted"
            );
            Ok(format!(
                "patient {}: OSDI {:.2} ({:?}), {} systemic condition(s)",
                record.patient_id,
                score,
                record.symptoms.severity(),
                record.systemic_history.condition_count()
            ))
        }
        Err(issues) => Ok(format!(
            "intake record rejected:\n  - {}",
            issues.join("\n  - ")
        )),
    }
}

/// Runs one command against the desk.
pub async fn execute(state: &DeskState, command: Command) -> DeskResult<Reply> {
    let text = match command {
        Command::Login(credentials) => {
            state.session.login(&credentials).await?;
            let navigation = state.navigator.push("/").await?;
            format!("signed in; {}", describe(&navigation))
        }
        Command::Go(path) => describe(&state.navigator.push(&path).await?),
        Command::Replace(path) => describe(&state.navigator.replace(&path).await?),
        Command::Whoami => whoami(state),
        Command::Routes => routes(state),
        Command::Menu => {
            let mut out = String::new();
            render_menu(&state.permission.menu(), 0, &mut out);
            out.trim_end().to_string()
        }
        Command::History => history(state),
        Command::Intake(file) => intake(state, &file).await?,
        Command::Metrics => state.metrics.render(),
        Command::Logout => {
            state.session.logout().await;
            "signed out".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Text(text))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use figment::providers::{Format, Yaml};
    use figment::Figment;

    use super::*;
    use crate::config::parse_config;
    use crate::metrics::Metrics;

    const CONFIG: &str = r#"
version: "1.0.0"
identity:
  type: mock
  name: desk-mock
  roles: [nurse]
  username: Nurse Wu
  login_latency_ms: 0
  profile_latency_ms: 0
"#;

    async fn desk() -> DeskState {
        let config = parse_config(Figment::new().merge(Yaml::string(CONFIG))).unwrap();
        DeskState::build(Arc::new(config), Metrics::new()).await
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(text) => text,
            Reply::Quit => panic!("unexpected quit"),
        }
    }

    #[tokio::test]
    async fn test_login_lands_on_workbench() {
        let state = desk().await;
        let reply = execute(&state, "login nurse.wu secret".parse().unwrap())
            .await
            .unwrap();
        assert!(text(reply).starts_with("signed in; at /workbench (Workbench)"));

        let who = text(execute(&state, Command::Whoami).await.unwrap());
        assert_eq!(who, "Nurse Wu roles=[nurse]");
    }

    #[tokio::test]
    async fn test_menu_follows_roles() {
        let state = desk().await;
        execute(&state, "login nurse.wu secret".parse().unwrap())
            .await
            .unwrap();
        let menu = text(execute(&state, Command::Menu).await.unwrap());
        assert!(menu.contains("[/patient/index]"));
        assert!(menu.contains("[/history/index]"));
        assert!(!menu.contains("/dashboard"));
    }

    #[tokio::test]
    async fn test_go_without_login_ends_on_login() {
        let state = desk().await;
        let reply = text(execute(&state, Command::Go("/patient".to_string())).await.unwrap());
        assert_eq!(reply, "at /login (unnamed), redirected from /patient");
        assert_eq!(text(execute(&state, Command::Whoami).await.unwrap()), "not signed in");
    }

    #[tokio::test]
    async fn test_logout_requests_reload() {
        let state = desk().await;
        execute(&state, "login nurse.wu secret".parse().unwrap())
            .await
            .unwrap();
        execute(&state, Command::Logout).await.unwrap();
        assert!(state.reload.is_requested());
        assert!(!state.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_quit() {
        let state = desk().await;
        assert_eq!(execute(&state, Command::Quit).await.unwrap(), Reply::Quit);
    }

    #[tokio::test]
    async fn test_intake_missing_file_is_an_error() {
        let state = desk().await;
        execute(&state, "login nurse.wu secret".parse().unwrap())
            .await
            .unwrap();
        let err = execute(&state, Command::Intake("/definitely/not/here.json".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::Io(_)));
    }
}
