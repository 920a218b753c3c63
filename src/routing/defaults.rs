//! The clinic desk's built-in route tables, used when the config does not
//! override them.

use crate::models::{RouteDescriptor, RouteMeta};

fn meta(title: &str, icon: &str) -> RouteMeta {
    RouteMeta {
        title: Some(title.to_string()),
        icon: Some(icon.to_string()),
        ..Default::default()
    }
}

fn hidden() -> RouteMeta {
    RouteMeta {
        hidden: true,
        ..Default::default()
    }
}

fn roles(list: &[&str]) -> Vec<String> {
    list.iter().map(|r| r.to_string()).collect()
}

/// A role-gated screen mounted as `<path>/index` under a layout route.
fn screen(path: &str, name: &str, title: &str, icon: &str, allowed: &[&str]) -> RouteDescriptor {
    RouteDescriptor::new(path)
        .named(format!("{}Root", name))
        .redirect_to(format!("{}/index", path))
        .with_meta(RouteMeta {
            roles: roles(allowed),
            ..meta(title, icon)
        })
        .with_child(
            RouteDescriptor::new("index")
                .named(name)
                .with_meta(meta(title, icon)),
        )
}

/// Routes present from startup, whatever the session.
pub fn clinic_constant_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::new("/redirect")
            .with_meta(hidden())
            .with_child(RouteDescriptor::new("/redirect/:path(.*)")),
        RouteDescriptor::new("/403").with_meta(hidden()),
        RouteDescriptor::new("/404")
            .named("NotFound")
            .with_alias("/:pathMatch(.*)*")
            .with_meta(hidden()),
        RouteDescriptor::new("/login").with_meta(hidden()),
        RouteDescriptor::new("/")
            .redirect_to("/workbench")
            .with_child(
                RouteDescriptor::new("workbench")
                    .named("Workbench")
                    .with_meta(RouteMeta {
                        affix: true,
                        ..meta("Workbench", "Monitor")
                    }),
            ),
    ]
}

/// Role-gated routes, materialized once per session from the user's roles.
pub fn clinic_dynamic_routes() -> Vec<RouteDescriptor> {
    let mut ai_chat = screen(
        "/ai-chat",
        "AiChat",
        "AI consultation",
        "ChatDotRound",
        &["admin", "doctor"],
    );
    ai_chat.meta.always_show = true;
    ai_chat.children[0].meta.keep_alive = true;

    vec![
        screen(
            "/patient",
            "PatientCollect",
            "Patient intake",
            "Edit",
            &["admin", "doctor", "nurse"],
        ),
        screen(
            "/diagnosis",
            "AIDiagnosis",
            "AI diagnosis",
            "Cpu",
            &["admin", "doctor"],
        ),
        ai_chat,
        screen("/dashboard", "Dashboard", "Dashboard", "DataLine", &["admin"]),
        screen(
            "/history",
            "History",
            "Record archive",
            "Document",
            &["admin", "doctor", "nurse"],
        ),
    ]
}
