use tracing::{error, info};

use super::table::Router;
use crate::error::{DeskError, DeskResult};
use crate::navigation::reload::Reloader;

/// Retracts every dynamically added route from the live table.
///
/// A route counts as dynamic when it is named and declares required roles.
/// Children of a removed route go with it, so names already gone are skipped.
/// If any removal fails the table is in an unknown state: a full reload is
/// requested and the error returned.
pub fn reset_router(router: &dyn Router, reloader: &dyn Reloader) -> DeskResult<usize> {
    let names: Vec<String> = router
        .get_routes()
        .into_iter()
        .filter(|r| r.meta.requires_roles())
        .filter_map(|r| r.name)
        .collect();

    let mut removed = 0;
    for name in names {
        if !router.has_route(&name) {
            continue;
        }
        if let Err(e) = router.remove_route(&name) {
            error!(
                event_name = "routing.reset.failed",
                event_domain = "routing",
                route = name.as_str(),
                error = e.as_str(),
                "failed to retract dynamic route; forcing reload"
            );
            reloader.reload();
            return Err(DeskError::RouteRemoval(e));
        }
        removed += 1;
    }

    info!(
        event_name = "routing.reset.done",
        event_domain = "routing",
        removed_count = removed,
        "dynamic routes retracted"
    );
    Ok(removed)
}
