//! Health-based domain redirect policy

use crate::database::DomainInfo;

/// Decide where an unhealthy domain should send its traffic.
///
/// Rules, first applicable wins:
/// 1. redirection disabled for the project: no redirect
/// 2. the requested domain is healthy: no redirect
/// 3. the first healthy domain of the project, in stored order
/// 4. the project's `currentDomain`, if set and non-empty
/// 5. otherwise no redirect
///
/// The caller still has to compare the target against the requested host.
pub fn redirect_target<'a>(info: &DomainInfo<'a>) -> Option<&'a str> {
    let project = info.project;

    if !project.redirect || info.domain.is_healthy() {
        return None;
    }

    project
        .domains
        .iter()
        .find(|(_, entry)| entry.as_ref().is_some_and(|e| e.is_healthy()))
        .map(|(host, _)| host.as_str())
        .or_else(|| {
            project
                .current_domain
                .as_deref()
                .filter(|domain| !domain.is_empty())
        })
}
