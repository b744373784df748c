//! Document title guard.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::guard::{Guard, GuardOutcome};
use crate::route::RouteLocation;

/// The current window title, shared with whatever renders it.
#[derive(Debug, Clone, Default)]
pub struct DocumentTitle(Arc<RwLock<String>>);

impl DocumentTitle {
    pub fn new(initial: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(initial.into())))
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }

    pub fn set(&self, title: impl Into<String>) {
        *self.0.write() = title.into();
    }
}

/// Sets the title to `"{app_name} - {route title}"`. Never blocks.
pub struct TitleGuard {
    title: DocumentTitle,
    app_name: String,
}

impl TitleGuard {
    pub fn new(title: DocumentTitle, app_name: impl Into<String>) -> Self {
        Self {
            title,
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl Guard for TitleGuard {
    fn name(&self) -> &'static str {
        "title"
    }

    async fn check(
        &self,
        to: &RouteLocation,
        _from: &RouteLocation,
        _cancel: &CancellationToken,
    ) -> GuardOutcome {
        if let Some(title) = &to.meta.title {
            self.title.set(format!("{} - {}", self.app_name, title));
        }
        GuardOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteTable;

    #[tokio::test]
    async fn test_sets_title_from_meta() {
        let title = DocumentTitle::new("Timely");
        let guard = TitleGuard::new(title.clone(), "Timely");
        let table = RouteTable::standard();

        let to = table.resolve("/reports").unwrap();
        let outcome = guard
            .check(&to, &RouteLocation::start(), &CancellationToken::new())
            .await;

        assert_eq!(outcome, GuardOutcome::Continue);
        assert_eq!(title.get(), "Timely - Reports");
    }

    #[tokio::test]
    async fn test_untitled_route_keeps_title() {
        let title = DocumentTitle::new("Timely - Login");
        let guard = TitleGuard::new(title.clone(), "Timely");

        let outcome = guard
            .check(
                &RouteLocation::start(),
                &RouteLocation::start(),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, GuardOutcome::Continue);
        assert_eq!(title.get(), "Timely - Login");
    }
}
