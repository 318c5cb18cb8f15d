//! Navigation between views
//!
//! Components never switch views themselves; they hand a [`Route`] to the
//! injected [`Navigator`].

use crate::ticker::{TaskId, Ticker};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// A view the client can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Favorites,
    /// Report view; the ticker is stored lower-case
    Stock { ticker: String },
    /// Progress view of a running analysis task
    Loading { task_id: TaskId, ticker: Ticker },
    /// Return to the previous view
    Back,
}

impl Route {
    pub fn stock(ticker: &Ticker) -> Self {
        Self::Stock {
            ticker: ticker.for_route(),
        }
    }

    /// Report route from an unvalidated ticker string (e.g. echoed by the server)
    pub fn stock_from_raw(raw: &str) -> Option<Self> {
        Ticker::parse(raw).ok().map(|ticker| Self::stock(&ticker))
    }

    pub fn loading(task_id: TaskId, ticker: Ticker) -> Self {
        Self::Loading { task_id, ticker }
    }

    /// URL-style path of the route
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Favorites => "/favorites".to_string(),
            Self::Stock { ticker } => format!("/stock/{ticker}"),
            Self::Loading { task_id, ticker } => {
                format!("/loading-analysis/{task_id}/{}", ticker.as_str())
            }
            Self::Back => "..".to_string(),
        }
    }
}

/// Receiver of navigation requests
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only records the routes it was given
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn last(&self) -> Option<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        debug!("navigate {}", route.path());
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

/// Navigator forwarding routes to an event loop
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl ChannelNavigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        debug!("navigate {}", route.path());
        // A closed receiver means the front end is shutting down.
        let _ = self.tx.send(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        let ticker = Ticker::parse("AAPL").unwrap();
        assert_eq!(Route::stock(&ticker).path(), "/stock/aapl");
        assert_eq!(
            Route::loading(TaskId::parse("t-7").unwrap(), ticker).path(),
            "/loading-analysis/t-7/AAPL"
        );
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Favorites.path(), "/favorites");
    }

    #[test]
    fn test_stock_from_raw() {
        assert_eq!(
            Route::stock_from_raw(" NVDA "),
            Some(Route::Stock {
                ticker: "nvda".to_string()
            })
        );
        assert_eq!(Route::stock_from_raw(""), None);
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::default();
        navigator.navigate(Route::Home);
        navigator.navigate(Route::Favorites);
        assert_eq!(navigator.count(), 2);
        assert_eq!(navigator.last(), Some(Route::Favorites));
    }

    #[tokio::test]
    async fn test_channel_navigator() {
        let (navigator, mut rx) = ChannelNavigator::channel();
        navigator.navigate(Route::Back);
        assert_eq!(rx.recv().await, Some(Route::Back));

        drop(rx);
        navigator.navigate(Route::Home);
    }
}
